use chrono::{Duration, Utc};
use tempfile::TempDir;

use newsflow::db::Repository;
use newsflow::error::AppError;
use newsflow::models::{ArticleDraft, ArticleQuery, NewCategory, NewSource};

async fn open_repo() -> (TempDir, Repository) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
    (dir, repo)
}

fn draft(guid: &str, title: &str) -> ArticleDraft {
    ArticleDraft {
        title: title.to_string(),
        summary: Some(format!("{} summary", title)),
        content_text: Some(format!("{} body text", title)),
        link: format!("https://example.com/{}", guid),
        published_at: Some(Utc::now() - Duration::hours(1)),
        guid: guid.to_string(),
        source_url: "https://example.com/feed".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn default_categories_are_seeded() {
    let (_dir, repo) = open_repo().await;

    let categories = repo.get_categories().await.unwrap();
    assert!(categories.len() >= 7);

    let ai = repo.get_category_by_name("AI").await.unwrap();
    assert!(ai.is_some());
}

#[tokio::test]
async fn duplicate_source_url_is_rejected() {
    let (_dir, repo) = open_repo().await;

    let new_source = NewSource {
        name: "Example".to_string(),
        url: "https://example.com/feed".to_string(),
        description: None,
        category_id: None,
    };
    repo.create_source(new_source.clone()).await.unwrap();

    let result = repo.create_source(new_source).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn duplicate_category_name_is_rejected() {
    let (_dir, repo) = open_repo().await;

    let result = repo
        .create_category(NewCategory {
            name: "AI".to_string(),
            description: None,
            color: "#ffffff".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn article_insert_is_idempotent_by_guid() {
    let (_dir, repo) = open_repo().await;

    let first = repo.insert_article(draft("g1", "Title"), None).await.unwrap();
    assert!(first.is_some());

    let second = repo
        .insert_article(draft("g1", "Different Title"), None)
        .await
        .unwrap();
    assert!(second.is_none());

    let found = repo.find_article_id_by_guid("g1").await.unwrap();
    assert_eq!(found, first);
}

#[tokio::test]
async fn second_ingest_run_creates_nothing_new() {
    let (_dir, repo) = open_repo().await;

    let batch = vec![draft("g1", "A"), draft("g2", "B"), draft("g3", "C")];

    let mut created_first = 0;
    for d in batch.clone() {
        if repo.insert_article(d, None).await.unwrap().is_some() {
            created_first += 1;
        }
    }
    assert_eq!(created_first, 3);

    let mut created_second = 0;
    for d in batch {
        if repo.insert_article(d, None).await.unwrap().is_some() {
            created_second += 1;
        }
    }
    assert_eq!(created_second, 0);
}

#[tokio::test]
async fn pagination_returns_bounded_pages_with_total() {
    let (_dir, repo) = open_repo().await;

    for i in 0..25 {
        repo.insert_article(draft(&format!("g{}", i), &format!("Article {}", i)), None)
            .await
            .unwrap();
    }

    let page = repo
        .list_articles(ArticleQuery {
            page: 1,
            page_size: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 10);
    assert_eq!(page.total, 25);
    assert_eq!(page.page, 1);

    let last = repo
        .list_articles(ArticleQuery {
            page: 3,
            page_size: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(last.items.len(), 5);
    assert_eq!(last.total, 25);
}

#[tokio::test]
async fn free_text_search_matches_title_summary_and_body() {
    let (_dir, repo) = open_repo().await;

    repo.insert_article(draft("g1", "Kubernetes release"), None)
        .await
        .unwrap();
    repo.insert_article(draft("g2", "Unrelated news"), None)
        .await
        .unwrap();

    let page = repo
        .list_articles(ArticleQuery {
            search: Some("kubernetes".to_string()),
            page: 1,
            page_size: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].guid, "g1");
}

#[tokio::test]
async fn read_state_filter_and_history() {
    let (_dir, repo) = open_repo().await;

    let id = repo
        .insert_article(draft("g1", "A"), None)
        .await
        .unwrap()
        .unwrap();
    repo.insert_article(draft("g2", "B"), None).await.unwrap();

    // Only the unread-to-read transition appends history.
    assert!(repo.mark_read(id).await.unwrap());
    assert!(repo.mark_read(id).await.unwrap());
    let history = repo.get_reading_history(50).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].article_id, id);

    let unread = repo
        .list_articles(ArticleQuery {
            is_read: Some(false),
            page: 1,
            page_size: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(unread.total, 1);
    assert_eq!(unread.items[0].guid, "g2");

    assert!(repo.mark_unread(id).await.unwrap());
    let article = repo.get_article(id).await.unwrap().unwrap();
    assert!(!article.is_read);
}

#[tokio::test]
async fn toggle_bookmark_flips_state() {
    let (_dir, repo) = open_repo().await;

    let id = repo
        .insert_article(draft("g1", "A"), None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(repo.toggle_bookmark(id).await.unwrap(), Some(true));
    assert_eq!(repo.toggle_bookmark(id).await.unwrap(), Some(false));
    assert_eq!(repo.toggle_bookmark(9999).await.unwrap(), None);
}

#[tokio::test]
async fn retention_sweep_spares_bookmarked_articles() {
    let (_dir, repo) = open_repo().await;

    let keep_id = repo
        .insert_article(draft("keep", "Bookmarked"), None)
        .await
        .unwrap()
        .unwrap();
    let drop_id = repo
        .insert_article(draft("drop", "Expendable"), None)
        .await
        .unwrap()
        .unwrap();

    repo.toggle_bookmark(keep_id).await.unwrap();
    repo.mark_read(drop_id).await.unwrap();
    assert_eq!(repo.get_reading_history(50).await.unwrap().len(), 1);

    // Let created_at fall behind the "now" cutoff of a zero-day sweep.
    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;

    let deleted = repo.delete_articles_older_than(0).await.unwrap();
    assert_eq!(deleted, 1);

    assert!(repo.get_article(keep_id).await.unwrap().is_some());
    assert!(repo.get_article(drop_id).await.unwrap().is_none());
    // History rows of deleted articles go with them.
    assert!(repo.get_reading_history(50).await.unwrap().is_empty());
}

#[tokio::test]
async fn category_attachment_and_filtering() {
    let (_dir, repo) = open_repo().await;

    let ai = repo.get_category_by_name("AI").await.unwrap().unwrap();
    let id = repo
        .insert_article(draft("g1", "Model release"), None)
        .await
        .unwrap()
        .unwrap();
    repo.insert_article(draft("g2", "Other"), None).await.unwrap();

    repo.attach_category(id, ai.id).await.unwrap();
    // Attaching twice is harmless.
    repo.attach_category(id, ai.id).await.unwrap();

    let categories = repo.get_article_categories(id).await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "AI");

    let page = repo
        .list_articles(ArticleQuery {
            category_id: Some(ai.id),
            page: 1,
            page_size: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].guid, "g1");
}

#[tokio::test]
async fn deleting_a_source_cascades_to_its_articles() {
    let (_dir, repo) = open_repo().await;

    let source = repo
        .create_source(NewSource {
            name: "Example".to_string(),
            url: "https://example.com/feed".to_string(),
            description: None,
            category_id: None,
        })
        .await
        .unwrap();

    let article_id = repo
        .insert_article(draft("g1", "Owned"), Some(source.id))
        .await
        .unwrap()
        .unwrap();

    assert!(repo.delete_source(source.id).await.unwrap());
    assert!(repo.get_article(article_id).await.unwrap().is_none());
}

#[tokio::test]
async fn source_stats_count_articles_and_unread() {
    let (_dir, repo) = open_repo().await;

    let source = repo
        .create_source(NewSource {
            name: "Example".to_string(),
            url: "https://example.com/feed".to_string(),
            description: None,
            category_id: None,
        })
        .await
        .unwrap();

    let read_id = repo
        .insert_article(draft("g1", "A"), Some(source.id))
        .await
        .unwrap()
        .unwrap();
    repo.insert_article(draft("g2", "B"), Some(source.id))
        .await
        .unwrap();
    repo.mark_read(read_id).await.unwrap();

    let stats = repo.source_stats(source.id).await.unwrap().unwrap();
    assert_eq!(stats.total_articles, 2);
    assert_eq!(stats.unread_articles, 1);
}

#[tokio::test]
async fn update_source_last_fetched_sets_timestamp() {
    let (_dir, repo) = open_repo().await;

    let source = repo
        .create_source(NewSource {
            name: "Example".to_string(),
            url: "https://example.com/feed".to_string(),
            description: None,
            category_id: None,
        })
        .await
        .unwrap();
    assert!(source.last_fetched_at.is_none());

    repo.update_source_last_fetched(source.id).await.unwrap();
    let fetched = repo.get_source(source.id).await.unwrap().unwrap();
    assert!(fetched.last_fetched_at.is_some());
}

#[tokio::test]
async fn backfill_candidates_need_content_and_lack_real_summaries() {
    let (_dir, repo) = open_repo().await;

    // Short summary: a backfill candidate.
    let mut candidate = draft("g1", "Short summary");
    candidate.summary = Some("tiny".to_string());
    let candidate_id = repo.insert_article(candidate, None).await.unwrap().unwrap();

    // Long summary: already AI-generated, not a candidate.
    let mut done = draft("g2", "Long summary");
    done.summary = Some("x".repeat(120));
    repo.insert_article(done, None).await.unwrap();

    // No content text: nothing to summarize.
    let mut empty = draft("g3", "No content");
    empty.content_text = None;
    repo.insert_article(empty, None).await.unwrap();

    let candidates = repo.articles_needing_summary(10).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].guid, "g1");

    repo.set_article_summary(candidate_id, "一".repeat(100))
        .await
        .unwrap();
    assert!(repo.articles_needing_summary(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn touched_articles_keep_their_content() {
    let (_dir, repo) = open_repo().await;

    let id = repo
        .insert_article(draft("g1", "Original"), None)
        .await
        .unwrap()
        .unwrap();
    repo.touch_article(id).await.unwrap();

    let article = repo.get_article(id).await.unwrap().unwrap();
    assert_eq!(article.title, "Original");
}
