use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{
    Article, ArticleDraft, ArticlePage, ArticleQuery, Category, CategoryUpdate, NewCategory,
    NewSource, ReadingHistoryEntry, Source, SourceStats, SourceUpdate,
};

use super::schema::SCHEMA;

/// Default categories seeded on first open.
const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("AI", "AI 产品发布、API/SDK 更新、AI 应用案例", "#6366f1"),
    ("Technology", "科技行业综合资讯、硬件与平台动态", "#3b82f6"),
    ("Internet", "互联网行业新闻、大厂动态、行业趋势", "#f97316"),
    ("Developer", "编程语言、框架更新、开发工具、开源项目", "#14b8a6"),
    ("Cloud & DevOps", "云服务、容器化、CI/CD、基础设施", "#06b6d4"),
    ("Cybersecurity", "安全漏洞通告、安全实践、数据隐私", "#ef4444"),
    ("Startup & Product", "创业融资、新产品发布、产品设计", "#eab308"),
];

const ARTICLE_COLUMNS: &str = "id, title, summary, content_html, content_text, link, image_url, \
     author, published_at, guid, source_url, source_id, is_read, is_bookmarked, \
     created_at, updated_at";

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            for (name, description, color) in DEFAULT_CATEGORIES {
                conn.execute(
                    "INSERT OR IGNORE INTO categories (name, description, color) VALUES (?1, ?2, ?3)",
                    params![name, description, color],
                )?;
            }
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Source operations

    pub async fn create_source(&self, source: NewSource) -> Result<Source> {
        let url = source.url.clone();
        let exists = self
            .conn
            .call(move |conn| {
                let id: Option<i64> = conn
                    .query_row("SELECT id FROM sources WHERE url = ?1", params![url], |row| {
                        row.get(0)
                    })
                    .optional()?;
                Ok(id)
            })
            .await?;

        if exists.is_some() {
            return Err(AppError::Validation(format!(
                "source URL already exists: {}",
                source.url
            )));
        }

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO sources (name, url, description, category_id) VALUES (?1, ?2, ?3, ?4)",
                    params![source.name, source.url, source.description, source.category_id],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        self.get_source(id)
            .await?
            .ok_or_else(|| AppError::Validation("source vanished after insert".to_string()))
    }

    pub async fn get_source(&self, id: i64) -> Result<Option<Source>> {
        let source = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, url, description, category_id, is_active, last_fetched_at, \
                     created_at, updated_at FROM sources WHERE id = ?1",
                )?;
                let source = stmt
                    .query_row(params![id], |row| Ok(source_from_row(row)))
                    .optional()?;
                Ok(source)
            })
            .await?;
        Ok(source)
    }

    pub async fn get_all_sources(&self) -> Result<Vec<Source>> {
        let sources = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, url, description, category_id, is_active, last_fetched_at, \
                     created_at, updated_at FROM sources ORDER BY name",
                )?;
                let sources = stmt
                    .query_map([], |row| Ok(source_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(sources)
            })
            .await?;
        Ok(sources)
    }

    /// Active sources, snapshotted at the start of an ingestion sweep.
    pub async fn get_active_sources(&self) -> Result<Vec<Source>> {
        let sources = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, url, description, category_id, is_active, last_fetched_at, \
                     created_at, updated_at FROM sources WHERE is_active = 1 ORDER BY name",
                )?;
                let sources = stmt
                    .query_map([], |row| Ok(source_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(sources)
            })
            .await?;
        Ok(sources)
    }

    pub async fn update_source(&self, id: i64, update: SourceUpdate) -> Result<Option<Source>> {
        if let Some(url) = update.url.clone() {
            let check_url = url.clone();
            let taken = self
                .conn
                .call(move |conn| {
                    let other: Option<i64> = conn
                        .query_row(
                            "SELECT id FROM sources WHERE url = ?1 AND id != ?2",
                            params![check_url, id],
                            |row| row.get(0),
                        )
                        .optional()?;
                    Ok(other)
                })
                .await?;
            if taken.is_some() {
                return Err(AppError::Validation(format!(
                    "source URL already exists: {}",
                    url
                )));
            }
        }

        self.conn
            .call(move |conn| {
                let mut sets: Vec<String> = Vec::new();
                let mut values: Vec<Box<dyn ToSql + Send>> = Vec::new();

                if let Some(name) = update.name {
                    sets.push(format!("name = ?{}", values.len() + 1));
                    values.push(Box::new(name));
                }
                if let Some(url) = update.url {
                    sets.push(format!("url = ?{}", values.len() + 1));
                    values.push(Box::new(url));
                }
                if let Some(description) = update.description {
                    sets.push(format!("description = ?{}", values.len() + 1));
                    values.push(Box::new(description));
                }
                if let Some(category_id) = update.category_id {
                    sets.push(format!("category_id = ?{}", values.len() + 1));
                    values.push(Box::new(category_id));
                }
                if let Some(is_active) = update.is_active {
                    sets.push(format!("is_active = ?{}", values.len() + 1));
                    values.push(Box::new(is_active));
                }

                if sets.is_empty() {
                    return Ok(());
                }

                sets.push("updated_at = datetime('now')".to_string());
                let sql = format!(
                    "UPDATE sources SET {} WHERE id = ?{}",
                    sets.join(", "),
                    values.len() + 1
                );
                values.push(Box::new(id));

                conn.execute(
                    &sql,
                    params_from_iter(values.iter().map(|v| v.as_ref() as &dyn ToSql)),
                )?;
                Ok(())
            })
            .await?;

        self.get_source(id).await
    }

    pub async fn delete_source(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let n = conn.execute("DELETE FROM sources WHERE id = ?1", params![id])?;
                Ok(n > 0)
            })
            .await?;
        Ok(deleted)
    }

    pub async fn update_source_last_fetched(&self, id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE sources SET last_fetched_at = datetime('now'), updated_at = datetime('now') WHERE id = ?1",
                    params![id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn source_stats(&self, id: i64) -> Result<Option<SourceStats>> {
        let Some(source) = self.get_source(id).await? else {
            return Ok(None);
        };

        let (total, unread) = self
            .conn
            .call(move |conn| {
                let total: u64 = conn.query_row(
                    "SELECT COUNT(*) FROM articles WHERE source_id = ?1",
                    params![id],
                    |row| row.get(0),
                )?;
                let unread: u64 = conn.query_row(
                    "SELECT COUNT(*) FROM articles WHERE source_id = ?1 AND is_read = 0",
                    params![id],
                    |row| row.get(0),
                )?;
                Ok((total, unread))
            })
            .await?;

        Ok(Some(SourceStats {
            source_id: source.id,
            name: source.name,
            total_articles: total,
            unread_articles: unread,
            last_fetched_at: source.last_fetched_at,
        }))
    }

    pub async fn count_sources(&self) -> Result<u64> {
        let count = self
            .conn
            .call(|conn| {
                let count: u64 =
                    conn.query_row("SELECT COUNT(*) FROM sources", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    // Category operations

    pub async fn create_category(&self, category: NewCategory) -> Result<Category> {
        if self.get_category_by_name(&category.name).await?.is_some() {
            return Err(AppError::Validation(format!(
                "category already exists: {}",
                category.name
            )));
        }

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO categories (name, description, color) VALUES (?1, ?2, ?3)",
                    params![category.name, category.description, category.color],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        self.get_category(id)
            .await?
            .ok_or_else(|| AppError::Validation("category vanished after insert".to_string()))
    }

    pub async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let category = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, description, color, created_at FROM categories WHERE id = ?1",
                )?;
                let category = stmt
                    .query_row(params![id], |row| Ok(category_from_row(row)))
                    .optional()?;
                Ok(category)
            })
            .await?;
        Ok(category)
    }

    pub async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let name = name.to_string();
        let category = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, description, color, created_at FROM categories WHERE name = ?1",
                )?;
                let category = stmt
                    .query_row(params![name], |row| Ok(category_from_row(row)))
                    .optional()?;
                Ok(category)
            })
            .await?;
        Ok(category)
    }

    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        let categories = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, description, color, created_at FROM categories ORDER BY name",
                )?;
                let categories = stmt
                    .query_map([], |row| Ok(category_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(categories)
            })
            .await?;
        Ok(categories)
    }

    pub async fn update_category(&self, id: i64, update: CategoryUpdate) -> Result<Option<Category>> {
        if let Some(name) = &update.name {
            if let Some(existing) = self.get_category_by_name(name).await? {
                if existing.id != id {
                    return Err(AppError::Validation(format!(
                        "category already exists: {}",
                        name
                    )));
                }
            }
        }

        self.conn
            .call(move |conn| {
                let mut sets: Vec<String> = Vec::new();
                let mut values: Vec<Box<dyn ToSql + Send>> = Vec::new();

                if let Some(name) = update.name {
                    sets.push(format!("name = ?{}", values.len() + 1));
                    values.push(Box::new(name));
                }
                if let Some(description) = update.description {
                    sets.push(format!("description = ?{}", values.len() + 1));
                    values.push(Box::new(description));
                }
                if let Some(color) = update.color {
                    sets.push(format!("color = ?{}", values.len() + 1));
                    values.push(Box::new(color));
                }

                if sets.is_empty() {
                    return Ok(());
                }

                let sql = format!(
                    "UPDATE categories SET {} WHERE id = ?{}",
                    sets.join(", "),
                    values.len() + 1
                );
                values.push(Box::new(id));

                conn.execute(
                    &sql,
                    params_from_iter(values.iter().map(|v| v.as_ref() as &dyn ToSql)),
                )?;
                Ok(())
            })
            .await?;

        self.get_category(id).await
    }

    pub async fn delete_category(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let n = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
                Ok(n > 0)
            })
            .await?;
        Ok(deleted)
    }

    // Article operations

    pub async fn find_article_id_by_guid(&self, guid: &str) -> Result<Option<i64>> {
        let guid = guid.to_string();
        let id = self
            .conn
            .call(move |conn| {
                let id: Option<i64> = conn
                    .query_row("SELECT id FROM articles WHERE guid = ?1", params![guid], |row| {
                        row.get(0)
                    })
                    .optional()?;
                Ok(id)
            })
            .await?;
        Ok(id)
    }

    /// Refresh `updated_at` on an already-stored article. Content is never
    /// overwritten on re-ingestion.
    pub async fn touch_article(&self, id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE articles SET updated_at = datetime('now') WHERE id = ?1",
                    params![id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Insert a new article. Returns `None` when an article with the same
    /// GUID already exists; the unique constraint makes concurrent ingestion
    /// of the same entry harmless.
    pub async fn insert_article(
        &self,
        draft: ArticleDraft,
        source_id: Option<i64>,
    ) -> Result<Option<i64>> {
        let id = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    r#"INSERT OR IGNORE INTO articles
                       (title, summary, content_html, content_text, link, image_url, author,
                        published_at, guid, source_url, source_id)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
                    params![
                        draft.title,
                        draft.summary,
                        draft.content_html,
                        draft.content_text,
                        draft.link,
                        draft.image_url,
                        draft.author,
                        draft.published_at.map(|dt| dt.to_rfc3339()),
                        draft.guid,
                        draft.source_url,
                        source_id,
                    ],
                )?;
                if n == 0 {
                    Ok(None)
                } else {
                    Ok(Some(conn.last_insert_rowid()))
                }
            })
            .await?;
        Ok(id)
    }

    pub async fn attach_category(&self, article_id: i64, category_id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO article_categories (article_id, category_id) VALUES (?1, ?2)",
                    params![article_id, category_id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let article = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM articles WHERE id = ?1",
                    ARTICLE_COLUMNS
                ))?;
                let article = stmt
                    .query_row(params![id], |row| Ok(article_from_row(row)))
                    .optional()?;
                Ok(article)
            })
            .await?;
        Ok(article)
    }

    pub async fn get_article_categories(&self, article_id: i64) -> Result<Vec<Category>> {
        let categories = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT c.id, c.name, c.description, c.color, c.created_at
                     FROM categories c
                     JOIN article_categories ac ON ac.category_id = c.id
                     WHERE ac.article_id = ?1
                     ORDER BY c.name",
                )?;
                let categories = stmt
                    .query_map(params![article_id], |row| Ok(category_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(categories)
            })
            .await?;
        Ok(categories)
    }

    /// Paginated, filtered article listing. Page numbers are 1-based; the
    /// page size is clamped to [1, 100].
    pub async fn list_articles(&self, query: ArticleQuery) -> Result<ArticlePage> {
        let page = query.page.max(1);
        let page_size = query
            .page_size
            .clamp(1, ArticleQuery::MAX_PAGE_SIZE);
        let offset = (page as i64 - 1) * page_size as i64;

        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql + Send>> = Vec::new();

        if let Some(category_id) = query.category_id {
            clauses.push(
                "id IN (SELECT article_id FROM article_categories WHERE category_id = ?)"
                    .to_string(),
            );
            values.push(Box::new(category_id));
        }
        if let Some(source_id) = query.source_id {
            clauses.push("source_id = ?".to_string());
            values.push(Box::new(source_id));
        }
        if let Some(is_read) = query.is_read {
            clauses.push("is_read = ?".to_string());
            values.push(Box::new(is_read));
        }
        if let Some(is_bookmarked) = query.is_bookmarked {
            clauses.push("is_bookmarked = ?".to_string());
            values.push(Box::new(is_bookmarked));
        }
        if let Some(search) = &query.search {
            let pattern = format!("%{}%", search);
            clauses.push("(title LIKE ? OR summary LIKE ? OR content_text LIKE ?)".to_string());
            values.push(Box::new(pattern.clone()));
            values.push(Box::new(pattern.clone()));
            values.push(Box::new(pattern));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let (items, total) = self
            .conn
            .call(move |conn| {
                let refs: Vec<&dyn ToSql> =
                    values.iter().map(|v| v.as_ref() as &dyn ToSql).collect();

                let total: u64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM articles{}", where_sql),
                    params_from_iter(refs.iter().copied()),
                    |row| row.get(0),
                )?;

                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM articles{} \
                     ORDER BY published_at DESC NULLS LAST, created_at DESC \
                     LIMIT ? OFFSET ?",
                    ARTICLE_COLUMNS, where_sql
                ))?;

                let limit = page_size as i64;
                let mut page_refs: Vec<&dyn ToSql> = refs;
                page_refs.push(&limit);
                page_refs.push(&offset);

                let items = stmt
                    .query_map(params_from_iter(page_refs.iter().copied()), |row| {
                        Ok(article_from_row(row))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                Ok((items, total))
            })
            .await?;

        Ok(ArticlePage {
            items,
            total,
            page,
            page_size,
        })
    }

    /// Mark an article read. The unread-to-read transition appends a
    /// reading-history row in the same transaction.
    pub async fn mark_read(&self, id: i64) -> Result<bool> {
        let found = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let was_read: Option<bool> = tx
                    .query_row(
                        "SELECT is_read FROM articles WHERE id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?;
                let Some(was_read) = was_read else {
                    return Ok(false);
                };
                tx.execute(
                    "UPDATE articles SET is_read = 1, updated_at = datetime('now') WHERE id = ?1",
                    params![id],
                )?;
                if !was_read {
                    tx.execute(
                        "INSERT INTO reading_history (article_id, read_duration) VALUES (?1, 0)",
                        params![id],
                    )?;
                }
                tx.commit()?;
                Ok(true)
            })
            .await?;
        Ok(found)
    }

    pub async fn mark_unread(&self, id: i64) -> Result<bool> {
        let found = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "UPDATE articles SET is_read = 0, updated_at = datetime('now') WHERE id = ?1",
                    params![id],
                )?;
                Ok(n > 0)
            })
            .await?;
        Ok(found)
    }

    /// Toggle the bookmark flag; returns the new state, or `None` when the
    /// article does not exist.
    pub async fn toggle_bookmark(&self, id: i64) -> Result<Option<bool>> {
        let state = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "UPDATE articles SET is_bookmarked = NOT is_bookmarked, updated_at = datetime('now') WHERE id = ?1",
                    params![id],
                )?;
                if n == 0 {
                    return Ok(None);
                }
                let state: bool = conn.query_row(
                    "SELECT is_bookmarked FROM articles WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )?;
                Ok(Some(state))
            })
            .await?;
        Ok(state)
    }

    pub async fn get_reading_history(&self, limit: u32) -> Result<Vec<ReadingHistoryEntry>> {
        let history = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, article_id, read_at, read_duration FROM reading_history \
                     ORDER BY read_at DESC LIMIT ?1",
                )?;
                let history = stmt
                    .query_map(params![limit], |row| Ok(history_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(history)
            })
            .await?;
        Ok(history)
    }

    /// Retention sweep: transactionally delete non-bookmarked articles older
    /// than `days`, children first. All-or-nothing per sweep; an error rolls
    /// the whole batch back.
    pub async fn delete_articles_older_than(&self, days: i64) -> Result<usize> {
        let cutoff = (Utc::now() - chrono::Duration::days(days))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        let deleted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "DELETE FROM reading_history WHERE article_id IN \
                     (SELECT id FROM articles WHERE created_at < ?1 AND is_bookmarked = 0)",
                    params![cutoff],
                )?;
                tx.execute(
                    "DELETE FROM article_categories WHERE article_id IN \
                     (SELECT id FROM articles WHERE created_at < ?1 AND is_bookmarked = 0)",
                    params![cutoff],
                )?;
                let deleted = tx.execute(
                    "DELETE FROM articles WHERE created_at < ?1 AND is_bookmarked = 0",
                    params![cutoff],
                )?;
                tx.commit()?;
                Ok(deleted)
            })
            .await?;
        Ok(deleted)
    }

    /// Articles whose stored summary is missing or too short to have come
    /// from the summarizer (<= 80 chars), newest first.
    pub async fn articles_needing_summary(&self, limit: u32) -> Result<Vec<Article>> {
        let articles = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM articles \
                     WHERE content_text IS NOT NULL AND content_text != '' \
                       AND (summary IS NULL OR length(summary) <= 80) \
                     ORDER BY published_at DESC NULLS LAST, created_at DESC \
                     LIMIT ?1",
                    ARTICLE_COLUMNS
                ))?;
                let articles = stmt
                    .query_map(params![limit], |row| Ok(article_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    pub async fn set_article_summary(&self, id: i64, summary: String) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE articles SET summary = ?1, updated_at = datetime('now') WHERE id = ?2",
                    params![summary, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn source_from_row(row: &Row) -> Source {
    Source {
        id: row.get(0).unwrap(),
        name: row.get(1).unwrap(),
        url: row.get(2).unwrap(),
        description: row.get(3).unwrap(),
        category_id: row.get(4).unwrap(),
        is_active: row.get::<_, i64>(5).unwrap() != 0,
        last_fetched_at: row
            .get::<_, Option<String>>(6)
            .unwrap()
            .and_then(|s| parse_datetime(&s)),
        created_at: row
            .get::<_, String>(7)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        updated_at: row
            .get::<_, String>(8)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}

fn category_from_row(row: &Row) -> Category {
    Category {
        id: row.get(0).unwrap(),
        name: row.get(1).unwrap(),
        description: row.get(2).unwrap(),
        color: row.get(3).unwrap(),
        created_at: row
            .get::<_, String>(4)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}

fn article_from_row(row: &Row) -> Article {
    Article {
        id: row.get(0).unwrap(),
        title: row.get(1).unwrap(),
        summary: row.get(2).unwrap(),
        content_html: row.get(3).unwrap(),
        content_text: row.get(4).unwrap(),
        link: row.get(5).unwrap(),
        image_url: row.get(6).unwrap(),
        author: row.get(7).unwrap(),
        published_at: row
            .get::<_, Option<String>>(8)
            .unwrap()
            .and_then(|s| parse_datetime(&s)),
        guid: row.get(9).unwrap(),
        source_url: row.get(10).unwrap(),
        source_id: row.get(11).unwrap(),
        is_read: row.get::<_, i64>(12).unwrap() != 0,
        is_bookmarked: row.get::<_, i64>(13).unwrap() != 0,
        created_at: row
            .get::<_, String>(14)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        updated_at: row
            .get::<_, String>(15)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}

fn history_from_row(row: &Row) -> ReadingHistoryEntry {
    ReadingHistoryEntry {
        id: row.get(0).unwrap(),
        article_id: row.get(1).unwrap(),
        read_at: row
            .get::<_, String>(2)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        read_duration: row.get(3).unwrap(),
    }
}
