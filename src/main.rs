use std::sync::Arc;
use std::time::Duration;

use newsflow::ai::Summarizer;
use newsflow::config::Config;
use newsflow::db::Repository;
use newsflow::error::{AppError, Result};
use newsflow::feed::{Classifier, EntryParser, FeedFetcher};
use newsflow::ingest::IngestionCoordinator;
use newsflow::models::NewSource;
use newsflow::scheduler::Scheduler;
use newsflow::services::PageExtractor;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let config = Config::load()?;

    let repository = Arc::new(Repository::new(&config.db_path).await?);
    if repository.count_sources().await? == 0 {
        seed_default_sources(&repository).await?;
    }

    let summarizer = config
        .claude_api_key
        .as_ref()
        .map(|key| Arc::new(Summarizer::new(key.clone())));

    let parser = EntryParser::new(PageExtractor::new(), config.page_text_max_len);
    let coordinator = Arc::new(IngestionCoordinator::new(
        Arc::clone(&repository),
        FeedFetcher::new(),
        parser,
        Classifier::default(),
        summarizer,
        config.max_entry_age_days,
        config.max_concurrent_fetches,
    ));

    match args.get(1).map(String::as_str) {
        // One ingestion sweep, then exit
        Some("--refresh") => {
            let sweep = coordinator.ingest_all_active_sources().await?;
            println!(
                "Ingested {} sources: {} entries, {} new articles",
                sweep.sources, sweep.fetched, sweep.created
            );
        }

        // One retention sweep, then exit
        Some("--sweep") => {
            let days = args
                .get(2)
                .and_then(|d| d.parse().ok())
                .unwrap_or(config.retention_days);
            let deleted = repository.delete_articles_older_than(days).await?;
            println!("Deleted {} articles older than {} days", deleted, days);
        }

        // One summary backfill batch, then exit
        Some("--backfill") => {
            let generated = coordinator
                .backfill_summaries(config.summary_backfill_batch)
                .await?;
            println!("Generated {} summaries", generated);
        }

        Some("--add-source") => {
            let (Some(name), Some(url)) = (args.get(2), args.get(3)) else {
                return Err(AppError::Validation(
                    "usage: newsflow --add-source <name> <url>".to_string(),
                ));
            };
            let source = repository
                .create_source(NewSource {
                    name: name.clone(),
                    url: url.clone(),
                    description: None,
                    category_id: None,
                })
                .await?;
            println!("Added source {} (id {})", source.name, source.id);
        }

        _ => {
            let scheduler = Scheduler::new(
                coordinator,
                Arc::clone(&repository),
                Duration::from_secs(u64::from(config.fetch_interval_minutes) * 60),
                config.retention_days,
                config.summary_backfill_batch,
            );

            tokio::select! {
                _ = scheduler.run() => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutting down");
                }
            }
        }
    }

    Ok(())
}

/// Seed the bundled source list on a fresh database.
async fn seed_default_sources(repo: &Repository) -> Result<()> {
    let ai = repo.get_category_by_name("AI").await?.map(|c| c.id);
    let tech = repo.get_category_by_name("Technology").await?.map(|c| c.id);
    let dev = repo.get_category_by_name("Developer").await?.map(|c| c.id);
    let cloud = repo.get_category_by_name("Cloud & DevOps").await?.map(|c| c.id);

    let sources: Vec<(&str, &str, &str, Option<i64>)> = vec![
        // AI (Chinese)
        ("机器之心", "https://plink.anyfeeder.com/weixin/almosthuman2014", "AI 领域专业媒体", ai),
        ("新智元", "https://plink.anyfeeder.com/weixin/AI_era", "AI 产业资讯与技术动态", ai),
        ("AI 科技评论", "https://rsshub.rssforever.com/leiphone/category/ai", "雷锋网AI频道，学术+产业", ai),
        // AI (international)
        ("OpenAI Blog", "https://openai.com/blog/rss.xml", "OpenAI official blog", ai),
        ("Hugging Face Blog", "https://huggingface.co/blog/feed.xml", "Open-source AI ecosystem", ai),
        ("Google AI Blog", "https://blog.google/technology/ai/rss/", "Google AI research updates", ai),
        ("MIT Tech Review AI", "https://www.technologyreview.com/topic/artificial-intelligence/feed", "MIT AI industry perspective", ai),
        ("TechCrunch AI", "https://techcrunch.com/category/artificial-intelligence/feed", "Silicon Valley AI news", ai),
        // Technology
        ("虎嗅", "https://www.huxiu.com/rss/0.xml", "科技商业深度报道", tech),
        ("腾讯科技", "https://plink.anyfeeder.com/weixin/qqtech", "科技产业资讯", tech),
        // Developer
        ("阮一峰的网络日志", "https://www.ruanyifeng.com/blog/atom.xml", "技术博客，每周科技周刊", dev),
        ("InfoQ 推荐", "https://plink.anyfeeder.com/infoq/recommend", "软件开发技术前沿资讯", dev),
        // Cloud & DevOps
        ("美团技术团队", "https://tech.meituan.com/feed/", "美团技术实践与架构分享", cloud),
    ];

    for (name, url, description, category_id) in sources {
        let new_source = NewSource {
            name: name.to_string(),
            url: url.to_string(),
            description: Some(description.to_string()),
            category_id,
        };
        match repo.create_source(new_source).await {
            Ok(source) => tracing::info!("Added RSS source: {}", source.name),
            Err(AppError::Validation(_)) => {} // Already exists
            Err(e) => tracing::error!("Error adding {}: {}", name, e),
        }
    }

    Ok(())
}
