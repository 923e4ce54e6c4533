use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A polled RSS/Atom source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub is_active: bool,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSource {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

/// Partial update for a source; unset fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct SourceUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Option<i64>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
}

/// Partial update for a category; unset fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// A stored article. `guid` is globally unique and is the ingestion
/// idempotency key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub content_html: Option<String>,
    pub content_text: Option<String>,
    pub link: String,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub guid: String,
    pub source_url: String,
    pub source_id: Option<i64>,
    pub is_read: bool,
    pub is_bookmarked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A parsed feed entry, normalized but not yet persisted.
#[derive(Debug, Clone, Default)]
pub struct ArticleDraft {
    pub title: String,
    pub summary: Option<String>,
    pub content_html: Option<String>,
    pub content_text: Option<String>,
    pub link: String,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub guid: String,
    pub source_url: String,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingHistoryEntry {
    pub id: i64,
    pub article_id: i64,
    pub read_at: DateTime<Utc>,
    pub read_duration: i64,
}

/// Outcome of ingesting a single source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestResult {
    /// Entries obtained from the feed after batch dedup.
    pub fetched: usize,
    /// Articles newly persisted this run.
    pub created: usize,
}

/// Outcome of one ingestion sweep across all active sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepResult {
    pub sources: usize,
    pub fetched: usize,
    pub created: usize,
}

/// Filters and pagination for article listing.
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    pub category_id: Option<i64>,
    pub source_id: Option<i64>,
    pub is_read: Option<bool>,
    pub is_bookmarked: Option<bool>,
    /// Free-text search over title, summary and content_text.
    pub search: Option<String>,
    /// 1-based page number; values below 1 are treated as 1.
    pub page: u32,
    pub page_size: u32,
}

impl ArticleQuery {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const MAX_PAGE_SIZE: u32 = 100;

    pub fn new() -> Self {
        Self {
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
            ..Default::default()
        }
    }
}

/// One page of articles plus the total match count.
#[derive(Debug, Clone)]
pub struct ArticlePage {
    pub items: Vec<Article>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Per-source article counters.
#[derive(Debug, Clone)]
pub struct SourceStats {
    pub source_id: i64,
    pub name: String,
    pub total_articles: u64,
    pub unread_articles: u64,
    pub last_fetched_at: Option<DateTime<Utc>>,
}
