use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::ai::Summarizer;
use crate::db::Repository;
use crate::error::Result;
use crate::feed::{is_broad_category, Classifier, EntryParser, FeedFetcher};
use crate::models::{ArticleDraft, IngestResult, Source, SweepResult};

/// Orchestrates fetch -> parse -> classify/filter -> persist for one source
/// at a time, and fans out over all active sources with a bounded pool.
pub struct IngestionCoordinator {
    repo: Arc<Repository>,
    fetcher: FeedFetcher,
    parser: EntryParser,
    classifier: Classifier,
    summarizer: Option<Arc<Summarizer>>,
    /// Entries published before now minus this many days are skipped.
    max_entry_age_days: Option<i64>,
    max_concurrent_fetches: usize,
}

impl IngestionCoordinator {
    pub fn new(
        repo: Arc<Repository>,
        fetcher: FeedFetcher,
        parser: EntryParser,
        classifier: Classifier,
        summarizer: Option<Arc<Summarizer>>,
        max_entry_age_days: Option<i64>,
        max_concurrent_fetches: usize,
    ) -> Self {
        Self {
            repo,
            fetcher,
            parser,
            classifier,
            summarizer,
            max_entry_age_days,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        }
    }

    /// Ingest a single source. Fails softly: a missing or inactive source, a
    /// fetch failure, or an empty feed all yield a zero result, and only a
    /// non-aborted run updates `last_fetched_at`.
    pub async fn ingest_source(&self, source_id: i64) -> Result<IngestResult> {
        let Some(source) = self.repo.get_source(source_id).await? else {
            tracing::debug!("Source {} not found, skipping", source_id);
            return Ok(IngestResult::default());
        };
        if !source.is_active {
            tracing::debug!("Source {} is inactive, skipping", source.name);
            return Ok(IngestResult::default());
        }

        let feed = match self.fetcher.fetch(&source.url).await {
            Ok(feed) => feed,
            Err(e) => {
                tracing::warn!("Failed to fetch {} ({}): {}", source.name, source.url, e);
                return Ok(IngestResult::default());
            }
        };
        if feed.entries.is_empty() {
            tracing::warn!("No entries fetched from source {}", source.name);
            return Ok(IngestResult::default());
        }

        let mut drafts = Vec::with_capacity(feed.entries.len());
        for entry in &feed.entries {
            let mut draft = self
                .parser
                .parse_entry(entry, &source.url, source.category_id);
            self.parser.enrich_with_page_text(&mut draft).await;
            drafts.push(draft);
        }

        let drafts = self.classifier.remove_duplicates(drafts);
        let fetched = drafts.len();

        let preset_category = match source.category_id {
            Some(id) => self.repo.get_category(id).await?,
            None => None,
        };
        let category_ids: HashMap<String, i64> = self
            .repo
            .get_categories()
            .await?
            .into_iter()
            .map(|c| (c.name, c.id))
            .collect();

        let preset_name = preset_category.as_ref().map(|c| c.name.as_str());

        let mut created = 0usize;
        for draft in drafts {
            if self
                .store_entry(&source, draft, preset_name, &category_ids)
                .await?
            {
                created += 1;
            }
        }

        self.repo.update_source_last_fetched(source.id).await?;
        tracing::info!(
            "Fetched {} entries from {}, {} new",
            fetched,
            source.name,
            created
        );

        Ok(IngestResult { fetched, created })
    }

    /// Persist one deduplicated draft, applying the idempotency check,
    /// recency cutoff and relevance gates. Returns whether a row was created.
    async fn store_entry(
        &self,
        source: &Source,
        mut draft: ArticleDraft,
        preset_category: Option<&str>,
        category_ids: &HashMap<String, i64>,
    ) -> Result<bool> {
        // Idempotency: an already-stored GUID is touched, never overwritten.
        if let Some(existing_id) = self.repo.find_article_id_by_guid(&draft.guid).await? {
            self.repo.touch_article(existing_id).await?;
            return Ok(false);
        }

        if let (Some(max_age), Some(published)) = (self.max_entry_age_days, draft.published_at) {
            let cutoff = Utc::now() - chrono::Duration::days(max_age);
            if published < cutoff {
                tracing::debug!("Skipping stale entry: {}", draft.title);
                return Ok(false);
            }
        }

        if self.classifier.is_financial_noise(&draft.title) {
            tracing::debug!("Skipping financial noise: {}", draft.title);
            return Ok(false);
        }

        let body = draft
            .content_text
            .as_deref()
            .or(draft.summary.as_deref())
            .unwrap_or("");
        let keyword_category = self
            .classifier
            .categorize(&draft.title, body)
            .map(str::to_string);

        if !passes_category_gate(preset_category, keyword_category.as_deref()) {
            tracing::debug!("No category match for entry: {}", draft.title);
            return Ok(false);
        }

        if let Some(summary) = self.generate_summary(&draft).await {
            draft.summary = Some(summary);
        }

        let attach_id = preset_category
            .and_then(|name| category_ids.get(name).copied())
            .or_else(|| {
                keyword_category
                    .as_deref()
                    .and_then(|name| category_ids.get(name).copied())
            });

        // A concurrent ingestion of the same entry loses the insert race
        // benignly; the unique constraint reports it as "already exists".
        let Some(article_id) = self.repo.insert_article(draft, Some(source.id)).await? else {
            return Ok(false);
        };
        if let Some(category_id) = attach_id {
            self.repo.attach_category(article_id, category_id).await?;
        }

        Ok(true)
    }

    /// Summarize content_text, summary or title, in that preference order.
    /// Summarization never blocks persistence; failures degrade to None.
    async fn generate_summary(&self, draft: &ArticleDraft) -> Option<String> {
        let summarizer = self.summarizer.as_ref()?;

        let text = draft
            .content_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| draft.summary.as_deref().filter(|t| !t.trim().is_empty()))
            .unwrap_or(&draft.title);
        if text.trim().is_empty() {
            return None;
        }

        let max_len = Summarizer::dynamic_target_length(text);
        match summarizer.summarize(text, max_len).await {
            Ok(summary) if !summary.is_empty() => {
                tracing::info!("Generated AI summary for article: {}", draft.title);
                Some(summary)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Summarization failed for {}: {}", draft.title, e);
                None
            }
        }
    }

    /// One sweep over all active sources, fetched concurrently with a bounded
    /// pool. A failing source never aborts the others.
    pub async fn ingest_all_active_sources(&self) -> Result<SweepResult> {
        let sources = self.repo.get_active_sources().await?;
        let source_count = sources.len();

        let results: Vec<IngestResult> = stream::iter(sources)
            .map(|source| async move {
                match self.ingest_source(source.id).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!("Error ingesting source {}: {}", source.name, e);
                        IngestResult::default()
                    }
                }
            })
            .buffer_unordered(self.max_concurrent_fetches)
            .collect()
            .await;

        let mut sweep = SweepResult {
            sources: source_count,
            ..Default::default()
        };
        for result in results {
            sweep.fetched += result.fetched;
            sweep.created += result.created;
        }

        Ok(sweep)
    }

    /// Generate summaries for stored articles whose summary is missing or too
    /// short to have come from the summarizer. Catches up on content ingested
    /// before a summarizer was configured.
    pub async fn backfill_summaries(&self, batch_size: u32) -> Result<usize> {
        let Some(summarizer) = &self.summarizer else {
            tracing::debug!("Summarizer not configured, skipping backfill");
            return Ok(0);
        };

        let articles = self.repo.articles_needing_summary(batch_size).await?;
        let mut generated = 0usize;

        for article in articles {
            let text = article.content_text.as_deref().unwrap_or("");
            if text.trim().chars().count() < 50 {
                continue;
            }

            let max_len = Summarizer::dynamic_target_length(text);
            match summarizer.summarize(text, max_len).await {
                Ok(summary) if !summary.is_empty() => {
                    self.repo.set_article_summary(article.id, summary).await?;
                    generated += 1;
                    tracing::info!("Generated summary for: {}", article.title);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        "Error generating summary for article {}: {}",
                        article.id,
                        e
                    );
                }
            }
        }

        Ok(generated)
    }
}

/// Relevance gate: a source preset to a broad category needs keyword
/// confirmation; a source with no preset needs a keyword match outright.
fn passes_category_gate(preset: Option<&str>, keyword: Option<&str>) -> bool {
    match (preset, keyword) {
        (Some(name), None) => !is_broad_category(name),
        (None, None) => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broad_preset_requires_keyword_confirmation() {
        assert!(!passes_category_gate(Some("Internet"), None));
        assert!(!passes_category_gate(Some("Technology"), None));
        assert!(passes_category_gate(Some("Internet"), Some("AI")));
    }

    #[test]
    fn focused_preset_passes_without_keywords() {
        assert!(passes_category_gate(Some("AI"), None));
        assert!(passes_category_gate(Some("Developer"), None));
    }

    #[test]
    fn no_preset_requires_a_keyword_match() {
        assert!(!passes_category_gate(None, None));
        assert!(passes_category_gate(None, Some("Developer")));
    }
}
