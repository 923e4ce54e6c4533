use std::time::Duration;

use feed_rs::model::Feed;
use feed_rs::parser;
use reqwest::Client;
use thiserror::Error;

const USER_AGENT_STRING: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

const ACCEPT_HEADER: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8, */*;q=0.7";

/// Failure modes of a single feed fetch. Per-source and non-fatal: the
/// coordinator logs these and moves on, retry policy lives in the scheduler.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Http(u16),

    #[error("feed parse error: {0}")]
    Parse(String),

    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Http(status.as_u16())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT_STRING)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Fetch and parse a feed document. feed-rs parses leniently; structural
    /// oddities in a feed that still parses are logged, not surfaced.
    pub async fn fetch(&self, url: &str) -> Result<Feed, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Http(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        let feed = parser::parse(&bytes[..]).map_err(|e| FetchError::Parse(e.to_string()))?;

        if feed.title.is_none() {
            tracing::warn!("feed {} parsed without a title", url);
        }
        let missing_ids = feed.entries.iter().filter(|e| e.id.is_empty()).count();
        if missing_ids > 0 {
            tracing::warn!(
                "feed {} has {} entries without native ids, fallback GUIDs will be assigned",
                url,
                missing_ids
            );
        }

        Ok(feed)
    }
}

impl Default for FeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display() {
        assert_eq!(FetchError::Timeout.to_string(), "request timed out");
        assert_eq!(FetchError::Http(404).to_string(), "HTTP status 404");
        assert_eq!(
            FetchError::Parse("unexpected EOF".to_string()).to_string(),
            "feed parse error: unexpected EOF"
        );
    }

    #[test]
    fn parses_a_plain_rss_document() {
        let xml = r#"<?xml version="1.0"?>
            <rss version="2.0"><channel>
              <title>Example</title>
              <item>
                <title>Hello</title>
                <link>https://example.com/a</link>
                <guid>guid-1</guid>
              </item>
            </channel></rss>"#;
        let feed = parser::parse(xml.as_bytes()).unwrap();
        assert_eq!(feed.entries.len(), 1);
        assert_eq!(feed.entries[0].id, "guid-1");
    }
}
