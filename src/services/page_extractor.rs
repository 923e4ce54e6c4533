use std::time::Duration;

use reqwest::Client;
use url::Url;

const USER_AGENT_STRING: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Lines shorter than this are navigation/boilerplate and are dropped.
const MIN_LINE_CHARS: usize = 15;

/// Extracted text below this length is not worth storing.
const MIN_USEFUL_CHARS: usize = 100;

/// Fallback full-page text extraction, used when a feed entry carries little
/// or no content of its own.
pub struct PageExtractor {
    client: Client,
}

impl PageExtractor {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT_STRING)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// Fetch the article page and extract readable text. Returns `None` for
    /// anything that is not useful: non-HTML responses, fetch failures, or
    /// text still under 100 characters after cleanup.
    pub async fn fetch_page_text(&self, page_url: &str, max_len: usize) -> Option<String> {
        if Url::parse(page_url).is_err() {
            return None;
        }

        let response = match self.client.get(page_url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Failed to fetch {}: {}", page_url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Failed to fetch {}: {}", page_url, response.status());
            return None;
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !content_type.contains("html") {
            tracing::debug!("Skipping non-HTML content at {}: {}", page_url, content_type);
            return None;
        }

        let html = response.text().await.ok()?;
        extract_page_text(&html, max_len)
    }
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// HTML to cleaned plain text: links, images and emphasis stripped, short
/// lines dropped, truncated to `max_len` with an ellipsis marker.
fn extract_page_text(html: &str, max_len: usize) -> Option<String> {
    let text = match html2text::config::plain().string_from_read(html.as_bytes(), 80) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!("Failed to convert HTML to text: {}", e);
            return None;
        }
    };

    let cleaned: String = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| l.chars().count() >= MIN_LINE_CHARS)
        .collect::<Vec<_>>()
        .join("\n");

    let truncated = truncate_text(&cleaned, max_len);

    if truncated.chars().count() < MIN_USEFUL_CHARS {
        tracing::debug!("Extracted content too short ({} chars)", truncated.chars().count());
        return None;
    }

    Some(truncated)
}

fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_appends_ellipsis_only_when_needed() {
        assert_eq!(truncate_text("short", 100), "short");
        let long = "x".repeat(50);
        let truncated = truncate_text(&long, 10);
        assert_eq!(truncated, format!("{}...", "x".repeat(7)));
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let cjk = "新".repeat(20);
        let truncated = truncate_text(&cjk, 10);
        assert_eq!(truncated.chars().count(), 10);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn short_pages_are_not_useful() {
        let html = "<html><body><p>too short to matter here</p></body></html>";
        assert_eq!(extract_page_text(html, 5000), None);
    }

    #[test]
    fn boilerplate_lines_are_dropped() {
        let body = "This is a long enough paragraph of article text that should clearly survive the extraction step because it keeps going and going.";
        let html = format!(
            "<html><body><nav>Home</nav><p>{}</p><footer>About</footer></body></html>",
            body
        );
        let text = extract_page_text(&html, 5000).unwrap();
        assert!(text.contains("long enough paragraph"));
        assert!(!text.contains("Home"));
        assert!(!text.contains("About"));
    }
}
