use feed_rs::model::Entry;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::models::ArticleDraft;
use crate::services::PageExtractor;

/// Feed-provided content shorter than this triggers the page fallback.
const MIN_CONTENT_CHARS: usize = 100;

const MAX_TITLE_CHARS: usize = 512;
const MAX_SUMMARY_CHARS: usize = 2000;

/// Normalizes a raw feed entry into an [`ArticleDraft`]. Pure except for the
/// page-fallback fetch, which is the only I/O it may trigger.
pub struct EntryParser {
    page: PageExtractor,
    page_text_max_len: usize,
    tag_re: Regex,
    entity_re: Regex,
    img_re: Regex,
}

impl EntryParser {
    pub fn new(page: PageExtractor, page_text_max_len: usize) -> Self {
        Self {
            page,
            page_text_max_len,
            tag_re: Regex::new(r"<[^>]*>").expect("invalid tag regex"),
            entity_re: Regex::new(r"&[a-zA-Z]+;").expect("invalid entity regex"),
            img_re: Regex::new(r#"<img[^>]+src=["']([^"']+)["']"#).expect("invalid img regex"),
        }
    }

    pub fn parse_entry(
        &self,
        entry: &Entry,
        source_url: &str,
        category_id: Option<i64>,
    ) -> ArticleDraft {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_else(|| "Untitled".to_string());
        let title = truncate_chars(&self.clean_text(&title), MAX_TITLE_CHARS);

        // Invalid or missing dates stay None; an article is never stamped "now".
        let published_at = entry.published.or(entry.updated);

        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();

        let guid = entry_guid(&entry.id, &link, &title);

        // Prefer the full content body over the summary.
        let content_html = entry
            .content
            .as_ref()
            .and_then(|c| c.body.as_ref())
            .or_else(|| entry.summary.as_ref().map(|s| &s.content))
            .cloned();

        let content_text = content_html.as_deref().map(|html| self.html_to_text(html));

        let summary = entry.summary.as_ref().map(|s| {
            truncate_chars(
                &self.clean_text(&self.tag_re.replace_all(&s.content, "")),
                MAX_SUMMARY_CHARS,
            )
        });

        let image_url = self.extract_image(entry);

        let author = entry.authors.first().map(|a| a.name.clone());

        ArticleDraft {
            title,
            summary,
            content_html,
            content_text,
            link,
            image_url,
            author,
            published_at,
            guid,
            source_url: source_url.to_string(),
            category_id,
        }
    }

    /// Fetch the article page when the feed gave little or no content, and
    /// adopt the extracted text only when it is strictly longer.
    pub async fn enrich_with_page_text(&self, draft: &mut ArticleDraft) {
        if !needs_page_text(draft) {
            return;
        }
        if let Some(text) = self
            .page
            .fetch_page_text(&draft.link, self.page_text_max_len)
            .await
        {
            apply_page_text(draft, text);
        }
    }

    /// HTML to plain text; degrades to tag stripping when the converter fails.
    fn html_to_text(&self, html: &str) -> String {
        match html2text::from_read(html.as_bytes(), 80) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!("HTML to text conversion failed, stripping tags: {}", e);
                self.clean_text(&self.tag_re.replace_all(html, ""))
            }
        }
    }

    fn clean_text(&self, text: &str) -> String {
        let text = self.entity_re.replace_all(text, "");
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Image preference: first enclosure with an `image/*` MIME type, then
    /// the first `<img src>` in the summary HTML.
    fn extract_image(&self, entry: &Entry) -> Option<String> {
        for media in &entry.media {
            for content in &media.content {
                let Some(url) = content.url.as_ref() else {
                    continue;
                };
                let is_image = content
                    .content_type
                    .as_ref()
                    .map(|m| m.to_string().starts_with("image/"))
                    .unwrap_or(false);
                if is_image {
                    return Some(url.to_string());
                }
            }
        }

        for link in &entry.links {
            let rel = link.rel.as_deref().unwrap_or("");
            let is_image = link
                .media_type
                .as_deref()
                .map(|m| m.starts_with("image/"))
                .unwrap_or(false);
            if rel.eq_ignore_ascii_case("enclosure") && is_image {
                return Some(link.href.clone());
            }
        }

        let summary_html = entry.summary.as_ref().map(|s| s.content.as_str())?;
        self.img_re
            .captures(summary_html)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// GUID must never be empty: native id, else the entry link, else a
/// deterministic hash of the title.
pub(crate) fn entry_guid(native_id: &str, link: &str, title: &str) -> String {
    if !native_id.is_empty() {
        return native_id.to_string();
    }
    if !link.is_empty() {
        return link.to_string();
    }
    format!("{:x}", Sha256::digest(title.as_bytes()))
}

pub(crate) fn needs_page_text(draft: &ArticleDraft) -> bool {
    if draft.link.is_empty() {
        return false;
    }
    draft
        .content_text
        .as_deref()
        .map(|t| t.chars().count() < MIN_CONTENT_CHARS)
        .unwrap_or(true)
}

/// Adopt fetched page text only when strictly longer than what the feed gave.
pub(crate) fn apply_page_text(draft: &mut ArticleDraft, text: String) {
    let current_len = draft
        .content_text
        .as_deref()
        .map(|t| t.chars().count())
        .unwrap_or(0);
    if text.chars().count() > current_len {
        draft.content_text = Some(text);
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleDraft;

    fn parser() -> EntryParser {
        EntryParser::new(PageExtractor::new(), 5000)
    }

    fn parse_feed(xml: &str) -> feed_rs::model::Feed {
        feed_rs::parser::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn parses_a_basic_entry() {
        let feed = parse_feed(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>Example</title>
              <item>
                <title>Test Article</title>
                <link>https://example.com/article</link>
                <guid>test-guid-123</guid>
                <pubDate>Mon, 15 Jan 2024 10:30:00 GMT</pubDate>
                <description>&lt;p&gt;This is a summary&lt;/p&gt;</description>
              </item>
            </channel></rss>"#,
        );

        let draft = parser().parse_entry(&feed.entries[0], "https://example.com/feed", Some(1));

        assert_eq!(draft.title, "Test Article");
        assert_eq!(draft.link, "https://example.com/article");
        assert_eq!(draft.guid, "test-guid-123");
        assert_eq!(draft.summary.as_deref(), Some("This is a summary"));
        assert_eq!(draft.source_url, "https://example.com/feed");
        assert_eq!(draft.category_id, Some(1));
        assert!(draft.published_at.is_some());
    }

    #[test]
    fn missing_date_stays_none() {
        let feed = parse_feed(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>Example</title>
              <item>
                <title>No Date</title>
                <link>https://example.com/a</link>
                <guid>g</guid>
              </item>
            </channel></rss>"#,
        );

        let draft = parser().parse_entry(&feed.entries[0], "https://example.com/feed", None);
        assert!(draft.published_at.is_none());
    }

    #[test]
    fn missing_title_defaults_to_untitled() {
        let feed = parse_feed(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>Example</title>
              <item>
                <link>https://example.com/a</link>
                <guid>g</guid>
              </item>
            </channel></rss>"#,
        );

        let draft = parser().parse_entry(&feed.entries[0], "https://example.com/feed", None);
        assert_eq!(draft.title, "Untitled");
    }

    #[test]
    fn image_from_enclosure_wins_over_summary() {
        let feed = parse_feed(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>Example</title>
              <item>
                <title>With Image</title>
                <link>https://example.com/a</link>
                <guid>g</guid>
                <enclosure url="https://example.com/hero.jpg" type="image/jpeg" length="1"/>
                <description>&lt;img src="https://example.com/inline.png"&gt;</description>
              </item>
            </channel></rss>"#,
        );

        let draft = parser().parse_entry(&feed.entries[0], "https://example.com/feed", None);
        assert_eq!(draft.image_url.as_deref(), Some("https://example.com/hero.jpg"));
    }

    #[test]
    fn image_from_summary_when_no_enclosure() {
        let feed = parse_feed(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>Example</title>
              <item>
                <title>Inline Image</title>
                <link>https://example.com/a</link>
                <guid>g</guid>
                <description>&lt;p&gt;text&lt;/p&gt;&lt;img src="https://example.com/inline.png" alt=""&gt;</description>
              </item>
            </channel></rss>"#,
        );

        let draft = parser().parse_entry(&feed.entries[0], "https://example.com/feed", None);
        assert_eq!(draft.image_url.as_deref(), Some("https://example.com/inline.png"));
    }

    #[test]
    fn guid_prefers_native_id_then_link_then_title_hash() {
        assert_eq!(entry_guid("id-1", "https://e.com/a", "T"), "id-1");
        assert_eq!(entry_guid("", "https://e.com/a", "T"), "https://e.com/a");

        let hashed = entry_guid("", "", "Some Title");
        assert!(!hashed.is_empty());
        assert_eq!(hashed, entry_guid("", "", "Some Title"));
        assert_ne!(hashed, entry_guid("", "", "Another Title"));
    }

    #[test]
    fn page_text_needed_only_for_short_content_with_link() {
        let mut draft = ArticleDraft {
            link: "https://example.com/a".to_string(),
            content_text: Some("short".to_string()),
            ..Default::default()
        };
        assert!(needs_page_text(&draft));

        draft.content_text = Some("x".repeat(200));
        assert!(!needs_page_text(&draft));

        draft.content_text = Some("short".to_string());
        draft.link = String::new();
        assert!(!needs_page_text(&draft));
    }

    #[test]
    fn page_text_adopted_only_when_strictly_longer() {
        let mut draft = ArticleDraft {
            content_text: Some("abcde".to_string()),
            ..Default::default()
        };

        apply_page_text(&mut draft, "abc".to_string());
        assert_eq!(draft.content_text.as_deref(), Some("abcde"));

        apply_page_text(&mut draft, "abcde".to_string());
        assert_eq!(draft.content_text.as_deref(), Some("abcde"));

        apply_page_text(&mut draft, "abcdef".to_string());
        assert_eq!(draft.content_text.as_deref(), Some("abcdef"));
    }
}
