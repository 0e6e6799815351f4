//! Single-purpose article extraction, tried before the generic fallback.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use dom_smoothie::{Config, Readability};
use structurer_logging::structurer_debug;

use crate::decode::decode_html;
use crate::fetch::Fetcher;
use crate::FetchError;

/// Readability gives up on documents with more elements than this.
const MAX_ELEMENTS_TO_PARSE: usize = 9000;

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryArticle {
    pub title: String,
    pub body_text: String,
    /// Cleaned article markup, when the source keeps it.
    pub content_html: Option<String>,
    pub authors: Vec<String>,
    pub publish_date: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ArticleError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("readability failed: {0}")]
    Readability(String),
}

#[async_trait::async_trait]
pub trait ArticleSource: Send + Sync {
    async fn extract(&self, url: &str) -> Result<LibraryArticle, ArticleError>;
}

/// Fetches the page and runs Readability over it.
pub struct ReadabilityArticleSource {
    fetcher: Arc<dyn Fetcher>,
}

impl ReadabilityArticleSource {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait::async_trait]
impl ArticleSource for ReadabilityArticleSource {
    async fn extract(&self, url: &str) -> Result<LibraryArticle, ArticleError> {
        let output = self.fetcher.fetch(url).await?;
        let decoded = decode_html(&output.bytes, output.metadata.content_type.as_deref());
        structurer_debug!(
            "{}: decoded {} bytes as {}",
            output.metadata.final_url,
            output.metadata.byte_len,
            decoded.encoding_label
        );
        parse_article(&decoded.html, Some(&output.metadata.final_url))
    }
}

/// Runs Readability over already-fetched HTML.
pub fn parse_article(html: &str, url: Option<&str>) -> Result<LibraryArticle, ArticleError> {
    let cfg = Config {
        max_elements_to_parse: MAX_ELEMENTS_TO_PARSE,
        ..Default::default()
    };
    let mut readability =
        Readability::new(html, url, Some(cfg)).map_err(|e| ArticleError::Readability(e.to_string()))?;
    let article = readability
        .parse()
        .map_err(|e| ArticleError::Readability(e.to_string()))?;

    let publish_date = article.published_time.as_deref().and_then(|raw| {
        let parsed = parse_publish_date(raw);
        if parsed.is_none() {
            structurer_debug!("ignoring unparseable publish date {:?}", raw);
        }
        parsed
    });

    Ok(LibraryArticle {
        title: article.title.trim().to_string(),
        body_text: article.text_content.to_string(),
        content_html: Some(article.content.to_string()),
        authors: article.byline.as_deref().map(split_authors).unwrap_or_default(),
        publish_date,
    })
}

/// Splits a byline such as `"By Ann Lee and Bo Park"` into names.
pub fn split_authors(byline: &str) -> Vec<String> {
    let byline = byline.trim();
    let byline = byline
        .strip_prefix("By ")
        .or_else(|| byline.strip_prefix("by "))
        .unwrap_or(byline);
    byline
        .replace(" and ", ",")
        .split([',', ';'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (taken as UTC
/// midnight).
pub fn parse_publish_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    FixedOffset::east_opt(0)?
        .from_local_datetime(&midnight)
        .single()
}
