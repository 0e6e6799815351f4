//! Two-stage extraction per URL: the library article source first, then a
//! raw fetch fed through the [`CandidateSelector`].

use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use structurer_logging::{structurer_debug, structurer_info, structurer_warn};
use url::Url;

use crate::article::{ArticleSource, LibraryArticle, ReadabilityArticleSource};
use crate::config::{ConfigError, EngineConfig};
use crate::decode::decode_html;
use crate::document::{ExtractedDocument, ExtractionMethod};
use crate::fetch::{Fetcher, ReqwestFetcher};
use crate::page::{char_len, collapse_whitespace, page_title, strip_noise};
use crate::select::CandidateSelector;
use crate::structured::StructuredExtractor;
use crate::token::{render_tokens, StructuralToken};
use crate::FetchOutput;

/// What a stage hands back to the coordinator.
#[derive(Debug)]
pub enum StageOutcome {
    Extracted(ExtractedDocument),
    /// Nothing usable; the reason is kept for the final failure report.
    Continue(String),
}

#[async_trait::async_trait]
pub trait ExtractionStage: Send + Sync {
    fn name(&self) -> &'static str;
    async fn attempt(&self, url: &str) -> StageOutcome;
}

/// Every stage came up empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no content extracted from {url}: {}", .reasons.join("; "))]
pub struct NoContent {
    pub url: String,
    pub reasons: Vec<String>,
}

pub struct Coordinator {
    stages: Vec<Box<dyn ExtractionStage>>,
}

impl Coordinator {
    /// Production wiring: one reqwest fetcher shared by both stages.
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(ReqwestFetcher::new(config.fetch.clone()));
        let source = Arc::new(ReadabilityArticleSource::new(fetcher.clone()));
        Self::with_collaborators(config, fetcher, source)
    }

    pub fn with_collaborators(
        config: &EngineConfig,
        fetcher: Arc<dyn Fetcher>,
        source: Arc<dyn ArticleSource>,
    ) -> Result<Self, ConfigError> {
        let config = config.clone().validate()?;
        let library = LibraryStage::new(source, &config);
        let fallback = GenericFallbackStage::new(fetcher, &config)?;
        Ok(Self::from_stages(vec![Box::new(library), Box::new(fallback)]))
    }

    pub fn from_stages(stages: Vec<Box<dyn ExtractionStage>>) -> Self {
        Self { stages }
    }

    /// Runs the stages in order until one extracts a document.
    pub async fn extract(&self, url: &str) -> Result<ExtractedDocument, NoContent> {
        if let Err(err) = Url::parse(url) {
            return Err(NoContent {
                url: url.to_string(),
                reasons: vec![format!("invalid url: {err}")],
            });
        }

        let mut reasons = Vec::new();
        for stage in &self.stages {
            structurer_debug!("{}: trying {} stage", url, stage.name());
            match stage.attempt(url).await {
                StageOutcome::Extracted(doc) => {
                    structurer_info!(
                        "{}: extracted {} tokens via {}",
                        url,
                        doc.tokens.len(),
                        doc.method.as_str()
                    );
                    return Ok(doc);
                }
                StageOutcome::Continue(reason) => {
                    structurer_info!("{}: {} stage yielded nothing: {}", url, stage.name(), reason);
                    reasons.push(format!("{}: {reason}", stage.name()));
                }
            }
        }

        structurer_warn!("{}: no content extracted", url);
        Err(NoContent {
            url: url.to_string(),
            reasons,
        })
    }
}

pub struct LibraryStage {
    source: Arc<dyn ArticleSource>,
    extractor: StructuredExtractor,
    min_chars: usize,
    timeout: Duration,
}

impl LibraryStage {
    pub fn new(source: Arc<dyn ArticleSource>, config: &EngineConfig) -> Self {
        Self {
            source,
            extractor: StructuredExtractor::with_paragraph_min_chars(
                config.thresholds.paragraph_min_chars,
            ),
            min_chars: config.thresholds.library_min_chars,
            timeout: config.library_timeout,
        }
    }

    /// Structure from the article markup when present, otherwise one
    /// paragraph per sufficiently long line of plain text.
    fn tokens(&self, article: &LibraryArticle) -> Vec<StructuralToken> {
        let from_html = article
            .content_html
            .as_deref()
            .map(|html| {
                let fragment = Html::parse_fragment(html);
                self.extractor.extract(fragment.root_element())
            })
            .unwrap_or_default();
        if !from_html.is_empty() {
            return from_html;
        }

        article
            .body_text
            .lines()
            .map(collapse_whitespace)
            .filter(|line| line.chars().count() > self.extractor.paragraph_min_chars())
            .map(|text| StructuralToken::Paragraph { text })
            .collect()
    }
}

#[async_trait::async_trait]
impl ExtractionStage for LibraryStage {
    fn name(&self) -> &'static str {
        "library"
    }

    async fn attempt(&self, url: &str) -> StageOutcome {
        let article = match tokio::time::timeout(self.timeout, self.source.extract(url)).await {
            Err(_) => return StageOutcome::Continue(format!("timed out after {:?}", self.timeout)),
            Ok(Err(err)) => return StageOutcome::Continue(err.to_string()),
            Ok(Ok(article)) => article,
        };

        let chars = char_len(&article.body_text);
        if chars <= self.min_chars {
            return StageOutcome::Continue(format!(
                "text too short ({chars} chars, need more than {})",
                self.min_chars
            ));
        }

        let tokens = self.tokens(&article);
        if tokens.is_empty() {
            return StageOutcome::Continue("article text produced no tokens".to_string());
        }
        let rendered = char_len(&render_tokens(&tokens));
        if rendered <= self.min_chars {
            return StageOutcome::Continue(format!(
                "structured text too short ({rendered} chars, need more than {})",
                self.min_chars
            ));
        }

        StageOutcome::Extracted(ExtractedDocument {
            url: url.to_string(),
            title: article.title,
            tokens,
            method: ExtractionMethod::LibraryExtraction,
            authors: (!article.authors.is_empty()).then_some(article.authors),
            publish_date: article.publish_date,
        })
    }
}

pub struct GenericFallbackStage {
    fetcher: Arc<dyn Fetcher>,
    selector: CandidateSelector,
    noise_tags: Vec<String>,
    untitled_placeholder: String,
}

impl GenericFallbackStage {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            fetcher,
            selector: CandidateSelector::from_config(config)?,
            noise_tags: config.noise_tags.clone(),
            untitled_placeholder: config.untitled_placeholder.clone(),
        })
    }

    /// Decode, clean and select. Kept synchronous: the parsed DOM must not
    /// live across an await point.
    fn analyze(&self, url: &str, output: &FetchOutput) -> Result<ExtractedDocument, String> {
        let html = decode_html(&output.bytes, output.metadata.content_type.as_deref()).html;

        let mut doc = Html::parse_document(&html);
        let removed = strip_noise(&mut doc, &self.noise_tags);
        structurer_debug!("{}: removed {} noise elements", url, removed);

        let title = page_title(&doc).unwrap_or_else(|| self.untitled_placeholder.clone());
        let selected = self.selector.select(&doc).map_err(|err| err.to_string())?;
        structurer_debug!("{}: selected content from {:?}", url, selected.origin);

        Ok(ExtractedDocument {
            url: url.to_string(),
            title,
            tokens: selected.tokens,
            method: ExtractionMethod::GenericFallback,
            authors: None,
            publish_date: None,
        })
    }
}

#[async_trait::async_trait]
impl ExtractionStage for GenericFallbackStage {
    fn name(&self) -> &'static str {
        "generic"
    }

    async fn attempt(&self, url: &str) -> StageOutcome {
        let output = match self.fetcher.fetch(url).await {
            Ok(output) => output,
            Err(err) => {
                structurer_warn!("{}: fetch failed: {}", url, err);
                return StageOutcome::Continue(format!("fetch failed: {err}"));
            }
        };
        match self.analyze(url, &output) {
            Ok(doc) => StageOutcome::Extracted(doc),
            Err(reason) => StageOutcome::Continue(reason),
        }
    }
}
