//! Structurer engine: turns web pages into marker-delimited structured text.
mod article;
mod config;
mod coordinator;
mod decode;
mod document;
mod fetch;
mod page;
mod select;
mod structured;
mod token;
mod types;

pub use article::{
    parse_article, parse_publish_date, split_authors, ArticleError, ArticleSource, LibraryArticle,
    ReadabilityArticleSource,
};
pub use config::{
    ConfigError, EngineConfig, SelectorScan, Thresholds, FETCH_TIMEOUT_ENV, MAX_NETWORK_TIMEOUT,
};
pub use coordinator::{
    Coordinator, ExtractionStage, GenericFallbackStage, LibraryStage, NoContent, StageOutcome,
};
pub use decode::{decode_html, DecodedHtml};
pub use document::{ExtractedDocument, ExtractionMethod};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, BROWSER_USER_AGENT};
pub use page::{body_element, page_title, strip_noise};
pub use select::{CandidateOrigin, CandidateSelector, SelectedContent, SelectionError};
pub use structured::{Extraction, StructuredExtractor, DEFAULT_PARAGRAPH_MIN_CHARS};
pub use token::{render_tokens, ListKind, StructuralToken, TOKEN_SEPARATOR};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
