use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::token::{render_tokens, StructuralToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    LibraryExtraction,
    GenericFallback,
}

impl ExtractionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMethod::LibraryExtraction => "library_extraction",
            ExtractionMethod::GenericFallback => "generic_fallback",
        }
    }
}

/// Result of one successful extraction call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedDocument {
    pub url: String,
    pub title: String,
    pub tokens: Vec<StructuralToken>,
    pub method: ExtractionMethod,
    pub authors: Option<Vec<String>>,
    pub publish_date: Option<DateTime<FixedOffset>>,
}

impl ExtractedDocument {
    /// Marker-delimited text consumed by the prompt builder.
    pub fn render(&self) -> String {
        render_tokens(&self.tokens)
    }
}
