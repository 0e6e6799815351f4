//! Candidate selection: picks (and possibly merges) the page regions whose
//! structured text becomes the extraction result.

use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use structurer_logging::structurer_debug;

use crate::config::{parse_selector, ConfigError, EngineConfig, SelectorScan};
use crate::page::{body_element, char_len};
use crate::structured::StructuredExtractor;
use crate::token::{render_tokens, StructuralToken, TOKEN_SEPARATOR};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOrigin {
    Specialized { selector: String },
    Generic { selector: String },
    Combined { specialized: String, generic: String },
    FullBody,
}

/// Text chosen for a page, together with the tokens it was rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedContent {
    pub tokens: Vec<StructuralToken>,
    pub text: String,
    pub origin: CandidateOrigin,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("extracted text too short ({chars} chars, need more than {floor})")]
    InsufficientContent { chars: usize, floor: usize },
}

struct Candidate {
    selector: String,
    root: NodeId,
    tokens: Vec<StructuralToken>,
    text: String,
}

impl Candidate {
    fn len(&self) -> usize {
        char_len(&self.text)
    }
}

pub struct CandidateSelector {
    extractor: StructuredExtractor,
    specialized: Vec<(String, Selector)>,
    content: Vec<(String, Selector)>,
    scan: SelectorScan,
    specialized_min_chars: usize,
    acceptance_min_chars: usize,
}

impl CandidateSelector {
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            extractor: StructuredExtractor::with_paragraph_min_chars(
                config.thresholds.paragraph_min_chars,
            ),
            specialized: compile(&config.specialized_selectors)?,
            content: compile(&config.content_selectors)?,
            scan: config.selector_scan,
            specialized_min_chars: config.thresholds.specialized_min_chars,
            acceptance_min_chars: config.thresholds.acceptance_min_chars,
        })
    }

    /// Chooses the page content: specialized widget first, then the generic
    /// content regions, then the whole body. Only text longer than the
    /// acceptance floor is returned.
    pub fn select(&self, doc: &Html) -> Result<SelectedContent, SelectionError> {
        let root = doc.root_element();

        let specialized = self.specialized_candidate(root);
        let excluded: HashSet<NodeId> = specialized
            .as_ref()
            .and_then(|c| doc.tree.get(c.root))
            .map(|node| node.descendants().map(|n| n.id()).collect())
            .unwrap_or_default();
        let generic = self.generic_candidate(root, &excluded);

        let selected = match (specialized, generic) {
            (Some(widget), Some(region)) => {
                structurer_debug!(
                    "combining specialized {} ({} chars) with generic {} ({} chars)",
                    widget.selector,
                    widget.len(),
                    region.selector,
                    region.len()
                );
                let text = format!("{}{TOKEN_SEPARATOR}{}", widget.text, region.text);
                let mut tokens = widget.tokens;
                tokens.extend(region.tokens);
                SelectedContent {
                    tokens,
                    text,
                    origin: CandidateOrigin::Combined {
                        specialized: widget.selector,
                        generic: region.selector,
                    },
                }
            }
            (Some(widget), None) => SelectedContent {
                tokens: widget.tokens,
                text: widget.text,
                origin: CandidateOrigin::Specialized {
                    selector: widget.selector,
                },
            },
            (None, Some(region)) => SelectedContent {
                tokens: region.tokens,
                text: region.text,
                origin: CandidateOrigin::Generic {
                    selector: region.selector,
                },
            },
            (None, None) => {
                structurer_debug!("no candidate region; extracting the full body");
                let tokens = self.extractor.extract(body_element(doc));
                let text = render_tokens(&tokens);
                SelectedContent {
                    tokens,
                    text,
                    origin: CandidateOrigin::FullBody,
                }
            }
        };

        let chars = char_len(&selected.text);
        if chars <= self.acceptance_min_chars {
            return Err(SelectionError::InsufficientContent {
                chars,
                floor: self.acceptance_min_chars,
            });
        }
        Ok(selected)
    }

    fn specialized_candidate(&self, root: ElementRef<'_>) -> Option<Candidate> {
        let (selector, element) = self
            .specialized
            .iter()
            .find_map(|(raw, sel)| root.select(sel).next().map(|el| (raw, el)))?;
        let candidate = self.candidate(selector, element, &HashSet::new());
        if candidate.len() > self.specialized_min_chars {
            Some(candidate)
        } else {
            structurer_debug!(
                "specialized container {} too short ({} chars)",
                selector,
                candidate.len()
            );
            None
        }
    }

    fn generic_candidate(&self, root: ElementRef<'_>, excluded: &HashSet<NodeId>) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for (raw, sel) in &self.content {
            let matches: Vec<ElementRef<'_>> = root.select(sel).collect();
            if matches.is_empty() {
                continue;
            }
            for element in matches {
                let candidate = self.candidate(raw, element, excluded);
                if candidate.len() > best.as_ref().map_or(0, Candidate::len) {
                    best = Some(candidate);
                }
            }
            if self.scan == SelectorScan::FirstMatching {
                break;
            }
        }
        best
    }

    fn candidate(&self, selector: &str, element: ElementRef<'_>, excluded: &HashSet<NodeId>) -> Candidate {
        let tokens = self.extractor.extract_excluding(element, excluded).into_tokens();
        let text = render_tokens(&tokens);
        Candidate {
            selector: selector.to_string(),
            root: element.id(),
            tokens,
            text,
        }
    }
}

fn compile(selectors: &[String]) -> Result<Vec<(String, Selector)>, ConfigError> {
    selectors
        .iter()
        .map(|raw| parse_selector(raw).map(|sel| (raw.clone(), sel)))
        .collect()
}
