//! Structured extraction: walks a DOM subtree and turns tables, lists,
//! headings and text blocks into [`StructuralToken`]s.
//!
//! Each token consumes its source element together with the whole subtree
//! below it, and consumed nodes are never revisited, so no node contributes
//! to two tokens. Tokens come out in document order.

use std::collections::HashSet;

use ego_tree::{NodeId, NodeRef};
use scraper::node::Node;
use scraper::ElementRef;
use structurer_logging::structurer_trace;

use crate::page::collapse_whitespace;
use crate::token::{ListKind, StructuralToken};

/// Paragraphs must be strictly longer than this many characters.
pub const DEFAULT_PARAGRAPH_MIN_CHARS: usize = 15;

/// Elements whose text never belongs to the readable content.
const TEXTLESS_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that separate words even without surrounding whitespace.
const BREAKING_TAGS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "h1", "h2",
    "h3", "h4", "h5", "h6", "hr", "li", "ol", "p", "pre", "section", "table", "td", "th", "tr",
    "ul",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Table,
    List(ListKind),
    Heading(u8),
    Paragraph,
    Generic,
}

impl Block {
    fn classify(name: &str) -> Option<Self> {
        match name {
            "table" => Some(Block::Table),
            "ol" => Some(Block::List(ListKind::Ordered)),
            "ul" => Some(Block::List(ListKind::Unordered)),
            "p" => Some(Block::Paragraph),
            "div" => Some(Block::Generic),
            _ => heading_level(name).map(Block::Heading),
        }
    }
}

fn heading_level(name: &str) -> Option<u8> {
    let level: u8 = name.strip_prefix('h')?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn is_structured(name: &str) -> bool {
    matches!(name, "table" | "ol" | "ul")
}

/// Tokens produced from one subtree, with the node each token came from.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub tokens: Vec<StructuralToken>,
    /// Source element of each token, parallel to `tokens`.
    pub sources: Vec<NodeId>,
}

impl Extraction {
    pub fn into_tokens(self) -> Vec<StructuralToken> {
        self.tokens
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StructuredExtractor {
    paragraph_min_chars: usize,
}

impl Default for StructuredExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuredExtractor {
    pub fn new() -> Self {
        Self::with_paragraph_min_chars(DEFAULT_PARAGRAPH_MIN_CHARS)
    }

    pub fn with_paragraph_min_chars(paragraph_min_chars: usize) -> Self {
        Self {
            paragraph_min_chars,
        }
    }

    pub fn paragraph_min_chars(&self) -> usize {
        self.paragraph_min_chars
    }

    pub fn extract(&self, root: ElementRef<'_>) -> Vec<StructuralToken> {
        self.extract_excluding(root, &HashSet::new()).into_tokens()
    }

    /// Extracts `root` while treating `excluded` nodes as already consumed.
    pub fn extract_excluding(&self, root: ElementRef<'_>, excluded: &HashSet<NodeId>) -> Extraction {
        let mut visited: HashSet<NodeId> = excluded.clone();
        let mut out = Extraction::default();

        for node in root.descendants() {
            if visited.contains(&node.id()) {
                continue;
            }
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            let Some(block) = Block::classify(element.value().name()) else {
                continue;
            };
            if parent_is_structured(element) {
                continue;
            }

            let token = match block {
                Block::Table => {
                    consume(element, &mut visited);
                    table_token(element)
                }
                Block::List(kind) => {
                    consume(element, &mut visited);
                    list_token(element, kind)
                }
                Block::Heading(level) => {
                    consume(element, &mut visited);
                    let text = element_text(element);
                    (!text.is_empty()).then_some(StructuralToken::Heading { level, text })
                }
                Block::Paragraph | Block::Generic => self.paragraph_token(element, &mut visited),
            };

            if let Some(token) = token {
                out.tokens.push(token);
                out.sources.push(element.id());
            }
        }

        structurer_trace!("structured extraction produced {} tokens", out.tokens.len());
        out
    }

    /// Flat text block, covering everything below it (inner paragraphs and
    /// headings included). Blocks holding a table or list are skipped so the
    /// nested structure is emitted by its own handler instead.
    fn paragraph_token(
        &self,
        element: ElementRef<'_>,
        visited: &mut HashSet<NodeId>,
    ) -> Option<StructuralToken> {
        if has_structured_descendant(element) {
            return None;
        }
        let text = element_text(element);
        if text.chars().count() <= self.paragraph_min_chars {
            return None;
        }
        consume(element, visited);
        Some(StructuralToken::Paragraph { text })
    }
}

fn table_token(table: ElementRef<'_>) -> Option<StructuralToken> {
    let rows: Vec<Vec<String>> = owned_elements(table, &["tr"], &["table"])
        .into_iter()
        .map(|row| {
            owned_elements(row, &["th", "td"], &["tr"])
                .into_iter()
                .map(element_text)
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect();
    (!rows.is_empty()).then_some(StructuralToken::Table { rows })
}

fn list_token(list: ElementRef<'_>, kind: ListKind) -> Option<StructuralToken> {
    let items: Vec<String> = owned_elements(list, &["li"], &["ul", "ol"])
        .into_iter()
        .map(element_text)
        .filter(|item| !item.is_empty())
        .collect();
    (!items.is_empty()).then_some(StructuralToken::List { kind, items })
}

/// Descendants of `owner` named in `names` whose nearest ancestor named in
/// `boundary` is `owner` itself; keeps rows of nested tables (or items of
/// nested lists) out of the enclosing structure.
fn owned_elements<'a>(owner: ElementRef<'a>, names: &[&str], boundary: &[&str]) -> Vec<ElementRef<'a>> {
    owner
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|el| names.contains(&el.value().name()))
        .filter(|el| nearest_ancestor(*el, boundary) == Some(owner.id()))
        .collect()
}

fn nearest_ancestor(element: ElementRef<'_>, names: &[&str]) -> Option<NodeId> {
    element
        .ancestors()
        .find(|node| {
            node.value()
                .as_element()
                .is_some_and(|el| names.contains(&el.name()))
        })
        .map(|node| node.id())
}

fn parent_is_structured(element: ElementRef<'_>) -> bool {
    element
        .parent()
        .and_then(|parent| parent.value().as_element().map(|el| is_structured(el.name())))
        .unwrap_or(false)
}

fn has_structured_descendant(element: ElementRef<'_>) -> bool {
    element.descendants().skip(1).any(|node| {
        node.value()
            .as_element()
            .is_some_and(|el| is_structured(el.name()))
    })
}

fn consume(element: ElementRef<'_>, visited: &mut HashSet<NodeId>) {
    visited.extend(element.descendants().map(|node| node.id()));
}

/// Concatenated descendant text, whitespace-collapsed and trimmed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(*element, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if TEXTLESS_TAGS.contains(&el.name()) => {}
            Node::Element(el) if BREAKING_TAGS.contains(&el.name()) => {
                out.push(' ');
                collect_text(child, out);
                out.push(' ');
            }
            Node::Element(_) => collect_text(child, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_levels_are_parsed() {
        assert_eq!(heading_level("h1"), Some(1));
        assert_eq!(heading_level("h6"), Some(6));
        assert_eq!(heading_level("h7"), None);
        assert_eq!(heading_level("hr"), None);
        assert_eq!(heading_level("header"), None);
    }

    #[test]
    fn script_text_is_ignored() {
        let doc = scraper::Html::parse_fragment("<p>Visible <script>hidden()</script>words</p>");
        let sel = scraper::Selector::parse("p").unwrap();
        let p = doc.select(&sel).next().unwrap();
        assert_eq!(element_text(p), "Visible words");
    }

    #[test]
    fn block_children_keep_words_apart() {
        let doc = scraper::Html::parse_fragment("<li>Outer<ul><li>Inner</li></ul>tail<b>bold</b></li>");
        let sel = scraper::Selector::parse("li").unwrap();
        let li = doc.select(&sel).next().unwrap();
        assert_eq!(element_text(li), "Outer Inner tailbold");
    }
}
