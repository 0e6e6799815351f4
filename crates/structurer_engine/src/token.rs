use serde::Serialize;

const TABLE_OPEN: &str = "[TABLE]";
const TABLE_CLOSE: &str = "[/TABLE]";
const LIST_OPEN: &str = "[LIST]";
const LIST_CLOSE: &str = "[/LIST]";
const HEADING_OPEN: &str = "[HEADING]";
const HEADING_CLOSE: &str = "[/HEADING]";
const CELL_SEPARATOR: &str = " | ";
const BULLET: &str = "•";

/// Separator placed between rendered tokens.
pub const TOKEN_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// One semantic unit of extracted content.
///
/// Constructors upstream guarantee non-empty content: rows and items are
/// trimmed and non-empty, heading levels are 1..=6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructuralToken {
    Table { rows: Vec<Vec<String>> },
    List { kind: ListKind, items: Vec<String> },
    Heading { level: u8, text: String },
    Paragraph { text: String },
}

impl StructuralToken {
    /// Lines of a list as they appear between the list markers. Ordered lists
    /// are numbered from 1 in item order.
    pub fn list_lines(kind: ListKind, items: &[String]) -> Vec<String> {
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| match kind {
                ListKind::Ordered => format!("{}. {item}", idx + 1),
                ListKind::Unordered => format!("{BULLET} {item}"),
            })
            .collect()
    }

    /// Renders the token in the marker-delimited text format.
    pub fn render(&self) -> String {
        match self {
            StructuralToken::Table { rows } => {
                let body = rows
                    .iter()
                    .map(|row| row.join(CELL_SEPARATOR))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("{TABLE_OPEN}\n{body}\n{TABLE_CLOSE}")
            }
            StructuralToken::List { kind, items } => {
                let body = Self::list_lines(*kind, items).join("\n");
                format!("{LIST_OPEN}\n{body}\n{LIST_CLOSE}")
            }
            StructuralToken::Heading { text, .. } => {
                format!("{HEADING_OPEN} {text} {HEADING_CLOSE}")
            }
            StructuralToken::Paragraph { text } => text.clone(),
        }
    }
}

/// Renders a token sequence, one block per token separated by a blank line.
pub fn render_tokens(tokens: &[StructuralToken]) -> String {
    tokens
        .iter()
        .map(StructuralToken::render)
        .collect::<Vec<_>>()
        .join(TOKEN_SEPARATOR)
}
