use serde::Serialize;
use structurer_engine::{ExtractedDocument, NoContent};

pub type Outcome = Result<ExtractedDocument, NoContent>;

/// Text block for one extracted page: a header, the metadata lines, a blank
/// line and the rendered token stream.
pub fn text_block(doc: &ExtractedDocument) -> String {
    let mut out = format!("=== {} ===\ntitle: {}\nmethod: {}\n", doc.url, doc.title, doc.method.as_str());
    if let Some(authors) = &doc.authors {
        out.push_str(&format!("authors: {}\n", authors.join(", ")));
    }
    if let Some(date) = &doc.publish_date {
        out.push_str(&format!("published: {}\n", date.to_rfc3339()));
    }
    out.push('\n');
    out.push_str(&doc.render());
    out.push('\n');
    out
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum JsonEntry<'a> {
    Extracted {
        #[serde(flatten)]
        document: &'a ExtractedDocument,
        text: String,
    },
    Failed {
        url: &'a str,
        reasons: &'a [String],
    },
}

/// All outcomes as one pretty-printed JSON array, in input order.
pub fn json_report(outcomes: &[Outcome]) -> serde_json::Result<String> {
    let entries: Vec<JsonEntry<'_>> = outcomes
        .iter()
        .map(|outcome| match outcome {
            Ok(document) => JsonEntry::Extracted {
                document,
                text: document.render(),
            },
            Err(err) => JsonEntry::Failed {
                url: &err.url,
                reasons: &err.reasons,
            },
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}
