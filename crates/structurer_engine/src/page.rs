use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

/// Removes every element named in `noise_tags` (with its subtree) from the
/// document. Returns how many elements were detached.
pub fn strip_noise(doc: &mut Html, noise_tags: &[String]) -> usize {
    let doomed: Vec<NodeId> = doc
        .tree
        .root()
        .descendants()
        .filter(|node| {
            node.value().as_element().is_some_and(|el| {
                noise_tags
                    .iter()
                    .any(|tag| tag.eq_ignore_ascii_case(el.name()))
            })
        })
        .map(|node| node.id())
        .collect();

    for id in &doomed {
        if let Some(mut node) = doc.tree.get_mut(*id) {
            node.detach();
        }
    }
    doomed.len()
}

/// Text of the first `<title>` element, whitespace-collapsed, if non-empty.
pub fn page_title(doc: &Html) -> Option<String> {
    let title_sel = Selector::parse("title").ok()?;
    doc.root_element()
        .select(&title_sel)
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

/// The `<body>` element, or the document root when there is none.
pub fn body_element(doc: &Html) -> ElementRef<'_> {
    let root = doc.root_element();
    Selector::parse("body")
        .ok()
        .and_then(|sel| root.select(&sel).next())
        .unwrap_or(root)
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Length in characters of `text` once trimmed.
pub(crate) fn char_len(text: &str) -> usize {
    text.trim().chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_elements_are_detached() {
        let mut doc = Html::parse_document(
            "<html><head><title> My \n Page </title><script>var x;</script></head>\
             <body><nav>Home</nav><p>Kept text</p><footer>(c)</footer></body></html>",
        );
        let tags = ["script", "nav", "footer"].map(String::from);
        assert_eq!(strip_noise(&mut doc, &tags), 3);

        let body_text: String = body_element(&doc).text().collect();
        assert_eq!(body_text, "Kept text");
        assert_eq!(page_title(&doc).as_deref(), Some("My Page"));
    }

    #[test]
    fn missing_title_is_none() {
        let doc = Html::parse_document("<p>no head</p>");
        assert_eq!(page_title(&doc), None);
        assert_eq!(body_element(&doc).value().name(), "body");
    }
}
