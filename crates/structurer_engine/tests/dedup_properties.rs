use std::collections::HashSet;

use proptest::prelude::*;
use scraper::Html;
use structurer_engine::{render_tokens, StructuredExtractor};

#[derive(Debug, Clone)]
enum Shape {
    Text,
    Element(&'static str, Vec<Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = Just(Shape::Text);
    leaf.prop_recursive(5, 64, 4, |inner| {
        (
            prop::sample::select(vec![
                "div", "p", "ul", "ol", "li", "table", "tr", "td", "th", "h2", "h4", "span",
                "section",
            ]),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(tag, children)| Shape::Element(tag, children))
    })
}

/// Renders the shape to HTML, giving every text node a unique marker.
fn to_html(shape: &Shape, next: &mut usize, out: &mut String) {
    match shape {
        Shape::Text => {
            out.push_str(&format!(" m{next}x some filler words "));
            *next += 1;
        }
        Shape::Element(tag, children) => {
            out.push_str(&format!("<{tag}>"));
            for child in children {
                to_html(child, next, out);
            }
            out.push_str(&format!("</{tag}>"));
        }
    }
}

proptest! {
    #[test]
    fn every_text_node_is_emitted_at_most_once(root in shape()) {
        let mut html = String::new();
        let mut markers = 0;
        to_html(&root, &mut markers, &mut html);

        let doc = Html::parse_fragment(&html);
        let tokens = StructuredExtractor::new().extract(doc.root_element());
        let rendered = render_tokens(&tokens);

        for n in 0..markers {
            let marker = format!("m{n}x");
            prop_assert!(rendered.matches(&marker).count() <= 1, "{marker} repeated in {rendered:?}");
        }
    }

    #[test]
    fn token_sources_are_disjoint_subtrees(root in shape()) {
        let mut html = String::new();
        to_html(&root, &mut 0, &mut html);

        let doc = Html::parse_fragment(&html);
        let extraction = StructuredExtractor::new()
            .extract_excluding(doc.root_element(), &HashSet::new());
        prop_assert_eq!(extraction.tokens.len(), extraction.sources.len());

        let sources: HashSet<_> = extraction.sources.iter().copied().collect();
        prop_assert_eq!(sources.len(), extraction.sources.len());
        for id in &extraction.sources {
            let node = doc.tree.get(*id).unwrap();
            prop_assert!(node.ancestors().all(|a| !sources.contains(&a.id())));
        }
    }
}
