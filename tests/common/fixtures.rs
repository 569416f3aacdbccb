use std::path::PathBuf;

use selector_helper::dom::dom_model::{Document, NodeId, Rect};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn login_page() -> Document {
    Document::load(fixture_path("login_page.json")).unwrap()
}

/// The single element matching `selector`; panics otherwise.
pub fn node(doc: &Document, selector: &str) -> NodeId {
    let found = doc.query_selector_all(selector).unwrap();
    assert_eq!(found.len(), 1, "'{}' matched {} elements", selector, found.len());
    found[0]
}

/// `<body>` with the given children appended as `(tag, attrs, text)`.
pub fn page_with(elements: &[(&str, &[(&str, &str)], &str)]) -> (Document, Vec<NodeId>) {
    let mut doc = Document::new();
    let body = doc.append_element(doc.root(), "body", &[]);
    let mut ids = Vec::new();
    for (tag, attrs, text) in elements {
        let id = doc.append_element(body, tag, attrs);
        if !text.is_empty() {
            doc.append_text(id, text);
        }
        doc.set_rect(id, Rect::new(10.0, 40.0, 100.0, 20.0));
        ids.push(id);
    }
    (doc, ids)
}
