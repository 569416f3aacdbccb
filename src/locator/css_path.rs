use crate::dom::dom_model::{Document, NodeId};
use crate::dom::escape::css_escape;

/// Build a `>`-joined structural path from the document root down to `node`.
///
/// Each level is the tag name, qualified with `:nth-of-type(n)` when the
/// element is not the first of its tag among its siblings. The walk stops
/// early at the nearest element carrying an id (`tag#id`).
pub fn build_css_path(doc: &Document, node: NodeId) -> String {
    let mut path: Vec<String> = Vec::new();
    let mut current = nearest_element(doc, node);

    while let Some(el) = current {
        let Some(tag) = doc.tag(el) else {
            break;
        };

        if let Some(id) = doc.id(el) {
            path.push(format!("{}#{}", tag, css_escape(id)));
            break;
        }

        let nth = doc.nth_of_type(el);
        if nth == 1 {
            path.push(tag.to_string());
        } else {
            path.push(format!("{}:nth-of-type({})", tag, nth));
        }

        current = doc.parent(el).filter(|p| doc.is_element(*p));
    }

    path.reverse();
    path.join(" > ")
}

fn nearest_element(doc: &Document, node: NodeId) -> Option<NodeId> {
    if doc.is_element(node) {
        Some(node)
    } else {
        doc.ancestors(node).into_iter().next()
    }
}
