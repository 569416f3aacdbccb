use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;

/// Handle to a node inside one `Document`.
///
/// Only meaningful within the page context that owns the document; never
/// serialized into the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Viewport-relative bounding box, as reported by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect { x, y, width, height }
    }
}

#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub rect: Rect,
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed DOM tree of a single page.
///
/// The root is always the `html` element. Tag and attribute names are
/// stored lowercase.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    pub url: Option<String>,
    pub title: String,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_root("html", &[])
    }

    fn with_root(tag: &str, attrs: &[(&str, &str)]) -> Self {
        let root = Node {
            data: NodeData::Element(ElementData {
                tag: tag.to_ascii_lowercase(),
                attributes: normalize_attrs(attrs.iter().map(|(k, v)| (*k, *v))),
                rect: Rect::default(),
            }),
            parent: None,
            children: vec![],
        };
        Document {
            nodes: vec![root],
            root: NodeId(0),
            url: None,
            title: String::new(),
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let data = NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes: normalize_attrs(attrs.iter().map(|(k, v)| (*k, *v))),
            rect: Rect::default(),
        });
        self.push_node(parent, data)
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push_node(parent, NodeData::Text(text.to_string()))
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(NodeData::Element(el)) = self.nodes.get_mut(node.0).map(|n| &mut n.data) {
            el.rect = rect;
        }
    }

    fn push_node(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: Some(parent),
            children: vec![],
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    // ------------------------------------------------------------------
    // Element accessors
    // ------------------------------------------------------------------

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.nodes.get(node.0).map(|n| &n.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|el| {
            el.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    /// The element's `id`, ignoring an empty attribute.
    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.attr(node, "id").filter(|id| !id.is_empty())
    }

    pub fn classes(&self, node: NodeId) -> impl Iterator<Item = &str> {
        self.attr(node, "class").unwrap_or("").split_whitespace()
    }

    pub fn rect(&self, node: NodeId) -> Rect {
        self.element(node).map(|el| el.rect).unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Tree navigation
    // ------------------------------------------------------------------

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
    }

    /// Element siblings that come before `node`, nearest first.
    pub fn previous_element_siblings(&self, node: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(node) else {
            return vec![];
        };
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == node).unwrap_or(0);
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .filter(|s| self.is_element(*s))
            .collect()
    }

    /// 1-based position among element siblings sharing the same tag.
    pub fn nth_of_type(&self, node: NodeId) -> usize {
        let tag = self.tag(node);
        1 + self
            .previous_element_siblings(node)
            .into_iter()
            .filter(|s| self.tag(*s) == tag)
            .count()
    }

    /// Element ancestors, nearest first, excluding `node` itself.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(node);
        while let Some(p) = current {
            if self.is_element(p) {
                out.push(p);
            }
            current = self.parent(p);
        }
        out
    }

    /// Element descendants in document order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            if !self.is_element(n) {
                continue;
            }
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Every element of the document in document order, root included.
    pub fn all_elements(&self) -> Vec<NodeId> {
        let mut out = vec![self.root];
        out.extend(self.descendants(self.root));
        out
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.all_elements()
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(id))
    }

    /// Rendered text of the subtree with whitespace runs collapsed.
    ///
    /// `script`, `style` and `template` contents are not rendered. Inline
    /// elements join their neighbours directly; block-level ones and `br`
    /// break the run.
    pub fn inner_text(&self, node: NodeId) -> String {
        let mut raw = String::new();
        self.collect_text(node, &mut raw);
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match self.nodes.get(node.0).map(|n| &n.data) {
            Some(NodeData::Text(t)) => out.push_str(t),
            Some(NodeData::Element(el)) => {
                if matches!(el.tag.as_str(), "script" | "style" | "template") {
                    return;
                }
                let block = is_block_level(&el.tag);
                if block {
                    out.push(' ');
                }
                for child in self.children(node) {
                    self.collect_text(*child, out);
                }
                if block {
                    out.push(' ');
                }
            }
            None => {}
        }
    }

    // ------------------------------------------------------------------
    // Snapshot loading
    // ------------------------------------------------------------------

    pub fn from_snapshot(snapshot: &PageSnapshot) -> Self {
        let root = &snapshot.dom;
        let attrs: Vec<(&str, &str)> = root
            .attrs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let mut doc = Document::with_root(&root.tag, &attrs);
        doc.url = snapshot.url.clone();
        doc.title = snapshot.title.clone();
        doc.scroll_x = snapshot.scroll_x;
        doc.scroll_y = snapshot.scroll_y;
        doc.set_rect(doc.root, root.rect);
        let root_id = doc.root;
        doc.append_snapshot_children(root_id, root);
        doc
    }

    fn append_snapshot_children(&mut self, parent: NodeId, el: &ElementSnapshot) {
        if let Some(text) = &el.text {
            self.append_text(parent, text);
        }
        for child in &el.children {
            match child {
                DomSnapshot::Text(text) => {
                    self.append_text(parent, text);
                }
                DomSnapshot::Element(child_el) => {
                    let attrs: Vec<(&str, &str)> = child_el
                        .attrs
                        .iter()
                        .map(|(k, v)| (k.as_str(), v.as_str()))
                        .collect();
                    let id = self.append_element(parent, &child_el.tag, &attrs);
                    self.set_rect(id, child_el.rect);
                    self.append_snapshot_children(id, child_el);
                }
            }
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: PageSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(&snapshot))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }
}

fn normalize_attrs<'a>(attrs: impl Iterator<Item = (&'a str, &'a str)>) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for (k, v) in attrs {
        let name = k.to_ascii_lowercase();
        // First occurrence wins, matching HTML parsing of duplicate attributes
        if !out.iter().any(|(existing, _)| *existing == name) {
            out.push((name, v.to_string()));
        }
    }
    out
}

// ============================================================================
// JSON DOM snapshot (as produced by a page extraction script)
// ============================================================================

/// A whole page: metadata plus the `html` element tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "scrollX")]
    pub scroll_x: f64,
    #[serde(default, rename = "scrollY")]
    pub scroll_y: f64,
    pub dom: ElementSnapshot,
}

/// A snapshot node: a bare string is a text node, an object is an element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomSnapshot {
    Text(String),
    Element(ElementSnapshot),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// Leading text, shorthand for a first text child.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub children: Vec<DomSnapshot>,
}

fn is_block_level(tag: &str) -> bool {
    matches!(
        tag,
        "address" | "article" | "aside" | "blockquote" | "br" | "dd" | "details" | "dialog"
            | "div" | "dl" | "dt" | "fieldset" | "figcaption" | "figure" | "footer" | "form"
            | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "header" | "hr" | "li" | "main" | "nav"
            | "ol" | "option" | "p" | "pre" | "section" | "summary" | "table" | "tbody" | "td"
            | "tfoot" | "th" | "thead" | "tr" | "ul"
    )
}
