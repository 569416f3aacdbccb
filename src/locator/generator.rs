use tracing::{debug, trace};

use crate::dom::dom_model::{Document, NodeId};
use crate::dom::escape::{css_escape, escape_attr_value};
use crate::locator::candidate::{Candidate, CandidateKind, CandidateSet};
use crate::locator::css_path::build_css_path;

/// Attributes that exist purely to give tests a stable hook.
pub const TEST_ATTRIBUTES: [&str; 6] = [
    "data-testid",
    "data-cy",
    "data-test",
    "data-qa",
    "data-qa-id",
    "data-test-id",
];

pub const DEFAULT_DESCENDANT_LIMIT: usize = 10;

/// Visible text is only used when shorter than this many characters.
pub const MAX_TEXT_CHARS: usize = 40;

const NOISE_CLASS_PREFIXES: [&str; 2] = ["ng-", "css-"];

const TEXT_CONTAINERS: &str = "button, a, label, h1, h2, h3, h4, h5, h6, [role=\"button\"]";

const INTERACTIVE_TAGS: [&str; 5] = ["button", "a", "input", "select", "textarea"];

// Priority tiers, higher wins
const PRIORITY_OWN_TEST_ATTR: i32 = 10;
const PRIORITY_LABEL_INPUT_TEST_ATTR: i32 = 10;
const PRIORITY_OWN_ID: i32 = 9;
const PRIORITY_OWN_NAME: i32 = 8;
const PRIORITY_LABEL_INPUT_ID: i32 = 7;
const PRIORITY_LABEL_FOR: i32 = 6;
const PRIORITY_ANCESTOR_TEST_ATTR: i32 = 5;
const PRIORITY_DESCENDANT_TEST_ATTR: i32 = 4;
const PRIORITY_PLACEHOLDER_ALT: i32 = 3;
const PRIORITY_TEXT: i32 = 2;
const PRIORITY_CLASS: i32 = 1;
const PRIORITY_CSS_PATH: i32 = 0;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Cap on test-attribute hits collected from the target's subtree.
    pub descendant_limit: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            descendant_limit: DEFAULT_DESCENDANT_LIMIT,
        }
    }
}

/// Produces ranked locator candidates for one target element.
///
/// Reads the document, never mutates it.
pub struct CandidateGenerator<'a> {
    doc: &'a Document,
    config: GeneratorConfig,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self::with_config(doc, GeneratorConfig::default())
    }

    pub fn with_config(doc: &'a Document, config: GeneratorConfig) -> Self {
        CandidateGenerator { doc, config }
    }

    /// Generate the candidate set for `target`.
    ///
    /// Strategies run from most to least stable; a value produced by an
    /// earlier strategy keeps that strategy's label and priority. The set
    /// always holds at least the structural path.
    pub fn generate(&self, target: NodeId) -> CandidateSet {
        let target = self.element_target(target);
        let mut found = Collector {
            doc: self.doc,
            candidates: Vec::new(),
        };

        self.own_test_attributes(target, &mut found);
        self.own_id(target, &mut found);
        self.own_name(target, &mut found);
        self.label_for_control(target, &mut found);
        self.ancestor_test_attributes(target, &mut found);
        self.descendant_test_attributes(target, &mut found);
        self.placeholder_and_alt(target, &mut found);
        self.visible_text(target, &mut found);
        self.unique_class(target, &mut found);

        if found.candidates.is_empty() {
            let path = build_css_path(self.doc, target);
            found.add(CandidateKind::CssPath, path, target, "css-path", PRIORITY_CSS_PATH);
        }

        let set = CandidateSet::from_generated(found.candidates);
        debug!(
            count = set.len(),
            best = set.best().map(|c| c.value.as_str()).unwrap_or(""),
            "generated locator candidates"
        );
        set
    }

    fn element_target(&self, node: NodeId) -> NodeId {
        if self.doc.is_element(node) {
            node
        } else {
            self.doc.ancestors(node).into_iter().next().unwrap_or(self.doc.root())
        }
    }

    // ------------------------------------------------------------------
    // Strategies
    // ------------------------------------------------------------------

    fn own_test_attributes(&self, target: NodeId, found: &mut Collector) {
        for attr in TEST_ATTRIBUTES {
            if let Some(value) = non_empty(self.doc.attr(target, attr)) {
                found.add(
                    CandidateKind::AttributeCss,
                    attr_selector(attr, value),
                    target,
                    format!("{} (own element)", attr),
                    PRIORITY_OWN_TEST_ATTR,
                );
            }
        }
    }

    fn own_id(&self, target: NodeId, found: &mut Collector) {
        let Some(id) = self.doc.id(target) else {
            return;
        };
        if looks_generated(id) {
            trace!(id, "skipping generated-looking id");
            return;
        }
        let selector = format!("#{}", css_escape(id));
        if self.doc.is_unique(&selector) {
            found.add(CandidateKind::AttributeCss, selector, target, "id (own element)", PRIORITY_OWN_ID);
        }
    }

    fn own_name(&self, target: NodeId, found: &mut Collector) {
        let Some(name) = non_empty(self.doc.attr(target, "name")) else {
            return;
        };
        let selector = attr_selector("name", name);
        if self.doc.is_unique(&selector) {
            found.add(
                CandidateKind::AttributeCss,
                selector,
                target,
                "name (own element)",
                PRIORITY_OWN_NAME,
            );
        }
    }

    /// A click on a label (or inside one) is really about the control it
    /// labels, so prefer that control's hooks.
    fn label_for_control(&self, target: NodeId, found: &mut Collector) {
        let Some(label) = self.enclosing_label(target) else {
            return;
        };
        let Some(for_id) = non_empty(self.doc.attr(label, "for")) else {
            return;
        };

        if let Some(control) = self.doc.get_element_by_id(for_id) {
            for attr in TEST_ATTRIBUTES {
                if let Some(value) = non_empty(self.doc.attr(control, attr)) {
                    found.add(
                        CandidateKind::AttributeCss,
                        attr_selector(attr, value),
                        control,
                        format!("label -> input {}", attr),
                        PRIORITY_LABEL_INPUT_TEST_ATTR,
                    );
                }
            }

            let id_selector = format!("#{}", css_escape(for_id));
            if self.doc.is_unique(&id_selector) {
                found.add(
                    CandidateKind::AttributeCss,
                    id_selector,
                    control,
                    "label -> input id",
                    PRIORITY_LABEL_INPUT_ID,
                );
            }
        }

        found.add(
            CandidateKind::AttributeCss,
            format!("#{}", css_escape(for_id)),
            label,
            "label-for",
            PRIORITY_LABEL_FOR,
        );
    }

    /// The target itself if it is a label, else the nearest label ancestor
    /// that is not separated from the target by another interactive element.
    fn enclosing_label(&self, target: NodeId) -> Option<NodeId> {
        if self.doc.tag(target) == Some("label") {
            return Some(target);
        }
        for ancestor in self.doc.ancestors(target) {
            match self.doc.tag(ancestor) {
                Some("label") => return Some(ancestor),
                Some("body") | Some("html") => return None,
                _ if self.is_interactive(ancestor) => return None,
                _ => {}
            }
        }
        None
    }

    fn ancestor_test_attributes(&self, target: NodeId, found: &mut Collector) {
        let has_own = TEST_ATTRIBUTES
            .iter()
            .any(|attr| non_empty(self.doc.attr(target, attr)).is_some());
        if has_own {
            return;
        }

        let nearest = self.doc.ancestors(target).into_iter().find(|a| {
            TEST_ATTRIBUTES
                .iter()
                .any(|attr| non_empty(self.doc.attr(*a, attr)).is_some())
        });
        let Some(ancestor) = nearest else {
            return;
        };

        for attr in TEST_ATTRIBUTES {
            if let Some(value) = non_empty(self.doc.attr(ancestor, attr)) {
                found.add(
                    CandidateKind::AttributeCss,
                    attr_selector(attr, value),
                    ancestor,
                    format!("{} (ancestor)", attr),
                    PRIORITY_ANCESTOR_TEST_ATTR,
                );
            }
        }
    }

    fn descendant_test_attributes(&self, target: NodeId, found: &mut Collector) {
        let mut hits = 0;
        'scan: for child in self.doc.descendants(target) {
            for attr in TEST_ATTRIBUTES {
                let Some(value) = non_empty(self.doc.attr(child, attr)) else {
                    continue;
                };
                let tag = self.doc.tag(child).unwrap_or("");
                found.add(
                    CandidateKind::AttributeCss,
                    attr_selector(attr, value),
                    child,
                    format!("{} (descendant/{})", attr, tag),
                    PRIORITY_DESCENDANT_TEST_ATTR,
                );
                hits += 1;
                if hits >= self.config.descendant_limit {
                    break 'scan;
                }
            }
        }
    }

    fn placeholder_and_alt(&self, target: NodeId, found: &mut Collector) {
        if let Some(placeholder) = non_empty(self.doc.attr(target, "placeholder")) {
            found.add(
                CandidateKind::Placeholder,
                placeholder.to_string(),
                target,
                "placeholder",
                PRIORITY_PLACEHOLDER_ALT,
            );
        }

        if self.doc.tag(target) == Some("img") {
            if let Some(alt) = non_empty(self.doc.attr(target, "alt")) {
                found.add(CandidateKind::AltText, alt.to_string(), target, "alt", PRIORITY_PLACEHOLDER_ALT);
            }
        }
    }

    fn visible_text(&self, target: NodeId, found: &mut Collector) {
        let container = self
            .doc
            .closest(target, TEXT_CONTAINERS)
            .ok()
            .flatten()
            .unwrap_or(target);

        let text = self.doc.inner_text(container);
        let text = text.trim();
        let len = text.chars().count();
        if len > 0 && len < MAX_TEXT_CHARS {
            found.add(CandidateKind::TextContent, text.to_string(), container, "text", PRIORITY_TEXT);
        }
    }

    fn unique_class(&self, target: NodeId, found: &mut Collector) {
        let usable = self.doc.classes(target).filter(|class| {
            class.chars().count() > 3
                && !class.starts_with(|c: char| c.is_ascii_digit())
                && !NOISE_CLASS_PREFIXES.iter().any(|p| class.starts_with(p))
        });

        for class in usable {
            let selector = format!(".{}", css_escape(class));
            if self.doc.is_unique(&selector) {
                found.add(CandidateKind::AttributeCss, selector, target, "class", PRIORITY_CLASS);
                break;
            }
        }
    }

    fn is_interactive(&self, node: NodeId) -> bool {
        self.doc
            .tag(node)
            .is_some_and(|tag| INTERACTIVE_TAGS.contains(&tag))
            || self.doc.attr(node, "role") == Some("button")
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct Collector<'a> {
    doc: &'a Document,
    candidates: Vec<Candidate>,
}

impl Collector<'_> {
    /// Record a candidate unless its value was already produced.
    fn add(
        &mut self,
        kind: CandidateKind,
        value: String,
        element: NodeId,
        label: impl Into<String>,
        priority: i32,
    ) {
        if self.candidates.iter().any(|c| c.value == value) {
            trace!(value = value.as_str(), "duplicate candidate dropped");
            return;
        }
        self.candidates.push(Candidate {
            kind,
            unique_element_path: build_css_path(self.doc, element),
            value,
            label: label.into(),
            priority,
            element,
        });
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn attr_selector(attr: &str, value: &str) -> String {
    format!("[{}=\"{}\"]", attr, escape_attr_value(value))
}

/// Ids that are purely numeric, namespaced (`:`), or carry a long digit run
/// are usually framework-generated and change between renders.
pub fn looks_generated(id: &str) -> bool {
    if id.chars().all(|c| c.is_ascii_digit()) || id.contains(':') {
        return true;
    }
    let mut run = 0;
    for c in id.chars() {
        if c.is_ascii_digit() {
            run += 1;
            if run >= 10 {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}
