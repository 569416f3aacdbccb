use std::time::Instant;

use crate::dom::dom_model::{Document, NodeId};

/// Labels closer than this to the viewport top are drawn below the box.
pub const LABEL_FLIP_THRESHOLD: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStyle {
    /// Live hover while inspecting.
    Hover,
    /// Control panel list-hover feedback.
    Preview,
    /// The captured target once inspection stopped.
    Locked,
    /// Brief confirmation right after a capture.
    Success,
}

impl OverlayStyle {
    pub fn border(&self) -> &'static str {
        match self {
            OverlayStyle::Hover => "2px solid #ff00ff",
            OverlayStyle::Preview => "2px solid #2196f3",
            OverlayStyle::Locked => "3px dotted #ff0000",
            OverlayStyle::Success => "2px solid #00ff00",
        }
    }

    pub fn background(&self) -> &'static str {
        match self {
            OverlayStyle::Hover => "rgba(255, 0, 255, 0.1)",
            OverlayStyle::Preview => "rgba(33, 150, 243, 0.2)",
            OverlayStyle::Locked => "rgba(255, 0, 0, 0.05)",
            OverlayStyle::Success => "rgba(0, 255, 0, 0.2)",
        }
    }
}

/// Geometry and styling of the highlight box, in page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub target: NodeId,
    pub style: OverlayStyle,
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub label: String,
    pub label_below: bool,
    pub visible: bool,
}

/// Sole owner of the page's highlight overlay.
#[derive(Debug, Default)]
pub struct OverlayObserver {
    overlay: Option<OverlayBox>,
    flash_until: Option<Instant>,
}

impl OverlayObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&OverlayBox> {
        self.overlay.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.overlay.as_ref().is_some_and(|o| o.visible)
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_until.is_some()
    }

    /// Position the overlay over `node`. Cancels a pending flash.
    pub fn highlight(&mut self, doc: &Document, node: NodeId, style: OverlayStyle) {
        self.flash_until = None;
        self.overlay = Some(layout(doc, node, style));
    }

    /// Show the success style over `node` until `until`.
    pub fn flash(&mut self, doc: &Document, node: NodeId, until: Instant) {
        self.overlay = Some(layout(doc, node, OverlayStyle::Success));
        self.flash_until = Some(until);
    }

    /// Returns true once when a pending flash has run its course.
    pub fn flash_expired(&mut self, now: Instant) -> bool {
        match self.flash_until {
            Some(until) if now >= until => {
                self.flash_until = None;
                true
            }
            _ => false,
        }
    }

    pub fn hide(&mut self) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.visible = false;
        }
    }

    pub fn remove(&mut self) {
        self.overlay = None;
        self.flash_until = None;
    }
}

fn layout(doc: &Document, node: NodeId, style: OverlayStyle) -> OverlayBox {
    let rect = doc.rect(node);
    let label = match style {
        OverlayStyle::Preview => "Preview".to_string(),
        _ => tag_label(doc, node),
    };

    OverlayBox {
        target: node,
        style,
        top: rect.y + doc.scroll_y,
        left: rect.x + doc.scroll_x,
        width: rect.width,
        height: rect.height,
        label,
        label_below: rect.y < LABEL_FLIP_THRESHOLD,
        visible: true,
    }
}

/// `tag#id`, else `tag.firstClass`, else the bare tag.
pub fn tag_label(doc: &Document, node: NodeId) -> String {
    let tag = doc.tag(node).unwrap_or("");
    if let Some(id) = doc.id(node) {
        format!("{}#{}", tag, id)
    } else if let Some(class) = doc.classes(node).next() {
        format!("{}.{}", tag, class)
    } else {
        tag.to_string()
    }
}
