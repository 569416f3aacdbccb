use std::sync::{Arc, Mutex, MutexGuard};

use crate::dom::dom_model::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Over,
    Out,
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub target: NodeId,
}

impl PointerEvent {
    pub fn over(target: NodeId) -> Self {
        PointerEvent { kind: PointerKind::Over, target }
    }

    pub fn out(target: NodeId) -> Self {
        PointerEvent { kind: PointerKind::Out, target }
    }

    pub fn click(target: NodeId) -> Self {
        PointerEvent { kind: PointerKind::Click, target }
    }
}

/// What a capturing listener did to an event before the page saw it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventDisposition {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
}

impl EventDisposition {
    pub fn merge(&mut self, other: EventDisposition) {
        self.default_prevented |= other.default_prevented;
        self.propagation_stopped |= other.propagation_stopped;
    }
}

// ============================================================================
// Listener registry of one page
// ============================================================================

#[derive(Debug)]
struct Listener {
    id: u64,
    owner: AgentId,
    kind: PointerKind,
    capture: bool,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<Listener>,
    cursor_overrides: Vec<AgentId>,
}

/// The page's pointer listeners and cursor overrides.
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct PointerCapture {
    registry: Arc<Mutex<Registry>>,
}

impl PointerCapture {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // A panic mid-update leaves the registry structurally valid
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Install capturing `pointerover`, `pointerout` and `click` listeners
    /// plus the crosshair cursor for `owner`. Dropping the returned handle
    /// removes all of them.
    pub fn subscribe(&self, owner: AgentId) -> PointerSubscription {
        let mut registry = self.lock();
        let mut listener_ids = Vec::with_capacity(3);

        for kind in [PointerKind::Over, PointerKind::Out, PointerKind::Click] {
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push(Listener {
                id,
                owner,
                kind,
                capture: true,
            });
            listener_ids.push(id);
        }
        registry.cursor_overrides.push(owner);

        PointerSubscription {
            capture: self.clone(),
            owner,
            listener_ids,
        }
    }

    /// Whether `owner` has a capturing listener for `kind`.
    pub fn is_listening(&self, owner: AgentId, kind: PointerKind) -> bool {
        self.lock()
            .listeners
            .iter()
            .any(|l| l.owner == owner && l.kind == kind && l.capture)
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn cursor_override_active(&self) -> bool {
        !self.lock().cursor_overrides.is_empty()
    }

    /// Forget every listener, as when the document is replaced.
    pub fn clear(&self) {
        let mut registry = self.lock();
        registry.listeners.clear();
        registry.cursor_overrides.clear();
    }
}

/// Scoped ownership of an agent's pointer listeners.
#[derive(Debug)]
pub struct PointerSubscription {
    capture: PointerCapture,
    owner: AgentId,
    listener_ids: Vec<u64>,
}

impl PointerSubscription {
    pub fn owner(&self) -> AgentId {
        self.owner
    }
}

impl Drop for PointerSubscription {
    fn drop(&mut self) {
        let mut registry = self.capture.lock();
        registry
            .listeners
            .retain(|l| !self.listener_ids.contains(&l.id));
        if let Some(pos) = registry.cursor_overrides.iter().position(|o| *o == self.owner) {
            registry.cursor_overrides.remove(pos);
        }
    }
}
