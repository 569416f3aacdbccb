use std::sync::{Arc, Weak};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    dom::dom_model::{Document, NodeId},
    error::StoreError,
    inspector::{
        overlay::OverlayObserver,
        pointer::{AgentId, EventDisposition, PointerCapture, PointerEvent, PointerKind, PointerSubscription},
        state_machine::{Effect, InspectorEvent, InspectorState, Mode, resting_effect, transition},
    },
    locator::{
        candidate::{CandidateSet, SelectorOption},
        formatter::Framework,
        generator::{CandidateGenerator, GeneratorConfig},
    },
    sync::{
        history::{HISTORY_CAPACITY, record_capture},
        message::AgentMessage,
        schema::StoreKey,
        store::{SharedStore, StoreSubscription, decode_or_default},
    },
    trace::{logger::TraceLogger, trace::TraceEvent},
};

pub const DEFAULT_FLASH_DURATION: Duration = Duration::from_millis(500);

/// Liveness anchor of the extension that installed the page agent.
///
/// Agents hold a `Weak` reference; once the host drops the runtime (an
/// extension reload), every agent it installed is stale.
#[derive(Debug)]
pub struct ExtensionRuntime {
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub flash_duration: Duration,
    pub history_capacity: usize,
    pub generator: GeneratorConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            flash_duration: DEFAULT_FLASH_DURATION,
            history_capacity: HISTORY_CAPACITY,
            generator: GeneratorConfig::default(),
        }
    }
}

/// Everything a page agent needs from the page it is installed into.
pub struct AgentContext {
    pub id: AgentId,
    pub document: Arc<Document>,
    pub store: SharedStore,
    pub runtime: Weak<ExtensionRuntime>,
    pub pointer_capture: PointerCapture,
    pub config: AgentConfig,
    pub tracer: Option<Arc<TraceLogger>>,
}

/// The page-resident half of the inspector.
///
/// Owns the state machine, the pointer subscription and the overlay. All
/// transitions go through `apply`, which runs the pure transition function
/// and then performs its effects.
pub struct PageAgent {
    id: AgentId,
    document: Arc<Document>,
    store: SharedStore,
    store_changes: StoreSubscription,
    runtime: Weak<ExtensionRuntime>,
    pointer_capture: PointerCapture,
    subscription: Option<PointerSubscription>,
    state: InspectorState,
    framework: Framework,
    overlay: OverlayObserver,
    config: AgentConfig,
    tracer: Option<Arc<TraceLogger>>,
    step: u64,
    last_capture: Option<CandidateSet>,
    torn_down: bool,
}

impl PageAgent {
    /// Install an agent and restore the persisted `inspecting` flag.
    pub fn start(ctx: AgentContext) -> Result<Self, StoreError> {
        // Subscribe before reading so no change slips between the two
        let store_changes = ctx.store.subscribe()?;
        let inspecting: bool =
            decode_or_default(StoreKey::Inspecting.as_str(), ctx.store.get(StoreKey::Inspecting.as_str())?);
        let framework: Framework =
            decode_or_default(StoreKey::Framework.as_str(), ctx.store.get(StoreKey::Framework.as_str())?);

        let mut agent = PageAgent {
            id: ctx.id,
            document: ctx.document,
            store: ctx.store,
            store_changes,
            runtime: ctx.runtime,
            pointer_capture: ctx.pointer_capture,
            subscription: None,
            state: InspectorState::default(),
            framework,
            overlay: OverlayObserver::new(),
            config: ctx.config,
            tracer: ctx.tracer,
            step: 0,
            last_capture: None,
            torn_down: false,
        };

        info!(agent = agent.id.0, inspecting, %framework, "page agent installed");
        if inspecting {
            agent.apply(InspectorEvent::SetInspecting(true));
        }
        Ok(agent)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn state(&self) -> &InspectorState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }

    pub fn overlay(&self) -> &OverlayObserver {
        &self.overlay
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn last_capture(&self) -> Option<&CandidateSet> {
        self.last_capture.as_ref()
    }

    pub fn has_pointer_capture(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Attached, not torn down, and its extension runtime still exists.
    pub fn is_live(&self) -> bool {
        !self.torn_down && self.runtime_alive()
    }

    fn runtime_alive(&self) -> bool {
        self.runtime.upgrade().is_some()
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    /// Entry point of the capturing pointer listeners.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> EventDisposition {
        if self.torn_down {
            return EventDisposition::default();
        }
        if !self.runtime_alive() {
            self.teardown();
            return EventDisposition::default();
        }

        let event = match event.kind {
            PointerKind::Over => InspectorEvent::PointerOver(event.target),
            PointerKind::Out => InspectorEvent::PointerOut(event.target),
            PointerKind::Click => InspectorEvent::Click(event.target),
        };
        self.apply(event)
    }

    pub fn handle_message(&mut self, message: &AgentMessage) {
        if self.torn_down {
            return;
        }
        match message {
            AgentMessage::ToggleBox(on) => {
                self.apply(InspectorEvent::SetInspecting(*on));
            }
            AgentMessage::HighlightSelector(selector) => {
                let resolved = selector.as_deref().and_then(|s| self.resolve_preview(s));
                self.apply(InspectorEvent::Preview(resolved));
            }
        }
    }

    /// Apply pending store changes, newest value per field.
    pub fn pump_store(&mut self) {
        if self.torn_down {
            return;
        }
        if !self.runtime_alive() {
            self.teardown();
            return;
        }
        let mut changes = self.store_changes.drain_latest();

        if let Some(value) = changes.remove(StoreKey::Framework.as_str()) {
            self.framework = decode_or_default(StoreKey::Framework.as_str(), value);
            debug!(agent = self.id.0, framework = %self.framework, "framework changed");
        }
        if let Some(value) = changes.remove(StoreKey::Inspecting.as_str()) {
            let on: bool = decode_or_default(StoreKey::Inspecting.as_str(), value);
            self.apply(InspectorEvent::SetInspecting(on));
        }
    }

    /// Settle an expired success flash into the resting visual.
    pub fn tick(&mut self, now: Instant) {
        if self.torn_down || !self.overlay.flash_expired(now) {
            return;
        }
        let effect = resting_effect(&self.state);
        self.run_effect(effect, &mut EventDisposition::default());
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn apply(&mut self, event: InspectorEvent) -> EventDisposition {
        let (next, effects) = transition(&self.state, &event);

        if let Some(tracer) = &self.tracer {
            tracer.log(
                &TraceEvent::now(self.step, self.id, self.state.mode)
                    .with_event(&event)
                    .with_outcome(next.mode, &effects),
            );
        }
        self.step += 1;

        if next.mode != self.state.mode {
            debug!(agent = self.id.0, from = ?self.state.mode, to = ?next.mode, "inspector transition");
        }
        self.state = next;

        let mut disposition = EventDisposition::default();
        for effect in effects {
            self.run_effect(effect, &mut disposition);
        }
        disposition
    }

    fn run_effect(&mut self, effect: Effect, disposition: &mut EventDisposition) {
        match effect {
            Effect::InstallPointerCapture => {
                if self.subscription.is_none() {
                    self.subscription = Some(self.pointer_capture.subscribe(self.id));
                }
            }
            Effect::ReleasePointerCapture => {
                self.subscription = None;
            }
            Effect::PreventDefault => disposition.default_prevented = true,
            Effect::StopPropagation => disposition.propagation_stopped = true,
            Effect::Highlight { node, style } => self.overlay.highlight(&self.document, node, style),
            Effect::HideOverlay => self.overlay.hide(),
            Effect::RemoveOverlay => self.overlay.remove(),
            Effect::Capture { target } => {
                if let Err(e) = self.capture(target) {
                    warn!(agent = self.id.0, error = %e, "failed to publish capture");
                }
            }
            Effect::Flash { node } => {
                let until = Instant::now() + self.config.flash_duration;
                self.overlay.flash(&self.document, node, until);
            }
        }
    }

    /// Generate, format and publish locators for `target`.
    fn capture(&mut self, target: NodeId) -> Result<(), StoreError> {
        let generator = CandidateGenerator::with_config(&self.document, self.config.generator.clone());
        let candidates = generator.generate(target);

        let Some(best) = candidates.best() else {
            return Ok(());
        };
        let formatted = best.format(self.framework);
        let timestamp = self.next_capture_timestamp()?;

        let mut history: Vec<SelectorOption> =
            decode_or_default(StoreKey::History.as_str(), self.store.get(StoreKey::History.as_str())?);
        record_capture(&mut history, best.to_option(), self.config.history_capacity);

        info!(
            agent = self.id.0,
            best = best.value.as_str(),
            candidates = candidates.len(),
            "captured element"
        );

        self.store.set_many(vec![
            (StoreKey::Inspecting.as_str().to_string(), json!(false)),
            (StoreKey::LastSelector.as_str().to_string(), json!(formatted)),
            (
                StoreKey::SelectorOptions.as_str().to_string(),
                json!(candidates.to_options()),
            ),
            (StoreKey::CaptureTimestamp.as_str().to_string(), json!(timestamp)),
            (StoreKey::History.as_str().to_string(), json!(history)),
        ])?;

        self.last_capture = Some(candidates);
        Ok(())
    }

    /// Wall-clock millis, bumped past the stored value so captures stay
    /// strictly increasing even across agents.
    fn next_capture_timestamp(&self) -> Result<u64, StoreError> {
        let previous: u64 = decode_or_default(
            StoreKey::CaptureTimestamp.as_str(),
            self.store.get(StoreKey::CaptureTimestamp.as_str())?,
        );
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Ok(now.max(previous.saturating_add(1)))
    }

    fn resolve_preview(&self, selector: &str) -> Option<NodeId> {
        match self.document.query_selector_all(selector) {
            Ok(found) if found.len() == 1 => Some(found[0]),
            Ok(found) => {
                debug!(selector, matches = found.len(), "preview selector did not resolve to one element");
                None
            }
            Err(e) => {
                debug!(selector, error = %e, "invalid preview selector");
                None
            }
        }
    }

    /// Detach after the host runtime went away: listeners and overlay go,
    /// and the agent ignores everything from now on.
    fn teardown(&mut self) {
        info!(agent = self.id.0, "extension context invalidated, removing stale page agent");
        if let Some(tracer) = &self.tracer {
            tracer.log(&TraceEvent::now(self.step, self.id, self.state.mode).with_note("stale agent teardown"));
        }
        self.subscription = None;
        self.overlay.remove();
        self.torn_down = true;
    }
}
