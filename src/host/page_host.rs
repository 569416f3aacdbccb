use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::{
    dom::dom_model::Document,
    error::{ChannelError, StoreError},
    inspector::{
        agent::{AgentConfig, AgentContext, ExtensionRuntime, PageAgent},
        pointer::{AgentId, EventDisposition, PointerCapture, PointerEvent},
    },
    sync::{message::AgentMessage, store::SharedStore},
    trace::logger::TraceLogger,
};

/// One browser tab: a document, the extension runtime that injects agents
/// into it, and the agents currently attached.
pub struct PageHost {
    document: Arc<Document>,
    store: SharedStore,
    runtime: Arc<ExtensionRuntime>,
    pointer_capture: PointerCapture,
    agents: Vec<PageAgent>,
    agent_config: AgentConfig,
    tracer: Option<Arc<TraceLogger>>,
    injection_blocked: bool,
    next_agent_id: u64,
}

impl PageHost {
    pub fn new(document: Document, store: SharedStore) -> Self {
        PageHost {
            document: Arc::new(document),
            store,
            runtime: Arc::new(ExtensionRuntime { generation: 0 }),
            pointer_capture: PointerCapture::new(),
            agents: Vec::new(),
            agent_config: AgentConfig::default(),
            tracer: None,
            injection_blocked: false,
            next_agent_id: 1,
        }
    }

    pub fn with_agent_config(mut self, config: AgentConfig) -> Self {
        self.agent_config = config;
        self
    }

    pub fn with_tracer(mut self, tracer: Arc<TraceLogger>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    // ------------------------------------------------------------------
    // Tab lifecycle
    // ------------------------------------------------------------------

    /// Load a new document. Every attached agent goes with the old one.
    pub fn navigate(&mut self, document: Document) {
        info!(url = ?document.url, "navigating");
        self.agents.clear();
        self.pointer_capture.clear();
        self.document = Arc::new(document);
    }

    /// Replace the extension runtime. Agents injected by the previous one
    /// stay attached but can no longer reach it.
    pub fn reload_extension(&mut self) {
        let generation = self.runtime.generation + 1;
        info!(generation, "extension reloaded");
        self.runtime = Arc::new(ExtensionRuntime { generation });
    }

    /// Pages such as the browser's own settings refuse script injection.
    pub fn set_injection_blocked(&mut self, blocked: bool) {
        self.injection_blocked = blocked;
    }

    /// Attach a page agent unless a live one is already present.
    pub fn inject(&mut self) -> Result<AgentId, ChannelError> {
        if let Some(agent) = self.live_agent() {
            return Ok(agent.id());
        }
        if self.injection_blocked {
            return Err(ChannelError::InjectionFailed(format!(
                "cannot inject into '{}'",
                self.document.url.as_deref().unwrap_or("about:blank")
            )));
        }

        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;

        let agent = PageAgent::start(AgentContext {
            id,
            document: Arc::clone(&self.document),
            store: self.store.clone(),
            runtime: Arc::downgrade(&self.runtime),
            pointer_capture: self.pointer_capture.clone(),
            config: self.agent_config.clone(),
            tracer: self.tracer.clone(),
        })
        .map_err(|e: StoreError| ChannelError::InjectionFailed(e.to_string()))?;

        debug!(agent = id.0, generation = self.runtime.generation, "page agent injected");
        self.agents.push(agent);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Event routing
    // ------------------------------------------------------------------

    /// Run `event` through every agent holding a capturing listener for it.
    pub fn dispatch_pointer(&mut self, event: PointerEvent) -> EventDisposition {
        let mut disposition = EventDisposition::default();
        for agent in &mut self.agents {
            if self.pointer_capture.is_listening(agent.id(), event.kind) {
                disposition.merge(agent.handle_pointer(event));
            }
        }
        self.agents.retain(|a| !a.is_torn_down());
        disposition
    }

    /// Hand a one-shot message to the live agent.
    pub fn deliver(&mut self, message: &AgentMessage) -> Result<(), ChannelError> {
        let agent = self
            .agents
            .iter_mut()
            .find(|a| a.is_live())
            .ok_or(ChannelError::NoReceiver)?;
        agent.handle_message(message);
        Ok(())
    }

    /// Let every agent observe pending store changes.
    pub fn pump(&mut self) {
        for agent in &mut self.agents {
            agent.pump_store();
        }
        self.agents.retain(|a| !a.is_torn_down());
    }

    pub fn tick(&mut self, now: Instant) {
        for agent in &mut self.agents {
            agent.tick(now);
        }
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    pub fn live_agent(&self) -> Option<&PageAgent> {
        self.agents.iter().find(|a| a.is_live())
    }

    pub fn agents(&self) -> &[PageAgent] {
        &self.agents
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn listener_count(&self) -> usize {
        self.pointer_capture.listener_count()
    }

    pub fn cursor_override_active(&self) -> bool {
        self.pointer_capture.cursor_override_active()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}
