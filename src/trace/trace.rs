use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::inspector::{
    pointer::AgentId,
    state_machine::{Effect, InspectorEvent, Mode},
};

/// One inspector transition, written as a JSONL line.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub step: u64,
    pub agent: u64,

    pub mode_before: String,
    pub mode_after: Option<String>,

    pub event: Option<String>,
    pub effects: Vec<String>,

    pub note: Option<String>,
}

impl TraceEvent {
    pub fn now(step: u64, agent: AgentId, mode: Mode) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            step,
            agent: agent.0,
            mode_before: format!("{:?}", mode),
            mode_after: None,
            event: None,
            effects: vec![],
            note: None,
        }
    }

    pub fn with_event(mut self, event: &InspectorEvent) -> Self {
        self.event = Some(format!("{:?}", event));
        self
    }

    pub fn with_outcome(mut self, mode: Mode, effects: &[Effect]) -> Self {
        self.mode_after = Some(format!("{:?}", mode));
        self.effects = effects.iter().map(|e| format!("{:?}", e)).collect();
        self
    }

    pub fn with_note(mut self, note: impl ToString) -> Self {
        self.note = Some(note.to_string());
        self
    }
}
