use serde::{Deserialize, Serialize};

/// One-shot command from the control panel to the page agent.
///
/// Wire form: `{"action": "toggleBox", "value": true}` and
/// `{"action": "highlightSelector", "value": "<selector>" | null}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum AgentMessage {
    ToggleBox(bool),
    /// `None` asks the agent to fall back to its locked or idle visual.
    HighlightSelector(Option<String>),
}
