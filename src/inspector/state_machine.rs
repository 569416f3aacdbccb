use crate::dom::dom_model::NodeId;
use crate::inspector::overlay::OverlayStyle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    Inspecting,
    Locked,
}

/// Page-local inspection state. Node handles never leave the page.
///
/// `previewing` is an override on top of `mode`: while set, the overlay
/// shows that node, and clearing it restores the mode's own visual.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectorState {
    pub mode: Mode,
    pub locked: Option<NodeId>,
    pub hovered: Option<NodeId>,
    pub previewing: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InspectorEvent {
    SetInspecting(bool),
    PointerOver(NodeId),
    PointerOut(NodeId),
    Click(NodeId),
    /// A preview request, already resolved against the document. `None`
    /// covers "no selector", "no match" and "invalid selector" alike.
    Preview(Option<NodeId>),
}

/// Side effects the page agent performs after a transition, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    InstallPointerCapture,
    ReleasePointerCapture,
    PreventDefault,
    StopPropagation,
    Highlight { node: NodeId, style: OverlayStyle },
    HideOverlay,
    RemoveOverlay,
    Capture { target: NodeId },
    Flash { node: NodeId },
}

/// Pure transition function of the inspector.
pub fn transition(state: &InspectorState, event: &InspectorEvent) -> (InspectorState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();
    let inspecting = state.mode == Mode::Inspecting;

    match *event {
        InspectorEvent::SetInspecting(true) => {
            if !inspecting {
                next.mode = Mode::Inspecting;
                next.previewing = None;
                effects.push(Effect::InstallPointerCapture);
                effects.push(Effect::HideOverlay);
            }
        }

        InspectorEvent::SetInspecting(false) => {
            if inspecting {
                next.mode = if state.locked.is_some() { Mode::Locked } else { Mode::Idle };
                next.hovered = None;
                effects.push(Effect::ReleasePointerCapture);
                effects.push(resting_effect(&next));
            }
        }

        InspectorEvent::PointerOver(node) if inspecting => {
            next.hovered = Some(node);
            effects.push(Effect::StopPropagation);
            effects.push(Effect::Highlight {
                node,
                style: OverlayStyle::Hover,
            });
        }

        InspectorEvent::PointerOut(_) if inspecting => {
            effects.push(Effect::StopPropagation);
            effects.push(Effect::HideOverlay);
        }

        InspectorEvent::Click(target) if inspecting => {
            next.mode = Mode::Locked;
            next.locked = Some(target);
            next.hovered = None;
            next.previewing = None;
            effects.extend([
                Effect::PreventDefault,
                Effect::StopPropagation,
                Effect::Capture { target },
                Effect::ReleasePointerCapture,
                Effect::Flash { node: target },
            ]);
        }

        // Pointer events outside inspection belong to the page
        InspectorEvent::PointerOver(_) | InspectorEvent::PointerOut(_) | InspectorEvent::Click(_) => {}

        InspectorEvent::Preview(Some(node)) => {
            next.previewing = Some(node);
            effects.push(Effect::Highlight {
                node,
                style: OverlayStyle::Preview,
            });
        }

        InspectorEvent::Preview(None) => {
            next.previewing = None;
            effects.push(match (state.mode, state.locked) {
                (Mode::Inspecting, _) | (_, None) => Effect::RemoveOverlay,
                (_, Some(node)) => Effect::Highlight {
                    node,
                    style: OverlayStyle::Locked,
                },
            });
        }
    }

    (next, effects)
}

/// The overlay a state shows when nothing transient is on top of it.
pub fn resting_effect(state: &InspectorState) -> Effect {
    match (state.mode, state.locked) {
        (Mode::Inspecting, _) => Effect::HideOverlay,
        (_, Some(node)) => Effect::Highlight {
            node,
            style: OverlayStyle::Locked,
        },
        (_, None) => Effect::RemoveOverlay,
    }
}
