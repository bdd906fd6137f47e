use std::collections::HashMap;

use crate::dom::NodeId;

/// Where a listener is attached: the window or a node of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Window,
    Node(NodeId),
}

/// What a listener does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Handler {
    DropdownToggle,
    DropdownCloseOutside,
}

impl Handler {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::DropdownToggle => "dropdown-toggle",
            Self::DropdownCloseOutside => "dropdown-close-outside",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Listener {
    pub(crate) capture: bool,
    pub(crate) handler: Handler,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<EventTarget, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    /// Registers a listener; an identical registration is ignored, as
    /// `addEventListener` does.
    pub(crate) fn add(&mut self, target: EventTarget, event: &str, listener: Listener) -> bool {
        let listeners = self
            .map
            .entry(target)
            .or_default()
            .entry(event.to_string())
            .or_default();
        if listeners.contains(&listener) {
            return false;
        }
        listeners.push(listener);
        true
    }

    pub(crate) fn get(&self, target: EventTarget, event: &str, capture: bool) -> Vec<Listener> {
        self.map
            .get(&target)
            .and_then(|events| events.get(event))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.capture == capture)
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, target: EventTarget, event: &str) -> usize {
        self.map
            .get(&target)
            .and_then(|events| events.get(event))
            .map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EventPhase {
    Capturing,
    AtTarget,
    Bubbling,
}

impl EventPhase {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Capturing => "capture",
            Self::AtTarget => "target",
            Self::Bubbling => "bubble",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EventState {
    pub(crate) event_type: String,
    pub(crate) target: NodeId,
    pub(crate) current_target: EventTarget,
    pub(crate) phase: EventPhase,
}

impl EventState {
    pub(crate) fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: EventTarget::Node(target),
            phase: EventPhase::AtTarget,
        }
    }
}
