use std::fmt;
use std::rc::Rc;

use crate::document::NodeId;

/// A named interaction event delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event name, e.g. `"mouseenter"` or `"click"`.
    pub name: String,
    /// Node the event was dispatched at.
    pub target: NodeId,
    /// Node whose listener is currently running. Differs from `target`
    /// while a bubbling event is offered to ancestors.
    pub current_target: NodeId,
}

/// Event listener callback.
pub type Listener = Rc<dyn Fn(&Event)>;

/// Handle identifying a registered listener, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Events that stay on their target instead of propagating to ancestors.
const NON_BUBBLING: &[&str] = &["mouseenter", "mouseleave", "focus", "blur"];

/// Whether an event with this name propagates to ancestors.
pub fn bubbles(name: &str) -> bool {
    !NON_BUBBLING.contains(&name)
}

pub(crate) struct ListenerEntry {
    pub id: ListenerId,
    pub event: String,
    pub listener: Listener,
}
