use std::fmt;
use std::rc::Rc;

use crate::document::NodeId;

/// What an observer wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObserveOptions {
    /// Report child insertions and removals.
    pub child_list: bool,
    /// Extend observation to every descendant of the target.
    pub subtree: bool,
}

impl ObserveOptions {
    /// Child-list changes anywhere in the subtree.
    pub fn subtree() -> Self {
        Self {
            child_list: true,
            subtree: true,
        }
    }
}

/// One structural change: nodes added to and/or removed from `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// The parent whose child list changed.
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl MutationRecord {
    pub(crate) fn added(target: NodeId, node: NodeId) -> Self {
        Self {
            target,
            added: vec![node],
            removed: Vec::new(),
        }
    }

    pub(crate) fn removed(target: NodeId, node: NodeId) -> Self {
        Self {
            target,
            added: Vec::new(),
            removed: vec![node],
        }
    }
}

/// Callback receiving one batch of records.
pub type MutationCallback = Rc<dyn Fn(&[MutationRecord])>;

/// Handle identifying a connected observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub(crate) u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

pub(crate) struct ObserverEntry {
    pub id: ObserverId,
    pub target: NodeId,
    pub options: ObserveOptions,
    pub callback: MutationCallback,
}
