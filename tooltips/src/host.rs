//! Seams between the binding manager and the tree it runs on.
//!
//! The manager only needs to read attributes, walk children, subscribe to
//! named events and (optionally) hear about structural changes. Each of
//! those is a trait here; [`tipdom::Document`] implements all of them.

use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use tipdom::{Document, Event, Listener, ListenerId, MutationRecord, NodeId, ObserveOptions, ObserverId};

/// Read-only view of the tree structure and its attribute store.
pub trait Tree {
    type Node: Copy + Eq + Hash + Debug + 'static;

    /// Only elements can carry attributes and tooltips.
    fn is_element(&self, node: Self::Node) -> bool;

    /// Attribute value stored under `key`, if any.
    fn attribute(&self, node: Self::Node, key: &str) -> Option<String>;

    /// Direct children in document order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;
}

/// An interaction event as seen by a subscribed handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger<'a, N> {
    pub name: &'a str,
    pub target: N,
    /// Node the handler was subscribed on.
    pub current_target: N,
}

pub type Handler<N> = Rc<dyn Fn(&Trigger<'_, N>)>;

/// Subscribe/unsubscribe to named events on a node.
pub trait EventSource: Tree {
    type Subscription: Copy + Eq + Debug + 'static;

    /// Returns `None` if the node cannot receive events.
    fn subscribe(
        &self,
        node: Self::Node,
        event: &str,
        handler: Handler<Self::Node>,
    ) -> Option<Self::Subscription>;

    fn unsubscribe(&self, node: Self::Node, event: &str, subscription: Self::Subscription);
}

/// Nodes added to and removed from one parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation<N> {
    pub added: Vec<N>,
    pub removed: Vec<N>,
}

pub type MutationHandler<N> = Rc<dyn Fn(&[Mutation<N>])>;

/// A live structural watch. No batches are delivered after `disconnect`.
pub trait WatchHandle {
    fn disconnect(&mut self);
}

/// Optional structural observation.
pub trait MutationSource: Tree {
    /// Watch child-list changes anywhere under `root`.
    ///
    /// Returns `None` when the host cannot observe mutations.
    fn watch(
        &self,
        root: Self::Node,
        handler: MutationHandler<Self::Node>,
    ) -> Option<Box<dyn WatchHandle>>;
}

/// Everything the binding manager needs from its host.
pub trait Host: EventSource + MutationSource + Clone + 'static {}

impl<T> Host for T where T: EventSource + MutationSource + Clone + 'static {}

// =============================================================================
// tipdom
// =============================================================================

impl Tree for Document {
    type Node = NodeId;

    fn is_element(&self, node: NodeId) -> bool {
        Document::is_element(self, node)
    }

    fn attribute(&self, node: NodeId, key: &str) -> Option<String> {
        self.data(node, key)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        Document::children(self, node)
    }
}

impl EventSource for Document {
    type Subscription = ListenerId;

    fn subscribe(&self, node: NodeId, event: &str, handler: Handler<NodeId>) -> Option<ListenerId> {
        let listener: Listener = Rc::new(move |event: &Event| {
            handler(&Trigger {
                name: event.name.as_str(),
                target: event.target,
                current_target: event.current_target,
            })
        });
        self.add_listener(node, event, listener).ok()
    }

    fn unsubscribe(&self, node: NodeId, event: &str, subscription: ListenerId) {
        self.remove_listener(node, event, subscription);
    }
}

struct DocumentWatch {
    doc: Document,
    observer: Option<ObserverId>,
}

impl WatchHandle for DocumentWatch {
    fn disconnect(&mut self) {
        if let Some(id) = self.observer.take() {
            self.doc.disconnect(id);
        }
    }
}

impl Drop for DocumentWatch {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl MutationSource for Document {
    fn watch(&self, root: NodeId, handler: MutationHandler<NodeId>) -> Option<Box<dyn WatchHandle>> {
        let callback = Rc::new(move |records: &[MutationRecord]| {
            let batch: Vec<Mutation<NodeId>> = records
                .iter()
                .map(|r| Mutation {
                    added: r.added.clone(),
                    removed: r.removed.clone(),
                })
                .collect();
            handler(&batch);
        });
        let observer = self.observe(root, ObserveOptions::subtree(), callback)?;
        Some(Box::new(DocumentWatch {
            doc: self.clone(),
            observer: Some(observer),
        }))
    }
}
