use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace, warn};

use crate::element::Element;
use crate::error::DomError;
use crate::event::{bubbles, Event, Listener, ListenerEntry, ListenerId};
use crate::observer::{MutationCallback, MutationRecord, ObserveOptions, ObserverEntry, ObserverId};

/// Handle to a node living in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    #[default]
    Element,
    Text,
    Comment,
}

struct NodeData {
    kind: NodeKind,
    id: String,
    tag: String,
    text: Option<String>,
    data: HashMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<ListenerEntry>,
}

struct Inner {
    nodes: Vec<NodeData>,
    root: NodeId,
    observers: Vec<ObserverEntry>,
    observers_supported: bool,
    next_listener: u64,
    next_observer: u64,
    batch_depth: usize,
    delivering: bool,
    pending: Vec<(ObserverId, MutationRecord)>,
}

impl Inner {
    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.0)
    }

    fn check(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.node(id).ok_or(DomError::UnknownNode(id))
    }

    /// Inclusive ancestry check.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn build(&mut self, element: Element, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let data = if element.kind == NodeKind::Element {
            element.data
        } else {
            HashMap::new()
        };
        self.nodes.push(NodeData {
            kind: element.kind,
            id: element.id,
            tag: element.tag,
            text: element.text,
            data,
            parent,
            children: Vec::new(),
            listeners: Vec::new(),
        });

        if element.kind == NodeKind::Element {
            let children: Vec<NodeId> = element
                .children
                .into_iter()
                .map(|child| self.build(child, Some(id)))
                .collect();
            self.nodes[id.0].children = children;
        }
        id
    }

    /// Queue a record for every observer watching the mutated parent.
    fn record(&mut self, record: MutationRecord) {
        let matching: Vec<ObserverId> = self
            .observers
            .iter()
            .filter(|o| o.options.child_list)
            .filter(|o| {
                o.target == record.target
                    || (o.options.subtree && self.contains(o.target, record.target))
            })
            .map(|o| o.id)
            .collect();

        for id in matching {
            self.pending.push((id, record.clone()));
        }
    }

    fn detach(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.node_mut(node)?.parent.take()?;
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != node);
        }
        self.record(MutationRecord::removed(parent, node));
        Some(parent)
    }
}

/// Shared handle to an element tree.
///
/// Cloning is cheap and every clone refers to the same tree. Nodes are
/// never freed: a removed node keeps its subtree and data and can be
/// inserted again.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<Inner>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("nodes", &inner.nodes.len())
            .field("observers", &inner.observers.len())
            .finish()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut inner = Inner {
            nodes: Vec::new(),
            root: NodeId(0),
            observers: Vec::new(),
            observers_supported: true,
            next_listener: 0,
            next_observer: 0,
            batch_depth: 0,
            delivering: false,
            pending: Vec::new(),
        };
        inner.root = inner.build(Element::new("#document").id("document"), None);
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// A document whose host cannot observe mutations; `observe` always
    /// returns `None`.
    pub fn without_observers() -> Self {
        let doc = Self::new();
        doc.inner.borrow_mut().observers_supported = false;
        doc
    }

    pub fn root(&self) -> NodeId {
        self.inner.borrow().root
    }

    /// Whether two handles refer to the same tree.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Build a detached subtree and return its root.
    pub fn create(&self, element: Element) -> NodeId {
        self.inner.borrow_mut().build(element, None)
    }

    /// Build a subtree and append it to `parent`.
    pub fn append(&self, parent: NodeId, element: Element) -> Result<NodeId, DomError> {
        let node = self.create(element);
        self.append_child(parent, node)?;
        Ok(node)
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference`, or at the end.
    /// A child that is already attached somewhere is moved.
    pub fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.check(parent)?.kind != NodeKind::Element {
                return Err(DomError::NotAContainer(parent));
            }
            inner.check(child)?;
            if inner.contains(child, parent) {
                return Err(DomError::HierarchyRequest { parent, child });
            }
            if let Some(reference) = reference {
                if inner.check(reference)?.parent != Some(parent) {
                    return Err(DomError::NotAChild { parent, reference });
                }
                if reference == child {
                    return Ok(());
                }
            }

            inner.detach(child);

            let siblings = &inner.nodes[parent.0].children;
            let index = reference
                .and_then(|r| siblings.iter().position(|c| *c == r))
                .unwrap_or(siblings.len());
            inner.nodes[parent.0].children.insert(index, child);
            inner.nodes[child.0].parent = Some(parent);
            inner.record(MutationRecord::added(parent, child));
            trace!("inserted {child} into {parent} at {index}");
        }
        self.flush();
        Ok(())
    }

    /// Detach a node from its parent. Returns false when it was already
    /// detached.
    pub fn remove(&self, node: NodeId) -> Result<bool, DomError> {
        let detached = {
            let mut inner = self.inner.borrow_mut();
            inner.check(node)?;
            inner.detach(node)
        };
        self.flush();
        Ok(detached.is_some())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().node(node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// All descendants in document (pre-)order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = inner
            .node(node)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = inner.node(id) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    /// Inclusive: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.inner.borrow().contains(ancestor, node)
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let inner = self.inner.borrow();
        inner.contains(inner.root, node)
    }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.inner.borrow().node(node).map(|n| n.kind)
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Element)
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.inner.borrow().node(node).map(|n| n.tag.clone())
    }

    pub fn text(&self, node: NodeId) -> Option<String> {
        self.inner.borrow().node(node).and_then(|n| n.text.clone())
    }

    /// Find an attached element by its string id.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        let root = self.root();
        std::iter::once(root)
            .chain(self.descendants(root))
            .find(|n| self.inner.borrow().node(*n).is_some_and(|d| d.id == id))
    }

    // =========================================================================
    // Data attributes
    // =========================================================================

    pub fn data(&self, node: NodeId, key: &str) -> Option<String> {
        self.inner
            .borrow()
            .node(node)
            .and_then(|n| n.data.get(key).cloned())
    }

    /// Set a data attribute. Returns false for non-elements.
    pub fn set_data(&self, node: NodeId, key: impl Into<String>, value: impl Into<String>) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.node_mut(node) {
            Some(n) if n.kind == NodeKind::Element => {
                n.data.insert(key.into(), value.into());
                true
            }
            _ => {
                warn!("set_data on {node} ignored: not an element");
                false
            }
        }
    }

    pub fn remove_data(&self, node: NodeId, key: &str) -> Option<String> {
        self.inner
            .borrow_mut()
            .node_mut(node)
            .and_then(|n| n.data.remove(key))
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn add_listener(
        &self,
        node: NodeId,
        event: impl Into<String>,
        listener: Listener,
    ) -> Result<ListenerId, DomError> {
        let mut inner = self.inner.borrow_mut();
        inner.check(node)?;
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        let event = event.into();
        trace!("{id} added on {node} for '{event}'");
        inner.nodes[node.0].listeners.push(ListenerEntry {
            id,
            event,
            listener,
        });
        Ok(id)
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, node: NodeId, event: &str, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(n) = inner.node_mut(node) else {
            return false;
        };
        let before = n.listeners.len();
        n.listeners.retain(|l| !(l.id == id && l.event == event));
        before != n.listeners.len()
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.inner
            .borrow()
            .node(node)
            .map_or(0, |n| n.listeners.len())
    }

    pub fn listener_count_for(&self, node: NodeId, event: &str) -> usize {
        self.inner
            .borrow()
            .node(node)
            .map_or(0, |n| n.listeners.iter().filter(|l| l.event == event).count())
    }

    fn has_listener(&self, node: NodeId, id: ListenerId) -> bool {
        self.inner
            .borrow()
            .node(node)
            .is_some_and(|n| n.listeners.iter().any(|l| l.id == id))
    }

    /// Fire a named event at `target` and return how many listeners ran.
    ///
    /// Listeners run in registration order. Bubbling events continue to
    /// each ancestor. A listener removed by an earlier listener in the same
    /// dispatch does not run.
    pub fn dispatch(&self, target: NodeId, name: &str) -> usize {
        let path: Vec<NodeId> = {
            let inner = self.inner.borrow();
            if inner.node(target).is_none() {
                warn!("dispatch of '{name}' to unknown {target}");
                return 0;
            }
            if bubbles(name) {
                let mut path = vec![target];
                let mut current = inner.nodes[target.0].parent;
                while let Some(id) = current {
                    path.push(id);
                    current = inner.nodes[id.0].parent;
                }
                path
            } else {
                vec![target]
            }
        };

        let mut invoked = 0;
        for current in path {
            let listeners: Vec<(ListenerId, Listener)> = self
                .inner
                .borrow()
                .nodes[current.0]
                .listeners
                .iter()
                .filter(|l| l.event == name)
                .map(|l| (l.id, l.listener.clone()))
                .collect();

            for (id, listener) in listeners {
                if !self.has_listener(current, id) {
                    continue;
                }
                let event = Event {
                    name: name.to_string(),
                    target,
                    current_target: current,
                };
                listener(&event);
                invoked += 1;
            }
        }
        trace!("dispatched '{name}' at {target}: {invoked} listener(s)");
        invoked
    }

    // =========================================================================
    // Mutation observers
    // =========================================================================

    /// Start observing structural changes under `target`.
    ///
    /// Returns `None` when the document does not support observation or the
    /// target is unknown.
    pub fn observe(
        &self,
        target: NodeId,
        options: ObserveOptions,
        callback: MutationCallback,
    ) -> Option<ObserverId> {
        let mut inner = self.inner.borrow_mut();
        if !inner.observers_supported {
            debug!("mutation observation unsupported");
            return None;
        }
        inner.node(target)?;
        let id = ObserverId(inner.next_observer);
        inner.next_observer += 1;
        inner.observers.push(ObserverEntry {
            id,
            target,
            options,
            callback,
        });
        debug!("{id} observing {target} ({options:?})");
        Some(id)
    }

    /// Stop an observer, discarding records not yet delivered to it.
    pub fn disconnect(&self, id: ObserverId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.observers.len();
        inner.observers.retain(|o| o.id != id);
        inner.pending.retain(|(o, _)| *o != id);
        let removed = before != inner.observers.len();
        if removed {
            debug!("{id} disconnected");
        }
        removed
    }

    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// Run `f` with mutation delivery held back; every record produced
    /// inside is delivered as one batch when the outermost batch ends.
    pub fn batch<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        self.inner.borrow_mut().batch_depth += 1;
        let result = f(self);
        self.inner.borrow_mut().batch_depth -= 1;
        self.flush();
        result
    }

    fn flush(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.batch_depth > 0 || inner.delivering {
                return;
            }
            inner.delivering = true;
        }

        // Records produced by callbacks are queued and delivered in a
        // later round, never interleaved with the current one.
        loop {
            let pending = std::mem::take(&mut self.inner.borrow_mut().pending);
            if pending.is_empty() {
                break;
            }

            let mut batches: Vec<(ObserverId, Vec<MutationRecord>)> = Vec::new();
            for (id, record) in pending {
                match batches.iter_mut().find(|(o, _)| *o == id) {
                    Some((_, records)) => records.push(record),
                    None => batches.push((id, vec![record])),
                }
            }

            for (id, records) in batches {
                let callback = self
                    .inner
                    .borrow()
                    .observers
                    .iter()
                    .find(|o| o.id == id)
                    .map(|o| o.callback.clone());
                if let Some(callback) = callback {
                    trace!("{id} receives {} record(s)", records.len());
                    callback(&records);
                }
            }
        }

        self.inner.borrow_mut().delivering = false;
    }
}
