//! The binding manager.
//!
//! Tracks which nodes under a root carry a tooltip, keeps exactly one pair
//! of event subscriptions per bound node, creates tooltip widgets lazily
//! and routes show/hide events to them.
//!
//! Per-node state lives in a side table owned by the manager, keyed by the
//! node handle, so several managers can share a tree without seeing each
//! other's widgets. Widget methods are always called with no internal
//! borrow held, so a widget may call back into the manager.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, trace, warn};
use uuid::Uuid;

use crate::attributes::{Selector, descendants, read_options};
use crate::config::TooltipsConfig;
use crate::error::{Result, TooltipsError};
use crate::host::{Handler, Host, Trigger, WatchHandle};
use crate::watcher;
use crate::widget::{TooltipFactory, TooltipHandle, TooltipOptions};

/// Unique identifier of a manager instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ManagerId(Uuid);

impl ManagerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ManagerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Show,
    Hide,
    Toggle,
}

/// Side-table entry for one node.
///
/// `subscriptions` is `Some` exactly while the node is bound. A node can
/// have a cached tooltip without being bound when `get` was called on it
/// directly.
struct Entry<H: Host> {
    subscriptions: Option<Vec<(String, H::Subscription)>>,
    tooltip: Option<TooltipHandle<H::Node>>,
}

impl<H: Host> Default for Entry<H> {
    fn default() -> Self {
        Self {
            subscriptions: None,
            tooltip: None,
        }
    }
}

pub(crate) struct State<H: Host> {
    id: ManagerId,
    host: H,
    root: H::Node,
    config: TooltipsConfig,
    selector: Selector,
    factory: Rc<dyn TooltipFactory<H::Node>>,
    option_keys: Vec<String>,
    bound: Vec<H::Node>,
    entries: HashMap<H::Node, Entry<H>>,
    handler: Handler<H::Node>,
    watch: Option<Box<dyn WatchHandle>>,
}

impl<H: Host> State<H> {
    fn is_bound(&self, node: H::Node) -> bool {
        self.entries
            .get(&node)
            .is_some_and(|e| e.subscriptions.is_some())
    }

    fn bind(&mut self, node: H::Node) {
        if self.is_bound(node) {
            trace!("[tooltips {}] {node:?} already bound", self.id);
            return;
        }

        let mut subscriptions = Vec::new();
        for event in self.config.events() {
            match self.host.subscribe(node, event, self.handler.clone()) {
                Some(sub) => subscriptions.push((event.to_string(), sub)),
                None => {
                    warn!("[tooltips {}] {node:?} refused '{event}' subscription", self.id);
                    for (event, sub) in subscriptions {
                        self.host.unsubscribe(node, &event, sub);
                    }
                    return;
                }
            }
        }

        self.entries.entry(node).or_default().subscriptions = Some(subscriptions);
        self.bound.push(node);
        debug!("[tooltips {}] bound {node:?} ({} total)", self.id, self.bound.len());
    }

    /// Drop the binding of `node` and hand back its tooltip so the caller
    /// can destroy it once no borrow is held.
    fn unbind(&mut self, node: H::Node) -> Option<TooltipHandle<H::Node>> {
        let index = self.bound.iter().position(|n| *n == node)?;
        self.bound.remove(index);

        let entry = self.entries.remove(&node)?;
        for (event, sub) in entry.subscriptions.into_iter().flatten() {
            self.host.unsubscribe(node, &event, sub);
        }
        debug!("[tooltips {}] unbound {node:?} ({} left)", self.id, self.bound.len());
        entry.tooltip
    }

    /// Drop the cached tooltip of a node that was never bound.
    fn release_cached(&mut self, node: H::Node) -> Option<TooltipHandle<H::Node>> {
        if self.entries.get(&node)?.subscriptions.is_some() {
            return None;
        }
        let entry = self.entries.remove(&node)?;
        trace!("[tooltips {}] released cached tooltip of {node:?}", self.id);
        entry.tooltip
    }

    /// Unbind every node in a snapshot of the bound list.
    fn unbind_all(&mut self) -> Vec<TooltipHandle<H::Node>> {
        let snapshot = self.bound.clone();
        snapshot.into_iter().filter_map(|n| self.unbind(n)).collect()
    }
}

enum Lookup<H: Host> {
    Cached(TooltipHandle<H::Node>),
    Create {
        content: String,
        options: TooltipOptions,
        factory: Rc<dyn TooltipFactory<H::Node>>,
    },
    Nothing,
}

pub(crate) struct Shared<H: Host> {
    id: ManagerId,
    state: RefCell<Option<State<H>>>,
}

/// Binds tooltips to the nodes of a tree.
///
/// Cloning yields another handle to the same manager.
pub struct Tooltips<H: Host> {
    inner: Rc<Shared<H>>,
}

impl<H: Host> Clone for Tooltips<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: Host> fmt::Debug for Tooltips<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Tooltips");
        s.field("id", &self.inner.id);
        match self.inner.state.try_borrow() {
            Ok(state) => match state.as_ref() {
                Some(state) => s
                    .field("key", &state.config.key)
                    .field("bound", &state.bound.len())
                    .field("watching", &state.watch.is_some()),
                None => s.field("destroyed", &true),
            },
            Err(_) => s.field("busy", &true),
        };
        s.finish()
    }
}

impl<H: Host> Tooltips<H> {
    /// Create a manager over `root`, bind every matching descendant and,
    /// if configured and supported, start watching the subtree.
    pub fn new(
        host: H,
        root: H::Node,
        config: TooltipsConfig,
        factory: impl TooltipFactory<H::Node> + 'static,
    ) -> Result<Self> {
        config.validate()?;

        let id = ManagerId::new();
        let factory: Rc<dyn TooltipFactory<H::Node>> = Rc::new(factory);
        let option_keys: Vec<String> = factory.defaults().keys().map(str::to_string).collect();
        let selector = config.selector();
        let observe = config.observe;

        let inner = Rc::new_cyclic(|weak: &Weak<Shared<H>>| Shared {
            id,
            state: RefCell::new(Some(State {
                id,
                handler: event_handler(weak.clone(), &config),
                host: host.clone(),
                root,
                config,
                selector,
                factory,
                option_keys,
                bound: Vec::new(),
                entries: HashMap::new(),
                watch: None,
            })),
        });
        let tips = Self { inner };
        debug!("[tooltips {id}] created over {root:?}");

        tips.reload()?;

        if observe {
            let handler = watcher::mutation_handler(Rc::downgrade(&tips.inner));
            match host.watch(root, handler) {
                Some(watch) => {
                    debug!("[tooltips {id}] watching mutations");
                    tips.with_state(|state| state.watch = Some(watch))?;
                }
                None => debug!("[tooltips {id}] mutation watching unsupported, use reload()"),
            }
        }

        Ok(tips)
    }

    pub(crate) fn from_shared(inner: Rc<Shared<H>>) -> Self {
        Self { inner }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State<H>) -> R) -> Result<R> {
        let mut guard = self.inner.state.borrow_mut();
        match guard.as_mut() {
            Some(state) => Ok(f(state)),
            None => Err(TooltipsError::Destroyed { id: self.inner.id }),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> ManagerId {
        self.inner.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.state.borrow().is_none()
    }

    pub fn root(&self) -> Result<H::Node> {
        self.with_state(|state| state.root)
    }

    pub fn config(&self) -> Result<TooltipsConfig> {
        self.with_state(|state| state.config.clone())
    }

    pub fn selector(&self) -> Result<Selector> {
        self.with_state(|state| state.selector.clone())
    }

    /// Bound nodes in the order they were bound.
    pub fn bound(&self) -> Result<Vec<H::Node>> {
        self.with_state(|state| state.bound.clone())
    }

    pub fn is_bound(&self, node: H::Node) -> Result<bool> {
        self.with_state(|state| state.is_bound(node))
    }

    pub fn len(&self) -> Result<usize> {
        self.with_state(|state| state.bound.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.with_state(|state| state.bound.is_empty())
    }

    pub fn is_watching(&self) -> Result<bool> {
        self.with_state(|state| state.watch.is_some())
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    pub fn show(&self, node: H::Node) -> Result<()> {
        self.call(node, Action::Show)
    }

    pub fn hide(&self, node: H::Node) -> Result<()> {
        self.call(node, Action::Hide)
    }

    pub fn toggle(&self, node: H::Node) -> Result<()> {
        self.call(node, Action::Toggle)
    }

    fn call(&self, node: H::Node, action: Action) -> Result<()> {
        match self.get(node)? {
            Some(tip) => {
                trace!("[tooltips {}] {action:?} {node:?}", self.inner.id);
                match action {
                    Action::Show => tip.show(),
                    Action::Hide => tip.hide(),
                    Action::Toggle => tip.toggle(),
                }
            }
            None => trace!("[tooltips {}] {action:?} {node:?}: no tooltip", self.inner.id),
        }
        Ok(())
    }

    /// The tooltip of `node`, created from its attributes on first use.
    ///
    /// Returns `None` for non-elements and for nodes without tooltip
    /// content. Once created, the same handle is returned until the node
    /// is unbound.
    pub fn get(&self, node: H::Node) -> Result<Option<TooltipHandle<H::Node>>> {
        let lookup = self.with_state(|state| {
            if !state.host.is_element(node) {
                return Lookup::<H>::Nothing;
            }
            if let Some(tip) = state.entries.get(&node).and_then(|e| e.tooltip.clone()) {
                return Lookup::Cached(tip);
            }
            match state.host.attribute(node, &state.config.key) {
                Some(content) if !content.is_empty() => Lookup::Create {
                    options: read_options(
                        &state.host,
                        node,
                        &state.config.key,
                        &state.config.widget_defaults,
                        &state.option_keys,
                    ),
                    content,
                    factory: state.factory.clone(),
                },
                _ => Lookup::Nothing,
            }
        })?;

        let (content, options, factory) = match lookup {
            Lookup::Cached(tip) => return Ok(Some(tip)),
            Lookup::Nothing => return Ok(None),
            Lookup::Create {
                content,
                options,
                factory,
            } => (content, options, factory),
        };

        let mut widget = factory.create(&content, options);
        widget.attach(node);
        let created = TooltipHandle::new(widget);

        // A re-entrant call may have created one in the meantime; keep the
        // first and discard ours.
        let stored = self.with_state(|state| {
            let entry = state.entries.entry(node).or_default();
            match &entry.tooltip {
                Some(existing) => (existing.clone(), true),
                None => {
                    entry.tooltip = Some(created.clone());
                    debug!("[tooltips {}] created tooltip for {node:?}", state.id);
                    (created.clone(), false)
                }
            }
        });

        match stored {
            Ok((tip, discard)) => {
                if discard {
                    created.destroy();
                }
                Ok(Some(tip))
            }
            Err(err) => {
                created.destroy();
                Err(err)
            }
        }
    }

    // =========================================================================
    // Binding
    // =========================================================================

    /// Bind `node` if it carries the attribute, otherwise every matching
    /// descendant. Non-elements are ignored.
    pub fn add(&self, node: H::Node) -> Result<()> {
        self.with_state(|state| {
            if !state.host.is_element(node) {
                trace!("[tooltips {}] add({node:?}) ignored: not an element", state.id);
                return;
            }
            if state.selector.matches(&state.host, node) {
                state.bind(node);
            } else {
                for found in state.selector.select_all(&state.host, node) {
                    state.bind(found);
                }
            }
        })
    }

    /// Unbind `node` if it is bound, otherwise every bound descendant.
    /// Tooltips cached by [`get`](Tooltips::get) on unbound nodes in the
    /// subtree are released too. Non-elements are ignored.
    pub fn remove(&self, node: H::Node) -> Result<()> {
        let released = self.with_state(|state| -> Vec<TooltipHandle<H::Node>> {
            if !state.host.is_element(node) {
                trace!("[tooltips {}] remove({node:?}) ignored: not an element", state.id);
                return Vec::new();
            }
            if state.is_bound(node) {
                return state.unbind(node).into_iter().collect();
            }
            let mut released: Vec<_> = state.release_cached(node).into_iter().collect();
            for inside in descendants(&state.host, node) {
                let tooltip = if state.is_bound(inside) {
                    state.unbind(inside)
                } else {
                    state.release_cached(inside)
                };
                released.extend(tooltip);
            }
            released
        })?;
        destroy_all(released);
        Ok(())
    }

    /// Unbind everything, then bind every matching descendant of the root
    /// again.
    pub fn reload(&self) -> Result<()> {
        let released = self.with_state(|state| {
            let released = state.unbind_all();
            for found in state.selector.select_all(&state.host, state.root) {
                state.bind(found);
            }
            debug!("[tooltips {}] reloaded: {} bound", state.id, state.bound.len());
            released
        })?;
        destroy_all(released);
        Ok(())
    }

    /// Unbind everything, destroy every created tooltip and stop watching.
    ///
    /// Every later call on this manager, including a second `destroy`,
    /// returns [`TooltipsError::Destroyed`].
    pub fn destroy(&self) -> Result<()> {
        let taken = self.inner.state.borrow_mut().take();
        let Some(mut state) = taken else {
            return Err(TooltipsError::Destroyed { id: self.inner.id });
        };

        let mut released = state.unbind_all();
        released.extend(state.entries.drain().filter_map(|(_, e)| e.tooltip));
        if let Some(mut watch) = state.watch.take() {
            watch.disconnect();
        }
        debug!("[tooltips {}] destroyed, releasing {} tooltip(s)", state.id, released.len());
        drop(state);

        destroy_all(released);
        Ok(())
    }
}

fn destroy_all<N>(tooltips: Vec<TooltipHandle<N>>) {
    for tip in tooltips {
        tip.destroy();
    }
}

/// The single handler shared by every subscription of one manager.
fn event_handler<H: Host>(weak: Weak<Shared<H>>, config: &TooltipsConfig) -> Handler<H::Node> {
    let show_on = config.show_on.clone();
    let toggles = config.toggles();

    Rc::new(move |trigger: &Trigger<'_, H::Node>| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let tips = Tooltips::from_shared(inner);
        let node = trigger.current_target;

        let result = if toggles {
            tips.toggle(node)
        } else if trigger.name == show_on {
            tips.show(node)
        } else {
            tips.hide(node)
        };

        if let Err(err) = result {
            debug!("'{}' on {node:?} dropped: {err}", trigger.name);
        }
    })
}
