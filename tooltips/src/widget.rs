//! The tooltip widget contract.
//!
//! Rendering and positioning belong to the widget; the manager only creates
//! widgets, forwards show/hide/toggle and destroys them.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use log::trace;
use serde::Deserialize;

/// Option names understood by the standard tooltip widget family.
pub const STANDARD_OPTION_KEYS: &[&str] = &[
    "baseClass",
    "typeClass",
    "effectClass",
    "inClass",
    "place",
    "spacing",
    "auto",
];

/// Default values for [`STANDARD_OPTION_KEYS`].
pub fn standard_defaults() -> TooltipOptions {
    TooltipOptions::new()
        .with("baseClass", "tooltip")
        .with("typeClass", "")
        .with("effectClass", "")
        .with("inClass", "in")
        .with("place", "top")
        .with("spacing", "")
        .with("auto", "0")
}

/// String-valued widget options, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct TooltipOptions(BTreeMap<String, String>);

impl TooltipOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A copy of `self` with every entry of `overrides` applied on top.
    pub fn merged_with(&self, overrides: &TooltipOptions) -> TooltipOptions {
        let mut merged = self.clone();
        for (key, value) in overrides.iter() {
            merged.set(key, value);
        }
        merged
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TooltipOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A tooltip attached to one node of type `N`.
pub trait Tooltip<N> {
    fn show(&mut self);

    fn hide(&mut self);

    fn is_visible(&self) -> bool;

    fn toggle(&mut self) {
        if self.is_visible() {
            self.hide();
        } else {
            self.show();
        }
    }

    /// Release everything the widget holds. Called once, when its node is
    /// unbound or the manager is destroyed.
    fn destroy(&mut self);

    /// Recompute placement after the anchor moved.
    fn reposition(&mut self) {}

    /// Called right after creation with the node the tooltip belongs to.
    fn attach(&mut self, anchor: N) {
        let _ = anchor;
    }
}

/// Creates tooltips and declares which options they understand.
pub trait TooltipFactory<N> {
    /// The widget's default option mapping. Its key set decides which
    /// per-node override attributes are read.
    fn defaults(&self) -> TooltipOptions;

    fn create(&self, content: &str, options: TooltipOptions) -> Box<dyn Tooltip<N>>;
}

/// A [`TooltipFactory`] made of a defaults map and a constructor closure.
pub struct FnFactory<F> {
    defaults: TooltipOptions,
    create: F,
}

impl<F> FnFactory<F> {
    pub fn new(defaults: TooltipOptions, create: F) -> Self {
        Self { defaults, create }
    }
}

impl<N, F> TooltipFactory<N> for FnFactory<F>
where
    F: Fn(&str, TooltipOptions) -> Box<dyn Tooltip<N>>,
{
    fn defaults(&self) -> TooltipOptions {
        self.defaults.clone()
    }

    fn create(&self, content: &str, options: TooltipOptions) -> Box<dyn Tooltip<N>> {
        (self.create)(content, options)
    }
}

struct Slot<N> {
    widget: RefCell<Box<dyn Tooltip<N>>>,
    destroyed: Cell<bool>,
    /// Destruction requested while the widget was busy.
    doomed: Cell<bool>,
}

/// Shared handle to a created tooltip.
///
/// Handles compare by identity with [`ptr_eq`](TooltipHandle::ptr_eq).
/// Calls made while the widget is already busy (a re-entrant call from
/// inside one of its own methods) and calls after destruction do nothing.
/// A destroy requested while busy runs as soon as the outer call returns.
pub struct TooltipHandle<N> {
    slot: Rc<Slot<N>>,
}

impl<N> Clone for TooltipHandle<N> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<N> fmt::Debug for TooltipHandle<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TooltipHandle")
            .field("visible", &self.is_visible())
            .field("destroyed", &self.slot.destroyed.get())
            .finish()
    }
}

impl<N> TooltipHandle<N> {
    pub(crate) fn new(widget: Box<dyn Tooltip<N>>) -> Self {
        Self {
            slot: Rc::new(Slot {
                widget: RefCell::new(widget),
                destroyed: Cell::new(false),
                doomed: Cell::new(false),
            }),
        }
    }

    fn with_widget(&self, op: &str, f: impl FnOnce(&mut dyn Tooltip<N>)) {
        if self.slot.destroyed.get() {
            trace!("{op} on destroyed tooltip ignored");
            return;
        }
        match self.slot.widget.try_borrow_mut() {
            Ok(mut widget) => f(&mut **widget),
            Err(_) => {
                trace!("re-entrant {op} ignored");
                return;
            }
        }
        if self.slot.doomed.get() {
            self.destroy();
        }
    }

    pub fn show(&self) {
        self.with_widget("show", |w| w.show());
    }

    pub fn hide(&self) {
        self.with_widget("hide", |w| w.hide());
    }

    pub fn toggle(&self) {
        self.with_widget("toggle", |w| w.toggle());
    }

    pub fn reposition(&self) {
        self.with_widget("reposition", |w| w.reposition());
    }

    pub fn is_visible(&self) -> bool {
        !self.slot.destroyed.get()
            && self
                .slot
                .widget
                .try_borrow()
                .is_ok_and(|widget| widget.is_visible())
    }

    pub fn is_destroyed(&self) -> bool {
        self.slot.destroyed.get()
    }

    pub fn ptr_eq(&self, other: &TooltipHandle<N>) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }

    /// Destroy the widget exactly once.
    pub(crate) fn destroy(&self) {
        if self.slot.destroyed.get() {
            return;
        }
        match self.slot.widget.try_borrow_mut() {
            Ok(mut widget) => {
                self.slot.destroyed.set(true);
                self.slot.doomed.set(false);
                widget.destroy();
            }
            Err(_) => self.slot.doomed.set(true),
        }
    }
}
