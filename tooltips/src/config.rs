//! Binding manager configuration.

use serde::Deserialize;

use crate::attributes::Selector;
use crate::error::{Result, TooltipsError};
use crate::widget::TooltipOptions;

/// Configuration of one [`Tooltips`](crate::Tooltips) manager.
///
/// Deserializing fills missing fields from the defaults. The merge is
/// shallow: a `widgetDefaults` map, when given, replaces the default map
/// as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TooltipsConfig {
    /// Options handed to every created tooltip before per-node overrides.
    #[serde(alias = "tooltip")]
    pub widget_defaults: TooltipOptions,

    /// Data attribute holding the tooltip content, e.g. `tooltip` for
    /// `data-tooltip`.
    #[serde(alias = "attributeKey")]
    pub key: String,

    /// Event that shows the tooltip.
    #[serde(alias = "showEvent")]
    pub show_on: String,

    /// Event that hides the tooltip. When equal to `show_on` the event
    /// toggles instead.
    #[serde(alias = "hideEvent")]
    pub hide_on: String,

    /// Follow structural changes under the root. Ignored on hosts that
    /// cannot observe mutations.
    #[serde(alias = "watchMutations")]
    pub observe: bool,
}

impl Default for TooltipsConfig {
    fn default() -> Self {
        Self {
            widget_defaults: TooltipOptions::default(),
            key: "tooltip".to_string(),
            show_on: "mouseenter".to_string(),
            hide_on: "mouseleave".to_string(),
            observe: false,
        }
    }
}

impl TooltipsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content attribute key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn show_on(mut self, event: impl Into<String>) -> Self {
        self.show_on = event.into();
        self
    }

    pub fn hide_on(mut self, event: impl Into<String>) -> Self {
        self.hide_on = event.into();
        self
    }

    /// Use a single event that toggles the tooltip.
    pub fn toggle_on(self, event: impl Into<String>) -> Self {
        let event = event.into();
        self.show_on(event.clone()).hide_on(event)
    }

    /// Enable mutation watching.
    pub fn observe(mut self, observe: bool) -> Self {
        self.observe = observe;
        self
    }

    pub fn widget_defaults(mut self, defaults: TooltipOptions) -> Self {
        self.widget_defaults = defaults;
        self
    }

    /// Whether show and hide are the same event.
    pub fn toggles(&self) -> bool {
        self.show_on == self.hide_on
    }

    /// Events a bound node is subscribed to, without duplicates.
    pub fn events(&self) -> Vec<&str> {
        if self.toggles() {
            vec![self.show_on.as_str()]
        } else {
            vec![self.show_on.as_str(), self.hide_on.as_str()]
        }
    }

    pub fn selector(&self) -> Selector {
        Selector::new(self.key.clone())
    }

    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(TooltipsError::InvalidConfig("attribute key is empty".into()));
        }
        if self.show_on.is_empty() || self.hide_on.is_empty() {
            return Err(TooltipsError::InvalidConfig("event name is empty".into()));
        }
        Ok(())
    }
}
