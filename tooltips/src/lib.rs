//! Tooltip bindings for element trees.
//!
//! A [`Tooltips`] manager scans a subtree for elements carrying a data
//! attribute (by default `tooltip`), subscribes them to show/hide events,
//! lazily creates one tooltip widget per element from the attribute
//! content, and keeps all of that in sync as the tree changes.
//!
//! ```ignore
//! let doc = Document::new();
//! let tips = Tooltips::new(doc.clone(), doc.root(), TooltipsConfig::new().key("tip"), factory)?;
//! doc.dispatch(node, "mouseenter"); // shows the tooltip of `node`
//! ```

pub mod attributes;
pub mod config;
pub mod error;
pub mod host;
pub mod manager;
pub mod watcher;
pub mod widget;

pub use attributes::{Selector, option_attribute};
pub use config::TooltipsConfig;
pub use error::{Result, TooltipsError};
pub use host::{EventSource, Handler, Host, Mutation, MutationHandler, MutationSource, Tree, Trigger, WatchHandle};
pub use manager::{ManagerId, Tooltips};
pub use widget::{
    FnFactory, STANDARD_OPTION_KEYS, Tooltip, TooltipFactory, TooltipHandle, TooltipOptions,
    standard_defaults,
};
