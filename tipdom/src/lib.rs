//! A small in-memory element tree with data attributes, event listeners
//! and mutation observers.
//!
//! Single-threaded: a [`Document`] is a cheap `Rc` handle, listeners and
//! observer callbacks are invoked without any internal borrow held so they
//! may call back into the document.

pub mod document;
pub mod element;
pub mod error;
pub mod event;
pub mod observer;

pub use document::{Document, NodeId, NodeKind};
pub use element::{find_element, Element};
pub use error::DomError;
pub use event::{bubbles, Event, Listener, ListenerId};
pub use observer::{MutationCallback, MutationRecord, ObserveOptions, ObserverId};
