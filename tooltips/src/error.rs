//! Error types for the binding manager.

use thiserror::Error;

use crate::manager::ManagerId;

/// Errors returned by [`Tooltips`](crate::Tooltips) operations.
///
/// Invalid nodes and nodes without tooltip content are not errors; those
/// calls succeed and do nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TooltipsError {
    /// The manager was destroyed and can no longer be used.
    #[error("Tooltips instance {id} has been destroyed")]
    Destroyed { id: ManagerId },

    /// The configuration cannot produce a working manager.
    #[error("Invalid tooltips configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TooltipsError>;
