//! Cross-cutting error types for Compifly.
//!
//! Domain-specific errors (`AuthError`, `StoreError`) are defined in their
//! respective crates. The CLI converges everything through `anyhow`.

use thiserror::Error;

use crate::session::SessionStatus;

/// Errors that can be raised by any Compifly crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A session state transition was attempted that is not allowed.
    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
}
