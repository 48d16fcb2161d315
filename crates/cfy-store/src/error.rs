use std::time::Duration;

use thiserror::Error;

/// Errors from profile store calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backend answered with an error or could not be reached.
    #[error("profile store backend error: {0}")]
    Backend(String),

    /// The call exceeded its deadline.
    #[error("profile store call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The backend answered with a document this crate cannot read.
    #[error("profile document decode failed: {0}")]
    Decode(String),

    /// The backend refused the caller's credentials.
    #[error("profile store rejected credentials: {0}")]
    Unauthorized(String),
}

impl StoreError {
    /// Errors that may clear up on their own and are worth retrying.
    ///
    /// Rejected credentials and undecodable documents will fail the same way
    /// on every attempt.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Timeout(_))
    }
}
