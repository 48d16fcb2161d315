//! Session state and its transition rules.
//!
//! `SessionState` carries the data each state needs; `SessionStatus` is the
//! payload-free discriminant that owns the state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CoreError;
use crate::identity::Identity;
use crate::profile::ProfileDocument;
use crate::route::Route;

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Status of the visitor's session.
///
/// ```text
/// unauthenticated → resolving → authenticated_no_profile
///                             → authenticated_with_profile
///                             → resolution_failed → resolving (retry)
/// any             → unauthenticated (sign-out)
/// any             → resolving (fresh identity event)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Unauthenticated,
    Resolving,
    AuthenticatedNoProfile,
    AuthenticatedWithProfile,
    ResolutionFailed,
}

impl SessionStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Unauthenticated => &[Self::Unauthenticated, Self::Resolving],
            Self::Resolving => &[
                Self::Resolving,
                Self::Unauthenticated,
                Self::AuthenticatedNoProfile,
                Self::AuthenticatedWithProfile,
                Self::ResolutionFailed,
            ],
            Self::AuthenticatedNoProfile
            | Self::AuthenticatedWithProfile
            | Self::ResolutionFailed => &[Self::Resolving, Self::Unauthenticated],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether resolution has settled for the current event.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Resolving)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Resolving => "resolving",
            Self::AuthenticatedNoProfile => "authenticated_no_profile",
            Self::AuthenticatedWithProfile => "authenticated_with_profile",
            Self::ResolutionFailed => "resolution_failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Resolved session state for one page instance. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    /// Identity known, profile existence check in flight.
    Resolving { identity: Identity },
    AuthenticatedNoProfile { identity: Identity },
    AuthenticatedWithProfile {
        identity: Identity,
        profile: ProfileDocument,
    },
    /// The profile store could not be reached. Never treated as signed out.
    ResolutionFailed { identity: Identity, reason: String },
}

impl SessionState {
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        match self {
            Self::Unauthenticated => SessionStatus::Unauthenticated,
            Self::Resolving { .. } => SessionStatus::Resolving,
            Self::AuthenticatedNoProfile { .. } => SessionStatus::AuthenticatedNoProfile,
            Self::AuthenticatedWithProfile { .. } => SessionStatus::AuthenticatedWithProfile,
            Self::ResolutionFailed { .. } => SessionStatus::ResolutionFailed,
        }
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Unauthenticated => None,
            Self::Resolving { identity }
            | Self::AuthenticatedNoProfile { identity }
            | Self::AuthenticatedWithProfile { identity, .. }
            | Self::ResolutionFailed { identity, .. } => Some(identity),
        }
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&ProfileDocument> {
        match self {
            Self::AuthenticatedWithProfile { profile, .. } => Some(profile),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Where a protected page must send the visitor in this state, if anywhere.
    #[must_use]
    pub const fn redirect_target(&self) -> Option<Route> {
        match self {
            Self::Unauthenticated => Some(Route::Login),
            Self::AuthenticatedNoProfile { .. } => Some(Route::CreateUser),
            Self::Resolving { .. }
            | Self::AuthenticatedWithProfile { .. }
            | Self::ResolutionFailed { .. } => None,
        }
    }

    /// Check that moving from `self` to `next` is a legal transition.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` when the state machine forbids it.
    pub fn check_transition(&self, next: &Self) -> Result<(), CoreError> {
        let (from, to) = (self.status(), next.status());
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition { from, to })
        }
    }
}
