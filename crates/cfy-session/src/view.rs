//! What a page shell renders for a given session state.

use cfy_core::{Identity, ProfileDocument, Route, SessionState};
use serde::Serialize;

/// Profile card data for the signed-in visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    /// Provider display name, falling back to the profile username.
    pub display_name: String,
    pub photo_url: Option<String>,
    /// `@username`.
    pub handle: String,
    /// `(judge, handle)` pairs for the linked judge accounts.
    pub linked: Vec<(String, String)>,
}

impl ProfileView {
    #[must_use]
    pub fn new(identity: &Identity, profile: &ProfileDocument) -> Self {
        let display_name = identity
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&profile.username)
            .to_string();
        Self {
            display_name,
            photo_url: identity.photo_url.clone(),
            handle: profile.handle_label(),
            linked: profile
                .linked_handles()
                .into_iter()
                .map(|(judge, handle)| (judge.to_string(), handle.to_string()))
                .collect(),
        }
    }
}

/// A protected page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PageView {
    /// Leave the page; the resolver has already issued the navigation.
    Redirect { route: Route },
    Loading,
    Content(ProfileView),
    /// The store could not be reached. Offer a retry instead of a redirect.
    Failed { reason: String, retryable: bool },
}

impl PageView {
    #[must_use]
    pub fn for_state(state: &SessionState) -> Self {
        match state {
            SessionState::Unauthenticated => Self::Redirect {
                route: Route::Login,
            },
            SessionState::Resolving { .. } => Self::Loading,
            SessionState::AuthenticatedNoProfile { .. } => Self::Redirect {
                route: Route::CreateUser,
            },
            SessionState::AuthenticatedWithProfile { identity, profile } => {
                Self::Content(ProfileView::new(identity, profile))
            }
            SessionState::ResolutionFailed { reason, .. } => Self::Failed {
                reason: reason.clone(),
                retryable: true,
            },
        }
    }

    /// Before the first identity event there is nothing to show yet.
    #[must_use]
    pub fn for_pending(state: Option<&SessionState>) -> Self {
        state.map_or(Self::Loading, Self::for_state)
    }
}

/// The login page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum LoginView {
    /// Identity not known yet.
    Loading,
    SignInForm,
    /// The visitor is already signed in; the form is hidden.
    AlreadySignedIn { uid: String },
}

impl LoginView {
    #[must_use]
    pub fn for_state(state: Option<&SessionState>) -> Self {
        match state {
            None => Self::Loading,
            Some(state) => state.identity().map_or(Self::SignInForm, |identity| {
                Self::AlreadySignedIn {
                    uid: identity.uid.clone(),
                }
            }),
        }
    }
}
