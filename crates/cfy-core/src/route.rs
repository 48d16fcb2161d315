//! Navigation targets.

use serde::{Serialize, Serializer};
use std::fmt;

/// Pages the app can navigate to.
///
/// The session resolver only ever redirects to `Login` or `CreateUser`.
/// Staying on the current page is expressed by not redirecting at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Profile,
    Login,
    CreateUser,
    Register,
    ForgotPassword,
    Friends,
    Rankings,
    EditProfile,
}

impl Route {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Profile => "/",
            Self::Login => "/login",
            Self::CreateUser => "/create_user",
            Self::Register => "/register",
            Self::ForgotPassword => "/forgot_password",
            Self::Friends => "/friends",
            Self::Rankings => "/rankings",
            Self::EditProfile => "/edit_profile",
        }
    }

    /// Pages reachable only by a visitor with a resolved profile.
    #[must_use]
    pub const fn requires_profile(self) -> bool {
        matches!(
            self,
            Self::Profile | Self::Friends | Self::Rankings | Self::EditProfile
        )
    }

    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        const ALL: [Route; 8] = [
            Route::Profile,
            Route::Login,
            Route::CreateUser,
            Route::Register,
            Route::ForgotPassword,
            Route::Friends,
            Route::Rankings,
            Route::EditProfile,
        ];
        ALL.into_iter().find(|route| route.path() == path)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}
