use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated principal as reported by the credential provider.
///
/// Read-only to this system. `None` in place of an `Identity` means the
/// visitor is signed out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Provider user id. Also the primary key of the profile document.
    pub uid: String,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    /// Sign-in method, e.g. `password`, `google.com`, `github.com`.
    pub provider_id: String,
}

impl Identity {
    /// Identity with only a uid and provider, as email/password sign-in returns.
    #[must_use]
    pub fn new(uid: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            photo_url: None,
            provider_id: provider.as_str().to_string(),
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    /// The provider kind, if `provider_id` is one the app signs in with.
    #[must_use]
    pub fn provider(&self) -> Option<ProviderKind> {
        ProviderKind::from_provider_id(&self.provider_id)
    }
}

// ---------------------------------------------------------------------------
// ProviderKind
// ---------------------------------------------------------------------------

/// Sign-in methods offered on the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Password,
    Google,
    Github,
}

impl ProviderKind {
    /// Provider id string as carried on `Identity::provider_id`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Google => "google.com",
            Self::Github => "github.com",
        }
    }

    #[must_use]
    pub fn from_provider_id(id: &str) -> Option<Self> {
        match id {
            "password" => Some(Self::Password),
            "google.com" => Some(Self::Google),
            "github.com" => Some(Self::Github),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
