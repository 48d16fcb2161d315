use serde::{Deserialize, Serialize};

/// Application profile record, keyed by `Identity::uid`.
///
/// Created once by the onboarding flow and never mutated by the session core.
/// Field names follow the document store's camelCase keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    pub uid: String,
    pub username: String,
    #[serde(default)]
    pub codeforces_handle: Option<String>,
    #[serde(default)]
    pub codechef_handle: Option<String>,
}

impl ProfileDocument {
    #[must_use]
    pub fn new(uid: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            username: username.into(),
            codeforces_handle: None,
            codechef_handle: None,
        }
    }

    #[must_use]
    pub fn with_codeforces(mut self, handle: impl Into<String>) -> Self {
        self.codeforces_handle = Some(handle.into());
        self
    }

    #[must_use]
    pub fn with_codechef(mut self, handle: impl Into<String>) -> Self {
        self.codechef_handle = Some(handle.into());
        self
    }

    /// `@username`, as shown under the display name.
    #[must_use]
    pub fn handle_label(&self) -> String {
        format!("@{}", self.username)
    }

    /// Judge handles that are actually set, as `(judge, handle)` pairs.
    ///
    /// Empty strings count as unset.
    #[must_use]
    pub fn linked_handles(&self) -> Vec<(&'static str, &str)> {
        [
            ("codeforces", self.codeforces_handle.as_deref()),
            ("codechef", self.codechef_handle.as_deref()),
        ]
        .into_iter()
        .filter_map(|(judge, handle)| {
            handle
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(|h| (judge, h))
        })
        .collect()
    }
}
