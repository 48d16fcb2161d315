//! Firebase project configuration (Identity Toolkit + Firestore).

use serde::{Deserialize, Serialize};

fn default_profile_collection() -> String {
    "users".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FirebaseConfig {
    /// Web API key, used as the `key` query parameter on Identity Toolkit calls.
    #[serde(default)]
    pub api_key: String,

    /// Firebase/GCP project id that owns the Firestore database.
    #[serde(default)]
    pub project_id: String,

    /// Auth domain (e.g., `compifly.firebaseapp.com`).
    #[serde(default)]
    pub auth_domain: String,

    /// Firestore collection holding one profile document per uid.
    #[serde(default = "default_profile_collection")]
    pub profile_collection: String,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            auth_domain: String::new(),
            profile_collection: default_profile_collection(),
        }
    }
}

impl FirebaseConfig {
    /// Check if the config has the minimum required fields for remote access.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.project_id.is_empty()
    }
}
