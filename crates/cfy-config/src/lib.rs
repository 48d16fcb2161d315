//! # cfy-config
//!
//! Layered configuration loading for Compifly using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`COMPIFLY_*` prefix, `__` as separator)
//! 2. Project-level `.compifly/config.toml`
//! 3. User-level `~/.config/compifly/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `COMPIFLY_FIREBASE__API_KEY` -> `firebase.api_key`,
//! `COMPIFLY_SESSION__MAX_ATTEMPTS` -> `session.max_attempts`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use cfy_config::CompiflyConfig;
//!
//! let config = CompiflyConfig::load_with_dotenv().expect("config");
//! if config.firebase.is_configured() {
//!     println!("project: {}", config.firebase.project_id);
//! }
//! ```

mod error;
mod firebase;
mod session;

pub use error::ConfigError;
pub use firebase::FirebaseConfig;
pub use session::SessionConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CompiflyConfig {
    #[serde(default)]
    pub firebase: FirebaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl CompiflyConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` files.
    /// The `[session]` section is validated after extraction.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Load configuration with `.env` file support.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Extract and validate from an arbitrary figment (used by tests).
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.session.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".compifly/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("COMPIFLY_").split("__"))
    }

    /// Fail unless the Firebase section can reach a real project.
    pub fn require_firebase(&self) -> Result<&FirebaseConfig, ConfigError> {
        if self.firebase.is_configured() {
            Ok(&self.firebase)
        } else {
            Err(ConfigError::NotConfigured {
                section: "firebase".into(),
            })
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("compifly").join("config.toml"))
    }

    /// Load `.env` walking up from `CARGO_MANIFEST_DIR`, then the current dir.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = CompiflyConfig::default();
        assert!(!config.firebase.is_configured());
        assert_eq!(config.session.max_attempts, 3);
    }

    #[test]
    fn require_firebase_reports_section() {
        let err = CompiflyConfig::default().require_firebase().unwrap_err();
        assert!(matches!(err, ConfigError::NotConfigured { ref section } if section == "firebase"));
    }
}
