//! Integration tests for TOML and environment configuration loading.
//!
//! Uses `figment::Jail` for sandboxed files and env vars.

use cfy_config::{CompiflyConfig, ConfigError};
use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;

fn jail_figment() -> Figment {
    Figment::from(Serialized::defaults(CompiflyConfig::default()))
        .merge(Toml::file("config.toml"))
        .merge(Env::prefixed("COMPIFLY_").split("__"))
}

#[test]
fn loads_firebase_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[firebase]
api_key = "AIza-toml"
project_id = "compifly-dev"
auth_domain = "compifly-dev.firebaseapp.com"
"#,
        )?;

        let config: CompiflyConfig = jail_figment().extract()?;
        assert_eq!(config.firebase.api_key, "AIza-toml");
        assert_eq!(config.firebase.project_id, "compifly-dev");
        assert_eq!(config.firebase.auth_domain, "compifly-dev.firebaseapp.com");
        assert_eq!(config.firebase.profile_collection, "users");
        assert!(config.firebase.is_configured());
        Ok(())
    });
}

#[test]
fn loads_session_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[session]
lookup_timeout_ms = 1500
max_attempts = 5
"#,
        )?;

        let config: CompiflyConfig = jail_figment().extract()?;
        assert_eq!(config.session.lookup_timeout_ms, 1500);
        assert_eq!(config.session.max_attempts, 5);
        assert_eq!(config.session.base_delay_ms, 200, "unset fields keep defaults");
        Ok(())
    });
}

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[firebase]
api_key = "AIza-toml"
project_id = "compifly-dev"
"#,
        )?;
        jail.set_env("COMPIFLY_FIREBASE__API_KEY", "AIza-env");
        jail.set_env("COMPIFLY_SESSION__MAX_ATTEMPTS", "7");

        let config: CompiflyConfig = jail_figment().extract()?;
        assert_eq!(config.firebase.api_key, "AIza-env");
        assert_eq!(config.firebase.project_id, "compifly-dev");
        assert_eq!(config.session.max_attempts, 7);
        Ok(())
    });
}

#[test]
fn from_figment_rejects_invalid_session() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[session]
max_attempts = 0
"#,
        )?;

        let result = CompiflyConfig::from_figment(jail_figment());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "session.max_attempts"
        ));
        Ok(())
    });
}

#[test]
fn load_reads_project_local_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".compifly")?;
        jail.create_file(
            ".compifly/config.toml",
            r#"
[firebase]
project_id = "local-project"
"#,
        )?;

        let config = CompiflyConfig::load().expect("config loads");
        assert_eq!(config.firebase.project_id, "local-project");
        Ok(())
    });
}
