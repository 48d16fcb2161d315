use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use cfy_auth::MemoryCredentialProvider;
use cfy_config::{CompiflyConfig, SessionConfig};
use cfy_core::{Identity, ProfileDocument, ProviderKind};
use cfy_store::MemoryProfileStore;

use crate::cli::{GlobalFlags, SimulateArgs};
use crate::commands::session::{SessionReport, resolve_session};
use crate::output::output;

pub async fn handle(args: &SimulateArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = CompiflyConfig::load()?;
    let report = run(args, &config.session, flags).await?;
    output(&report, flags.format)
}

async fn run(
    args: &SimulateArgs,
    config: &SessionConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<SessionReport> {
    let profiles = load_profiles(&args.profiles)?;
    tracing::debug!(count = profiles.len(), "loaded profiles");

    let store = MemoryProfileStore::with_profiles(profiles);
    let mut provider = MemoryCredentialProvider::new();
    if let Some(uid) = &args.uid {
        if args.latency_ms > 0 {
            store.set_latency(uid.as_str(), Duration::from_millis(args.latency_ms));
        }
        provider = provider.signed_in_as(Identity::new(uid.as_str(), ProviderKind::Password));
    }

    resolve_session(&provider, Arc::new(store), config, flags).await
}

fn load_profiles(path: &Path) -> anyhow::Result<Vec<ProfileDocument>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profiles from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of profiles", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use cfy_core::{Route, SessionStatus};
    use cfy_session::PageView;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cli::OutputFormat;

    fn profiles_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"uid": "u1", "username": "alice", "codeforcesHandle": "alice_cf"}}]"#
        )
        .unwrap();
        file
    }

    fn args(file: &tempfile::NamedTempFile, uid: Option<&str>) -> SimulateArgs {
        SimulateArgs {
            profiles: file.path().to_path_buf(),
            uid: uid.map(str::to_string),
            latency_ms: 0,
        }
    }

    const FLAGS: GlobalFlags = GlobalFlags {
        format: OutputFormat::Json,
        quiet: true,
        verbose: false,
    };

    #[test]
    fn profiles_file_is_parsed_with_camel_case_keys() {
        let file = profiles_file();
        let profiles = load_profiles(file.path()).unwrap();
        assert_eq!(
            profiles,
            vec![ProfileDocument::new("u1", "alice").with_codeforces("alice_cf")]
        );
    }

    #[test]
    fn malformed_profiles_file_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let error = load_profiles(file.path()).unwrap_err();
        assert!(format!("{error:#}").contains(&file.path().display().to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn signed_out_simulation_redirects_to_login() {
        let file = profiles_file();
        let report = run(&args(&file, None), &SessionConfig::default(), &FLAGS)
            .await
            .unwrap();
        assert_eq!(report.status, SessionStatus::Unauthenticated);
        assert_eq!(report.redirects, vec![Route::Login]);
    }

    #[tokio::test(start_paused = true)]
    async fn known_uid_renders_profile() {
        let file = profiles_file();
        let report = run(&args(&file, Some("u1")), &SessionConfig::default(), &FLAGS)
            .await
            .unwrap();
        assert_eq!(report.status, SessionStatus::AuthenticatedWithProfile);
        assert!(report.redirects.is_empty());
        let PageView::Content(view) = report.page else {
            panic!("expected profile content");
        };
        assert_eq!(view.handle, "@alice");
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_uid_goes_to_onboarding() {
        let file = profiles_file();
        let report = run(&args(&file, Some("u2")), &SessionConfig::default(), &FLAGS)
            .await
            .unwrap();
        assert_eq!(report.uid.as_deref(), Some("u2"));
        assert_eq!(report.redirects, vec![Route::CreateUser]);
    }

    #[tokio::test(start_paused = true)]
    async fn store_slower_than_timeout_reports_failure() {
        let file = profiles_file();
        let mut slow = args(&file, Some("u1"));
        slow.latency_ms = 60_000;
        let config = SessionConfig {
            max_attempts: 1,
            ..SessionConfig::default()
        };
        let report = run(&slow, &config, &FLAGS).await.unwrap();
        assert_eq!(report.status, SessionStatus::ResolutionFailed);
        assert!(report.redirects.is_empty());
    }
}
