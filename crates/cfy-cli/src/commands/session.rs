use std::sync::Arc;

use anyhow::Context;
use cfy_auth::CredentialProvider;
use cfy_config::SessionConfig;
use cfy_core::{Route, SessionStatus};
use cfy_session::{PageView, RecordingNavigator, ResolverConfig, SessionResolver};
use cfy_store::ProfileStore;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::progress::Progress;

/// Outcome of one session resolution, as printed by `login` and `simulate`.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub status: SessionStatus,
    pub uid: Option<String>,
    pub redirects: Vec<Route>,
    pub page: PageView,
}

/// Mount a resolver on `provider` and wait for its first terminal state.
pub async fn resolve_session(
    provider: &dyn CredentialProvider,
    store: Arc<dyn ProfileStore>,
    config: &SessionConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<SessionReport> {
    let navigator = Arc::new(RecordingNavigator::new());
    let mut handle = SessionResolver::new(store, navigator.clone())
        .with_config(ResolverConfig::from(config))
        .attach(provider);

    let spinner = Progress::spinner(flags, "Resolving session");
    let waited = tokio::time::timeout(config.resolve_timeout(), handle.wait_for_terminal()).await;
    let state = match waited {
        Ok(state) => state.context("session resolver stopped before reaching a result")?,
        Err(_) => {
            spinner.finish_err("timed out");
            anyhow::bail!(
                "session did not resolve within {}s",
                config.resolve_timeout().as_secs()
            );
        }
    };
    spinner.finish_clear();
    handle.shutdown().await;

    tracing::debug!(status = %state.status(), "session resolved");
    Ok(SessionReport {
        status: state.status(),
        uid: state.identity().map(|identity| identity.uid.clone()),
        redirects: navigator.routes(),
        page: PageView::for_state(&state),
    })
}
