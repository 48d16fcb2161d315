//! End-to-end resolver behavior against the in-memory provider and store.
//!
//! All tests run on paused time so latency and timeouts are deterministic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cfy_auth::MemoryCredentialProvider;
use cfy_core::{Identity, ProfileDocument, ProviderKind, Route, SessionState, SessionStatus};
use cfy_session::{
    RecordingNavigator, ResolverConfig, ResolverHandle, RetryPolicy, SessionResolver, StateLog,
};
use cfy_store::{MemoryProfileStore, ProfileStore, StoreError};
use pretty_assertions::assert_eq;

struct Page {
    provider: Arc<MemoryCredentialProvider>,
    navigator: Arc<RecordingNavigator>,
    log: Arc<StateLog>,
    handle: ResolverHandle,
}

impl Page {
    fn mount(
        provider: MemoryCredentialProvider,
        store: Arc<dyn ProfileStore>,
        config: ResolverConfig,
    ) -> Self {
        let provider = Arc::new(provider);
        let navigator = Arc::new(RecordingNavigator::new());
        let log = Arc::new(StateLog::new());
        let handle = SessionResolver::new(store, navigator.clone())
            .with_config(config)
            .with_listener(log.clone())
            .attach(provider.as_ref());
        Self {
            provider,
            navigator,
            log,
            handle,
        }
    }

    fn statuses(&self) -> Vec<SessionStatus> {
        self.log.states().iter().map(SessionState::status).collect()
    }
}

fn user(uid: &str) -> Identity {
    Identity::new(uid, ProviderKind::Password)
}

fn fast_config() -> ResolverConfig {
    ResolverConfig {
        lookup_timeout: Duration::from_secs(5),
        retry: RetryPolicy::once(),
    }
}

/// Let every spawned task run to quiescence.
async fn settle() {
    tokio::time::sleep(Duration::from_secs(60)).await;
}

#[tokio::test(start_paused = true)]
async fn signed_out_visitor_is_sent_to_login_once() {
    let store = Arc::new(MemoryProfileStore::new());
    let mut page = Page::mount(MemoryCredentialProvider::new(), store.clone(), fast_config());

    let state = page.handle.wait_for_terminal().await;
    assert_eq!(state, Some(SessionState::Unauthenticated));
    assert_eq!(page.navigator.routes(), vec![Route::Login]);

    page.provider.emit(None);
    settle().await;
    assert_eq!(page.navigator.routes(), vec![Route::Login]);
    assert_eq!(store.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn identity_without_profile_is_sent_to_onboarding_once() {
    let provider = MemoryCredentialProvider::new().signed_in_as(user("u1"));
    let mut page = Page::mount(provider, Arc::new(MemoryProfileStore::new()), fast_config());

    let state = page.handle.wait_for_terminal().await;
    assert_eq!(
        state,
        Some(SessionState::AuthenticatedNoProfile { identity: user("u1") })
    );
    assert_eq!(page.navigator.routes(), vec![Route::CreateUser]);
    assert_eq!(
        page.statuses(),
        vec![SessionStatus::Resolving, SessionStatus::AuthenticatedNoProfile]
    );
}

#[tokio::test(start_paused = true)]
async fn existing_profile_is_rendered_without_redirect() {
    let doc = ProfileDocument::new("u1", "alice").with_codeforces("alice_cf");
    let store = Arc::new(MemoryProfileStore::with_profiles([doc.clone()]));
    let provider = MemoryCredentialProvider::new().signed_in_as(user("u1"));
    let mut page = Page::mount(provider, store, fast_config());

    let state = page.handle.wait_for_terminal().await;
    assert_eq!(
        state,
        Some(SessionState::AuthenticatedWithProfile {
            identity: user("u1"),
            profile: doc,
        })
    );
    assert!(page.navigator.routes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn sign_out_during_lookup_wins() {
    let store = Arc::new(MemoryProfileStore::with_profiles([ProfileDocument::new(
        "a", "alice",
    )]));
    store.set_latency("a", Duration::from_secs(2));
    let provider = MemoryCredentialProvider::new().signed_in_as(user("a"));
    let mut page = Page::mount(provider, store, fast_config());

    page.handle
        .wait_until(|s| s.status() == SessionStatus::Resolving)
        .await;
    page.provider.emit(None);
    settle().await;

    assert_eq!(page.handle.state(), Some(SessionState::Unauthenticated));
    assert_eq!(page.navigator.routes(), vec![Route::Login]);
    assert_eq!(
        page.statuses(),
        vec![SessionStatus::Resolving, SessionStatus::Unauthenticated]
    );
}

#[tokio::test(start_paused = true)]
async fn newer_identity_supersedes_slow_lookup() {
    let store = Arc::new(MemoryProfileStore::with_profiles([
        ProfileDocument::new("a", "alice"),
        ProfileDocument::new("b", "bob"),
    ]));
    store.set_latency("a", Duration::from_secs(2));
    let provider = MemoryCredentialProvider::new().signed_in_as(user("a"));
    let mut page = Page::mount(provider, store, fast_config());

    page.handle
        .wait_until(|s| s.status() == SessionStatus::Resolving)
        .await;
    page.provider.emit(Some(user("b")));
    settle().await;

    let state = page.handle.state().unwrap();
    assert_eq!(state.identity().map(|i| i.uid.as_str()), Some("b"));
    assert_eq!(state.profile().map(|p| p.username.as_str()), Some("bob"));
    assert!(page.navigator.routes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn nothing_happens_after_shutdown() {
    let store = Arc::new(MemoryProfileStore::new());
    store.set_latency("u1", Duration::from_secs(2));
    let provider = MemoryCredentialProvider::new().signed_in_as(user("u1"));
    let mut page = Page::mount(provider, store, fast_config());

    page.handle
        .wait_until(|s| s.status() == SessionStatus::Resolving)
        .await;
    let Page {
        provider,
        navigator,
        log,
        handle,
    } = page;
    handle.shutdown().await;

    provider.emit(None);
    settle().await;
    assert!(navigator.routes().is_empty());
    assert_eq!(log.len(), 1);
    assert_eq!(provider.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_unsubscribes() {
    let page = Page::mount(
        MemoryCredentialProvider::new(),
        Arc::new(MemoryProfileStore::new()),
        fast_config(),
    );
    let provider = page.provider.clone();
    drop(page);
    settle().await;

    provider.emit(Some(user("u1")));
    assert_eq!(provider.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_store_times_out_without_redirect() {
    let store = Arc::new(MemoryProfileStore::new());
    store.set_latency("u1", Duration::from_secs(30));
    let provider = MemoryCredentialProvider::new().signed_in_as(user("u1"));
    let config = ResolverConfig {
        lookup_timeout: Duration::from_secs(1),
        retry: RetryPolicy::once(),
    };
    let mut page = Page::mount(provider, store, config);

    let state = page.handle.wait_for_terminal().await.unwrap();
    assert_eq!(state.status(), SessionStatus::ResolutionFailed);
    assert!(page.navigator.routes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_resolution_recovers_on_retry() {
    let store = Arc::new(MemoryProfileStore::with_profiles([ProfileDocument::new(
        "u1", "alice",
    )]));
    store.start_outage(StoreError::Backend("unavailable".into()));
    let provider = MemoryCredentialProvider::new().signed_in_as(user("u1"));
    let mut page = Page::mount(provider, store.clone(), ResolverConfig::default());

    let failed = page.handle.wait_for_terminal().await.unwrap();
    assert!(matches!(
        failed,
        SessionState::ResolutionFailed { ref reason, .. } if reason.contains("unavailable")
    ));
    assert_eq!(store.calls(), 3);

    store.end_outage();
    assert!(page.handle.retry());
    let state = page.handle.wait_for_terminal().await.unwrap();
    assert_eq!(state.status(), SessionStatus::AuthenticatedWithProfile);
    assert!(page.navigator.routes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn wait_after_retry_skips_the_stale_failure() {
    let store = Arc::new(MemoryProfileStore::new());
    store.start_outage(StoreError::Backend("unavailable".into()));
    let provider = MemoryCredentialProvider::new().signed_in_as(user("u1"));
    let mut page = Page::mount(provider, store.clone(), fast_config());

    page.handle.wait_for_terminal().await;
    assert!(page.handle.retry());
    let again = page.handle.wait_for_terminal().await.unwrap();
    assert_eq!(again.status(), SessionStatus::ResolutionFailed);
    assert_eq!(
        page.statuses(),
        vec![
            SessionStatus::Resolving,
            SessionStatus::ResolutionFailed,
            SessionStatus::Resolving,
            SessionStatus::ResolutionFailed,
        ]
    );

    store.end_outage();
    assert!(page.handle.retry());
    let state = page.handle.wait_for_terminal().await.unwrap();
    assert_eq!(state.status(), SessionStatus::AuthenticatedNoProfile);
    assert_eq!(page.navigator.routes(), vec![Route::CreateUser]);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried() {
    let store = Arc::new(MemoryProfileStore::with_profiles([ProfileDocument::new(
        "u1", "alice",
    )]));
    store.fail_next(1);
    let provider = MemoryCredentialProvider::new().signed_in_as(user("u1"));
    let mut page = Page::mount(provider, store.clone(), ResolverConfig::default());

    let state = page.handle.wait_for_terminal().await.unwrap();
    assert_eq!(state.status(), SessionStatus::AuthenticatedWithProfile);
    assert_eq!(store.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn rejected_credentials_are_not_retried() {
    let store = Arc::new(MemoryProfileStore::new());
    store.start_outage(StoreError::Unauthorized("token expired".into()));
    let provider = MemoryCredentialProvider::new().signed_in_as(user("u1"));
    let mut page = Page::mount(provider, store.clone(), ResolverConfig::default());

    let state = page.handle.wait_for_terminal().await.unwrap();
    assert_eq!(state.status(), SessionStatus::ResolutionFailed);
    assert_eq!(store.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_outside_failed_state_is_ignored() {
    let store = Arc::new(MemoryProfileStore::new());
    let provider = MemoryCredentialProvider::new().signed_in_as(user("u1"));
    let mut page = Page::mount(provider, store.clone(), fast_config());

    page.handle.wait_for_terminal().await;
    let calls = store.calls();
    assert!(!page.handle.retry());
    settle().await;
    assert_eq!(store.calls(), calls);
    assert_eq!(page.log.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn token_refresh_does_not_redirect_again() {
    let provider = MemoryCredentialProvider::new().signed_in_as(user("u1"));
    let mut page = Page::mount(provider, Arc::new(MemoryProfileStore::new()), fast_config());
    page.handle.wait_for_terminal().await;

    page.provider.emit(Some(user("u1")));
    settle().await;

    assert_eq!(page.navigator.routes(), vec![Route::CreateUser]);
    assert_eq!(
        page.statuses(),
        vec![
            SessionStatus::Resolving,
            SessionStatus::AuthenticatedNoProfile,
            SessionStatus::Resolving,
            SessionStatus::AuthenticatedNoProfile,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn sign_in_after_sign_out_resolves_again() {
    let store = Arc::new(MemoryProfileStore::with_profiles([ProfileDocument::new(
        "u1", "alice",
    )]));
    let mut page = Page::mount(MemoryCredentialProvider::new(), store, fast_config());
    page.handle.wait_for_terminal().await;

    page.provider.emit(Some(user("u1")));
    let state = page
        .handle
        .wait_until(|s| s.status() == SessionStatus::AuthenticatedWithProfile)
        .await;
    assert!(state.is_some());

    page.provider.emit(None);
    settle().await;
    assert_eq!(page.navigator.routes(), vec![Route::Login, Route::Login]);
}

struct VanishingStore;

#[async_trait]
impl ProfileStore for VanishingStore {
    async fn exists(&self, _uid: &str) -> Result<bool, StoreError> {
        Ok(true)
    }

    async fn get(&self, _uid: &str) -> Result<Option<ProfileDocument>, StoreError> {
        Ok(None)
    }
}

#[tokio::test(start_paused = true)]
async fn profile_deleted_between_calls_counts_as_absent() {
    let provider = MemoryCredentialProvider::new().signed_in_as(user("u1"));
    let mut page = Page::mount(provider, Arc::new(VanishingStore), fast_config());

    let state = page.handle.wait_for_terminal().await.unwrap();
    assert_eq!(state.status(), SessionStatus::AuthenticatedNoProfile);
    assert_eq!(page.navigator.routes(), vec![Route::CreateUser]);
}
