//! The session resolver task.
//!
//! One tokio task per page instance. It processes identity changes in arrival
//! order, runs profile lookups as child tasks, and publishes each state on a
//! `watch` channel. Every identity change bumps a generation counter; a lookup
//! result is applied only if its `(generation, uid)` still matches.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cfy_auth::{CredentialProvider, IdentityStream};
use cfy_config::SessionConfig;
use cfy_core::{Identity, ProfileDocument, Route, SessionState, SessionStatus};
use cfy_store::{ProfileStore, StoreError};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::navigator::{Navigator, SessionListener};
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Upper bound on a single `exists`/`get` call.
    pub lookup_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for ResolverConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            lookup_timeout: config.lookup_timeout(),
            retry: RetryPolicy::from(config),
        }
    }
}

/// Builder for a resolver task.
pub struct SessionResolver {
    store: Arc<dyn ProfileStore>,
    navigator: Arc<dyn Navigator>,
    listener: Option<Arc<dyn SessionListener>>,
    config: ResolverConfig,
}

impl SessionResolver {
    pub fn new(store: Arc<dyn ProfileStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            navigator,
            listener: None,
            config: ResolverConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Subscribe to `provider` and start resolving.
    pub fn attach(self, provider: &dyn CredentialProvider) -> ResolverHandle {
        self.spawn(provider.on_identity_change())
    }

    /// Start the resolver task on an existing identity subscription.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self, identities: IdentityStream) -> ResolverHandle {
        let (state_tx, state_rx) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (lookup_tx, lookup_rx) = mpsc::unbounded_channel();
        let torn_down = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            store: self.store,
            navigator: self.navigator,
            listener: self.listener,
            config: self.config,
            state_tx,
            lookup_tx,
            torn_down: Arc::clone(&torn_down),
            generation: 0,
            current: None,
            last_redirect: None,
            in_flight: None,
        };
        let task = tokio::spawn(worker.run(identities, command_rx, lookup_rx, shutdown_rx));

        ResolverHandle {
            state: state_rx,
            commands: command_tx,
            shutdown: Some(shutdown_tx),
            torn_down,
            task: Some(task),
            retry_pending: false,
        }
    }
}

#[derive(Debug)]
enum Command {
    Retry,
}

/// Result of one profile lookup, tagged with what it was started for.
#[derive(Debug)]
struct LookupDone {
    generation: u64,
    uid: String,
    outcome: Result<Option<ProfileDocument>, StoreError>,
}

/// Owner of a running resolver.
///
/// Dropping it aborts the task, but abort is asynchronous: only
/// [`Self::shutdown`] guarantees that nothing is published afterwards.
#[derive(Debug)]
pub struct ResolverHandle {
    state: watch::Receiver<Option<SessionState>>,
    commands: mpsc::UnboundedSender<Command>,
    shutdown: Option<oneshot::Sender<()>>,
    torn_down: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    /// Set by `retry`; the failed state still in the channel must not count
    /// as the result of the next wait.
    retry_pending: bool,
}

impl ResolverHandle {
    /// Latest published state; `None` before the first identity event.
    #[must_use]
    pub fn state(&self) -> Option<SessionState> {
        self.state.borrow().clone()
    }

    /// A receiver for page shells that re-render on change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionState>> {
        self.state.clone()
    }

    /// Wait until the published state satisfies `predicate`.
    ///
    /// Returns `None` if the resolver stops first.
    pub async fn wait_until(
        &mut self,
        mut predicate: impl FnMut(&SessionState) -> bool,
    ) -> Option<SessionState> {
        self.state
            .wait_for(|state| state.as_ref().is_some_and(&mut predicate))
            .await
            .ok()
            .and_then(|state| state.clone())
    }

    /// Wait for a terminal state (anything but `Resolving`).
    ///
    /// Returns the current state if it is already terminal, except right
    /// after [`Self::retry`]: then only a state published after the retry
    /// counts.
    pub async fn wait_for_terminal(&mut self) -> Option<SessionState> {
        if std::mem::take(&mut self.retry_pending) {
            loop {
                self.state.changed().await.ok()?;
                let state = self.state.borrow_and_update().clone();
                if state.as_ref().is_some_and(SessionState::is_terminal) {
                    return state;
                }
            }
        }
        self.wait_until(SessionState::is_terminal).await
    }

    /// Re-run resolution after `ResolutionFailed`.
    ///
    /// Returns `false` without doing anything in any other state, or if the
    /// resolver is no longer running.
    pub fn retry(&mut self) -> bool {
        let failed = self
            .state
            .borrow()
            .as_ref()
            .is_some_and(|state| state.status() == SessionStatus::ResolutionFailed);
        if !failed {
            return false;
        }
        self.state.mark_unchanged();
        if self.commands.send(Command::Retry).is_err() {
            return false;
        }
        self.retry_pending = true;
        true
    }

    /// Stop the resolver and wait for its task to exit.
    ///
    /// No state is published and no redirect is issued after this returns.
    pub async fn shutdown(mut self) {
        self.torn_down.store(true, Ordering::SeqCst);
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                if error.is_panic() {
                    tracing::error!(%error, "session resolver task panicked");
                }
            }
        }
    }
}

impl Drop for ResolverHandle {
    fn drop(&mut self) {
        self.torn_down.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Worker {
    store: Arc<dyn ProfileStore>,
    navigator: Arc<dyn Navigator>,
    listener: Option<Arc<dyn SessionListener>>,
    config: ResolverConfig,
    state_tx: watch::Sender<Option<SessionState>>,
    lookup_tx: mpsc::UnboundedSender<LookupDone>,
    torn_down: Arc<AtomicBool>,
    generation: u64,
    current: Option<SessionState>,
    /// Last redirect issued, keyed by route and uid, so a repeat of the same
    /// outcome does not navigate again.
    last_redirect: Option<(Route, Option<String>)>,
    in_flight: Option<JoinHandle<()>>,
}

impl Worker {
    async fn run(
        mut self,
        mut identities: IdentityStream,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut lookups: mpsc::UnboundedReceiver<LookupDone>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut identities_open = true;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                change = identities.next(), if identities_open => match change {
                    Some(change) => self.on_identity(change.identity),
                    None => {
                        tracing::debug!("identity provider closed the subscription");
                        identities_open = false;
                    }
                },
                Some(done) = lookups.recv() => self.on_lookup(done),
                Some(command) = commands.recv() => match command {
                    Command::Retry => self.on_retry(),
                },
                else => break,
            }
        }
        self.cancel_lookup();
        tracing::debug!("session resolver stopped");
    }

    fn on_identity(&mut self, identity: Option<Identity>) {
        self.generation += 1;
        self.cancel_lookup();
        match identity {
            None => {
                tracing::debug!(generation = self.generation, "identity change: signed out");
                self.transition(SessionState::Unauthenticated);
            }
            Some(identity) => {
                tracing::debug!(
                    generation = self.generation,
                    uid = %identity.uid,
                    "identity change: signed in"
                );
                self.start_lookup(identity);
            }
        }
    }

    fn on_retry(&mut self) {
        let Some(SessionState::ResolutionFailed { identity, .. }) = &self.current else {
            tracing::debug!("retry ignored: session is not in a failed state");
            // Wake a caller waiting on the retry; the state it sees is current.
            if !self.is_torn_down() {
                self.state_tx.send_replace(self.current.clone());
            }
            return;
        };
        let identity = identity.clone();
        tracing::info!(uid = %identity.uid, "retrying profile resolution");
        self.generation += 1;
        self.start_lookup(identity);
    }

    fn start_lookup(&mut self, identity: Identity) {
        let generation = self.generation;
        let uid = identity.uid.clone();
        self.transition(SessionState::Resolving { identity });

        let store = Arc::clone(&self.store);
        let config = self.config;
        let lookup_tx = self.lookup_tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = lookup_profile(store.as_ref(), &uid, config).await;
            let _ = lookup_tx.send(LookupDone {
                generation,
                uid,
                outcome,
            });
        }));
    }

    fn cancel_lookup(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }

    fn on_lookup(&mut self, done: LookupDone) {
        let current_uid = match &self.current {
            Some(SessionState::Resolving { identity }) => Some(identity.uid.as_str()),
            _ => None,
        };
        if done.generation != self.generation || current_uid != Some(done.uid.as_str()) {
            tracing::debug!(
                uid = %done.uid,
                generation = done.generation,
                current = self.generation,
                "discarding stale profile lookup"
            );
            return;
        }
        self.in_flight = None;

        let Some(SessionState::Resolving { identity }) = self.current.clone() else {
            return;
        };
        let next = match done.outcome {
            Ok(Some(profile)) => SessionState::AuthenticatedWithProfile { identity, profile },
            Ok(None) => SessionState::AuthenticatedNoProfile { identity },
            Err(error) => {
                tracing::warn!(uid = %done.uid, %error, "profile resolution failed");
                SessionState::ResolutionFailed {
                    identity,
                    reason: error.to_string(),
                }
            }
        };
        self.transition(next);
    }

    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Publish `next`, notify the listener, then redirect. The teardown flag
    /// is checked again before each side effect.
    fn transition(&mut self, next: SessionState) {
        if self.is_torn_down() {
            return;
        }
        if let Some(current) = &self.current {
            if let Err(error) = current.check_transition(&next) {
                tracing::error!(%error, "session transition rejected");
                return;
            }
        }

        tracing::debug!(status = %next.status(), "session state");
        self.state_tx.send_replace(Some(next.clone()));
        if let Some(listener) = &self.listener {
            if self.is_torn_down() {
                return;
            }
            listener.on_state(&next);
        }
        self.apply_redirect(&next);
        self.current = Some(next);
    }

    fn apply_redirect(&mut self, next: &SessionState) {
        if !next.is_terminal() {
            return;
        }
        let Some(route) = next.redirect_target() else {
            self.last_redirect = None;
            return;
        };
        let key = (route, next.identity().map(|i| i.uid.clone()));
        if self.last_redirect.as_ref() == Some(&key) {
            tracing::debug!(%route, "redirect already issued for this outcome");
            return;
        }
        if self.is_torn_down() {
            return;
        }
        tracing::info!(%route, "redirecting");
        self.navigator.redirect(route);
        self.last_redirect = Some(key);
    }
}

/// Existence check, then fetch, each with timeout and retry.
///
/// A document that disappears between the two calls counts as absent.
async fn lookup_profile(
    store: &dyn ProfileStore,
    uid: &str,
    config: ResolverConfig,
) -> Result<Option<ProfileDocument>, StoreError> {
    let timeout = config.lookup_timeout;
    let exists = config
        .retry
        .run(timeout, "exists", uid, || store.exists(uid))
        .await?;
    if !exists {
        return Ok(None);
    }
    config
        .retry
        .run(timeout, "get", uid, || store.get(uid))
        .await
}
