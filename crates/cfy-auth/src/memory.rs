//! In-memory credential provider for tests and offline runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cfy_core::{Identity, ProviderKind};

use crate::error::{AuthError, AuthErrorCode};
use crate::provider::{CredentialProvider, IdentityBroadcaster, IdentityStream};

#[derive(Debug, Clone)]
struct Account {
    password: String,
    identity: Identity,
}

/// Credential provider backed by a fixed set of accounts.
///
/// Federated sign-in answers with whatever was registered for that provider
/// via [`Self::with_federated`]; unregistered providers behave as if the
/// visitor closed the popup.
#[derive(Debug, Default)]
pub struct MemoryCredentialProvider {
    broadcaster: IdentityBroadcaster,
    accounts: HashMap<String, Account>,
    federated: HashMap<ProviderKind, Result<Identity, AuthError>>,
    latency: Duration,
    calls: AtomicUsize,
}

impl MemoryCredentialProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_account(
        mut self,
        email: impl Into<String>,
        password: impl Into<String>,
        identity: Identity,
    ) -> Self {
        self.accounts.insert(
            email.into(),
            Account {
                password: password.into(),
                identity,
            },
        );
        self
    }

    #[must_use]
    pub fn with_federated(
        mut self,
        kind: ProviderKind,
        outcome: Result<Identity, AuthError>,
    ) -> Self {
        self.federated.insert(kind, outcome);
        self
    }

    /// Delay every auth call by `latency` before answering.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Start out signed in as `identity`.
    #[must_use]
    pub fn signed_in_as(self, identity: Identity) -> Self {
        self.broadcaster.publish(Some(identity));
        self
    }

    /// Push an identity change as the backend would on its own (token
    /// refresh, session expiry, sign-in from another tab).
    pub fn emit(&self, identity: Option<Identity>) {
        self.broadcaster.publish(identity);
    }

    /// Number of sign-in/sign-out calls that reached the provider.
    #[must_use]
    pub fn auth_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.subscriber_count()
    }

    async fn begin_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    async fn federated_sign_in(&self, kind: ProviderKind) -> Result<(), AuthError> {
        self.begin_call().await;
        let outcome = self.federated.get(&kind).cloned().unwrap_or_else(|| {
            Err(AuthError::new(
                AuthErrorCode::PopupClosedByUser,
                format!("{kind} popup closed by user"),
            ))
        });
        let identity = outcome?;
        self.broadcaster.publish(Some(identity));
        Ok(())
    }
}

#[async_trait]
impl CredentialProvider for MemoryCredentialProvider {
    fn on_identity_change(&self) -> IdentityStream {
        self.broadcaster.subscribe()
    }

    fn current_identity(&self) -> Option<Identity> {
        self.broadcaster.current()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.begin_call().await;
        let account = self.accounts.get(email).ok_or_else(|| {
            AuthError::new(AuthErrorCode::UserNotFound, "no account for this email")
        })?;
        if account.password != password {
            return Err(AuthError::new(AuthErrorCode::WrongPassword, "wrong password"));
        }
        self.broadcaster.publish(Some(account.identity.clone()));
        Ok(())
    }

    async fn sign_in_with_google(&self) -> Result<(), AuthError> {
        self.federated_sign_in(ProviderKind::Google).await
    }

    async fn sign_in_with_github(&self) -> Result<(), AuthError> {
        self.federated_sign_in(ProviderKind::Github).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.begin_call().await;
        self.broadcaster.publish(None);
        Ok(())
    }
}
