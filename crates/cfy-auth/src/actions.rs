//! Authentication actions offered to pages.

use std::sync::Arc;

use cfy_core::{Identity, ProviderKind};

use crate::error::AuthError;
use crate::provider::{CredentialProvider, IdentityStream};

/// Thin wrapper over an injected credential provider.
///
/// Failures are logged and returned to the caller; nothing here retries.
#[derive(Clone)]
pub struct AuthActions {
    provider: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for AuthActions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthActions").finish_non_exhaustive()
    }
}

impl AuthActions {
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self { provider }
    }

    #[must_use]
    pub fn provider(&self) -> Arc<dyn CredentialProvider> {
        Arc::clone(&self.provider)
    }

    pub fn on_identity_change(&self) -> IdentityStream {
        self.provider.on_identity_change()
    }

    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.provider.current_identity()
    }

    /// Email/password sign-in.
    ///
    /// # Errors
    ///
    /// Returns the provider's `AuthError` unchanged.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let result = self.provider.sign_in_with_password(email, password).await;
        log_outcome(ProviderKind::Password, &result);
        result
    }

    /// # Errors
    ///
    /// Returns the provider's `AuthError` unchanged.
    pub async fn authenticate_with_google(&self) -> Result<(), AuthError> {
        let result = self.provider.sign_in_with_google().await;
        log_outcome(ProviderKind::Google, &result);
        result
    }

    /// # Errors
    ///
    /// Returns the provider's `AuthError` unchanged.
    pub async fn authenticate_with_github(&self) -> Result<(), AuthError> {
        let result = self.provider.sign_in_with_github().await;
        log_outcome(ProviderKind::Github, &result);
        result
    }

    /// # Errors
    ///
    /// Returns the provider's `AuthError` unchanged.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let result = self.provider.sign_out().await;
        match &result {
            Ok(()) => tracing::info!("signed out"),
            Err(error) => tracing::warn!(code = %error.code, "sign-out failed"),
        }
        result
    }
}

fn log_outcome(provider: ProviderKind, result: &Result<(), AuthError>) {
    match result {
        Ok(()) => tracing::info!(%provider, "sign-in succeeded"),
        Err(error) => tracing::warn!(%provider, code = %error.code, "sign-in failed"),
    }
}
