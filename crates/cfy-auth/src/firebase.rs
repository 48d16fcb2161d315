//! Firebase Identity Toolkit REST provider.
//!
//! Calls the REST API directly via `reqwest`. Only email/password sign-in has
//! a headless equivalent; Google and GitHub sign-in need a browser popup and
//! fail with `auth/operation-not-supported-in-this-environment`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use cfy_config::FirebaseConfig;
use cfy_core::{Identity, ProviderKind};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::error::{AuthError, AuthErrorCode};
use crate::provider::{CredentialProvider, IdentityBroadcaster, IdentityStream};

const IDENTITY_TOOLKIT_BASE: &str = "https://identitytoolkit.googleapis.com";
const SECURE_TOKEN_BASE: &str = "https://securetoken.googleapis.com";

/// Lifetime assumed when the backend omits or garbles `expiresIn`.
const DEFAULT_TOKEN_LIFETIME: TimeDelta = TimeDelta::hours(1);

/// Tokens this close to expiry are refreshed early.
const EXPIRY_MARGIN: TimeDelta = TimeDelta::minutes(1);

/// Tokens from the last successful sign-in.
#[derive(Debug, Clone)]
pub struct FirebaseSession {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl FirebaseSession {
    /// Whether the ID token is expired, or about to be, at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .checked_sub_signed(EXPIRY_MARGIN)
            .is_none_or(|deadline| now >= deadline)
    }
}

#[derive(Debug)]
pub struct FirebaseCredentialProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    token_url: String,
    broadcaster: IdentityBroadcaster,
    session: Mutex<Option<FirebaseSession>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    profile_picture: Option<String>,
}

/// Secure Token API answer; snake_case, unlike Identity Toolkit.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseCredentialProvider {
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: IDENTITY_TOOLKIT_BASE.to_string(),
            token_url: SECURE_TOKEN_BASE.to_string(),
            broadcaster: IdentityBroadcaster::new(),
            session: Mutex::new(None),
        }
    }

    /// Point at a different host, e.g. the local auth emulator at
    /// `http://127.0.0.1:9099/identitytoolkit.googleapis.com`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Point the token refresh at a different host, e.g. the auth emulator at
    /// `http://127.0.0.1:9099/securetoken.googleapis.com`.
    #[must_use]
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into().trim_end_matches('/').to_string();
        self
    }

    /// ID token of the signed-in user, for authorizing profile store reads.
    #[must_use]
    pub fn id_token(&self) -> Option<String> {
        self.lock_session().as_ref().map(|s| s.id_token.clone())
    }

    #[must_use]
    pub fn session(&self) -> Option<FirebaseSession> {
        self.lock_session().clone()
    }

    /// Exchange the refresh token for a new ID token.
    ///
    /// Republishes the current identity, so subscribers see a token-refresh
    /// event for the same uid.
    ///
    /// # Errors
    ///
    /// `auth/user-token-expired` when nobody is signed in, otherwise the
    /// mapped Secure Token API error.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let Some(refresh_token) = self.session().map(|s| s.refresh_token) else {
            return Err(AuthError::new(
                AuthErrorCode::Other("auth/user-token-expired".into()),
                "no session to refresh",
            ));
        };

        let url = format!("{}/v1/token?key={}", self.token_url, self.api_key);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token,
            }))
            .send()
            .await
            .map_err(|e| AuthError::network(format!("refresh token: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(%status, "secure token api rejected refresh");
            return Err(rest_error(&body));
        }

        let parsed: RefreshResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::network(format!("parse refresh response: {e}")))?;
        let uid = parsed.user_id.clone();
        *self.lock_session() = Some(refreshed_session(parsed, Utc::now()));
        tracing::debug!(uid = %uid, "id token refreshed");

        if let Some(identity) = self.broadcaster.current().filter(|i| i.uid == uid) {
            self.broadcaster.publish(Some(identity));
        }
        Ok(())
    }

    /// The ID token, refreshed first if it is about to expire.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::refresh`] failures.
    pub async fn fresh_id_token(&self) -> Result<Option<String>, AuthError> {
        let expired = self.session().is_some_and(|s| s.is_expired(Utc::now()));
        if expired {
            self.refresh().await?;
        }
        Ok(self.id_token())
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<FirebaseSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CredentialProvider for FirebaseCredentialProvider {
    fn on_identity_change(&self) -> IdentityStream {
        self.broadcaster.subscribe()
    }

    fn current_identity(&self) -> Option<Identity> {
        self.broadcaster.current()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let url = format!(
            "{}/v1/accounts:signInWithPassword?key={}",
            self.base_url, self.api_key
        );
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| AuthError::network(format!("sign in: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(%status, "identity toolkit rejected sign-in");
            return Err(rest_error(&body));
        }

        let parsed: SignInResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::network(format!("parse sign-in response: {e}")))?;
        let (identity, session) = into_session(parsed, Utc::now());

        *self.lock_session() = Some(session);
        tracing::info!(uid = %identity.uid, "signed in with password");
        self.broadcaster.publish(Some(identity));
        Ok(())
    }

    async fn sign_in_with_google(&self) -> Result<(), AuthError> {
        Err(AuthError::unsupported("Google sign-in needs a browser popup"))
    }

    async fn sign_in_with_github(&self) -> Result<(), AuthError> {
        Err(AuthError::unsupported("GitHub sign-in needs a browser popup"))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        // ID tokens are stateless; signing out only forgets them locally.
        *self.lock_session() = None;
        self.broadcaster.publish(None);
        Ok(())
    }
}

/// Absolute expiry for an `expiresIn` value in seconds.
///
/// Missing, non-positive or out-of-range values fall back to one hour.
fn expiry(now: DateTime<Utc>, expires_in: &str) -> DateTime<Utc> {
    expires_in
        .parse::<i64>()
        .ok()
        .filter(|secs| *secs > 0)
        .and_then(TimeDelta::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .or_else(|| now.checked_add_signed(DEFAULT_TOKEN_LIFETIME))
        .unwrap_or(now)
}

fn refreshed_session(resp: RefreshResponse, now: DateTime<Utc>) -> FirebaseSession {
    FirebaseSession {
        expires_at: expiry(now, &resp.expires_in),
        id_token: resp.id_token,
        refresh_token: resp.refresh_token,
    }
}

fn into_session(resp: SignInResponse, now: DateTime<Utc>) -> (Identity, FirebaseSession) {
    let mut identity = Identity::new(resp.local_id, ProviderKind::Password);
    identity.display_name = resp.display_name.filter(|n| !n.is_empty());
    identity.photo_url = resp.profile_picture.filter(|p| !p.is_empty());

    let session = FirebaseSession {
        expires_at: expiry(now, &resp.expires_in),
        id_token: resp.id_token,
        refresh_token: resp.refresh_token,
    };
    (identity, session)
}

/// Map an Identity Toolkit error body onto an `auth/*` code.
///
/// Messages look like `INVALID_PASSWORD` or
/// `TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been ...`.
fn rest_error(body: &str) -> AuthError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|env| env.error.message)
        .unwrap_or_else(|_| body.to_string());
    let reason = message
        .split([' ', ':'])
        .next()
        .unwrap_or_default()
        .to_string();

    let code = match reason.as_str() {
        "INVALID_PASSWORD" => AuthErrorCode::WrongPassword,
        "EMAIL_NOT_FOUND" => AuthErrorCode::UserNotFound,
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => AuthErrorCode::InvalidCredential,
        "USER_DISABLED" => AuthErrorCode::UserDisabled,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthErrorCode::TooManyRequests,
        "" => AuthErrorCode::Other("auth/internal-error".into()),
        other => AuthErrorCode::Other(format!(
            "auth/{}",
            other.to_ascii_lowercase().replace('_', "-")
        )),
    };
    AuthError::new(code, message)
}
