//! Sign-in button group state machine.
//!
//! ```text
//! idle → submitting → idle (failure, error recorded)
//!                   → navigated (success; the session resolver redirects)
//! ```
//!
//! One submission may be in flight per form. A submit while `Submitting`
//! returns [`SubmitOutcome::Ignored`] without reaching the provider.

use std::sync::{Mutex, MutexGuard, PoisonError};

use cfy_core::ProviderKind;
use serde::Serialize;

use crate::actions::AuthActions;
use crate::error::AuthError;
use crate::validator::{FormData, FormErrors, ValidationError, validate_form};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    Idle,
    Submitting,
    Navigated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; no auth call was made.
    Invalid(ValidationError),
    /// Another submission is in flight, or the form already navigated.
    Ignored,
    Failed(AuthError),
    SignedIn,
}

#[derive(Debug)]
struct FormInner {
    status: FormStatus,
    errors: FormErrors,
    auth_error: Option<AuthError>,
}

#[derive(Debug)]
pub struct SignInForm {
    actions: AuthActions,
    inner: Mutex<FormInner>,
}

/// Holds the form in `Submitting`. If dropped before [`Self::finish`]
/// (the submitting future was cancelled) the form goes back to `Idle`.
struct InFlight<'a> {
    form: &'a SignInForm,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self, result: &Result<(), AuthError>) {
        self.finished = true;
        let mut inner = self.form.lock();
        match result {
            Ok(()) => {
                inner.status = FormStatus::Navigated;
                inner.auth_error = None;
            }
            Err(error) => {
                inner.status = FormStatus::Idle;
                inner.auth_error = Some(error.clone());
            }
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let mut inner = self.form.lock();
            if inner.status == FormStatus::Submitting {
                inner.status = FormStatus::Idle;
            }
        }
    }
}

impl SignInForm {
    pub fn new(actions: AuthActions) -> Self {
        Self {
            actions,
            inner: Mutex::new(FormInner {
                status: FormStatus::Idle,
                errors: FormErrors::default(),
                auth_error: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn status(&self) -> FormStatus {
        self.lock().status
    }

    /// Inline field errors from the last validation pass.
    #[must_use]
    pub fn errors(&self) -> FormErrors {
        self.lock().errors.clone()
    }

    /// Error from the last failed auth call, for the banner.
    #[must_use]
    pub fn auth_error(&self) -> Option<AuthError> {
        self.lock().auth_error.clone()
    }

    /// Validate and submit email/password credentials (trimmed).
    pub async fn submit_password(&self, data: &FormData) -> SubmitOutcome {
        if self.status() != FormStatus::Idle {
            return SubmitOutcome::Ignored;
        }

        let report = validate_form(data);
        {
            let mut inner = self.lock();
            inner.errors = report.errors;
        }
        if let Some(error) = report.first_error {
            return SubmitOutcome::Invalid(error);
        }

        let Some(flight) = self.begin() else {
            return SubmitOutcome::Ignored;
        };
        let creds = data.trimmed();
        let result = self.actions.sign_in(&creds.email, &creds.password).await;
        Self::settle(flight, result)
    }

    pub async fn submit_federated(&self, provider: ProviderKind) -> SubmitOutcome {
        let Some(flight) = self.begin() else {
            return SubmitOutcome::Ignored;
        };
        let result = match provider {
            ProviderKind::Google => self.actions.authenticate_with_google().await,
            ProviderKind::Github => self.actions.authenticate_with_github().await,
            ProviderKind::Password => Err(AuthError::unsupported(
                "password sign-in goes through submit_password",
            )),
        };
        Self::settle(flight, result)
    }

    fn begin(&self) -> Option<InFlight<'_>> {
        let mut inner = self.lock();
        if inner.status != FormStatus::Idle {
            return None;
        }
        inner.status = FormStatus::Submitting;
        inner.auth_error = None;
        drop(inner);
        Some(InFlight {
            form: self,
            finished: false,
        })
    }

    fn settle(flight: InFlight<'_>, result: Result<(), AuthError>) -> SubmitOutcome {
        flight.finish(&result);
        match result {
            Ok(()) => SubmitOutcome::SignedIn,
            Err(error) => SubmitOutcome::Failed(error),
        }
    }
}
