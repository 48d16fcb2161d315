//! # cfy-auth
//!
//! Authentication boundary for Compifly.
//!
//! Provides the `CredentialProvider` trait (identity-change subscription plus
//! email/password, Google and GitHub sign-in), an in-memory provider for tests
//! and offline runs, a Firebase Identity Toolkit REST provider, the pure login
//! form validator, and the `SignInForm` submission state machine.

pub mod actions;
pub mod error;
pub mod firebase;
pub mod form;
pub mod memory;
pub mod provider;
pub mod validator;

pub use actions::AuthActions;
pub use error::{AuthError, AuthErrorCode};
pub use firebase::FirebaseCredentialProvider;
pub use form::{FormStatus, SignInForm, SubmitOutcome};
pub use memory::MemoryCredentialProvider;
pub use provider::{CredentialProvider, IdentityBroadcaster, IdentityChange, IdentityStream};
pub use validator::{
    FormData, FormErrors, FormField, FormReport, ValidationError, validate_email,
    validate_form, validate_password,
};
