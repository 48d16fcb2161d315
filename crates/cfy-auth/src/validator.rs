//! Login form validation.
//!
//! Pure and synchronous. Email is checked before password and only the first
//! failure is reported.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MIN_PASSWORD_LEN: usize = 8;

/// Characters allowed in the local part of an address, besides ASCII alphanumerics.
const LOCAL_PART_SYMBOLS: &str = ".!#$%&'*+/=?^_`{|}~-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Email,
    Password,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Not a valid email")]
    InvalidEmail,

    #[error("Password is too short, must be at least 8 characters")]
    PasswordTooShort,
}

impl ValidationError {
    #[must_use]
    pub const fn field(self) -> FormField {
        match self {
            Self::InvalidEmail => FormField::Email,
            Self::PasswordTooShort => FormField::Password,
        }
    }
}

/// What the visitor typed into the login form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FormData {
    pub email: String,
    pub password: String,
}

impl FormData {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// The credentials that actually get submitted.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self::new(self.email.trim(), self.password.trim())
    }
}

/// Per-field inline error messages. Empty string means no error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    pub email: String,
    pub password: String,
}

impl FormErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_empty() && self.password.is_empty()
    }
}

impl From<ValidationError> for FormErrors {
    fn from(error: ValidationError) -> Self {
        let mut errors = Self::default();
        match error.field() {
            FormField::Email => errors.email = error.to_string(),
            FormField::Password => errors.password = error.to_string(),
        }
        errors
    }
}

/// Result of one validation pass over the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormReport {
    pub valid: bool,
    pub errors: FormErrors,
    #[serde(skip)]
    pub first_error: Option<ValidationError>,
}

/// Check an email address against the login form's grammar.
///
/// ```text
/// local@label(.label)*
/// local = [A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+
/// label = [A-Za-z0-9-]+
/// ```
///
/// # Errors
///
/// Returns `ValidationError::InvalidEmail` when the trimmed input does not match.
pub fn validate_email(input: &str) -> Result<(), ValidationError> {
    let Some((local, domain)) = input.trim().split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };

    let local_ok = !local.is_empty() && local.chars().all(is_local_part_char);
    let domain_ok = domain.split('.').all(|label| {
        !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    if local_ok && domain_ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// # Errors
///
/// Returns `ValidationError::PasswordTooShort` when the trimmed input is
/// shorter than 8 UTF-16 code units, the unit browsers count in.
pub fn validate_password(input: &str) -> Result<(), ValidationError> {
    if input.trim().encode_utf16().count() < MIN_PASSWORD_LEN {
        Err(ValidationError::PasswordTooShort)
    } else {
        Ok(())
    }
}

/// Validate the whole form, short-circuiting on the first failing field.
#[must_use]
pub fn validate_form(data: &FormData) -> FormReport {
    let result = validate_email(&data.email).and_then(|()| validate_password(&data.password));
    match result {
        Ok(()) => FormReport {
            valid: true,
            errors: FormErrors::default(),
            first_error: None,
        },
        Err(error) => FormReport {
            valid: false,
            errors: error.into(),
            first_error: Some(error),
        },
    }
}

fn is_local_part_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || LOCAL_PART_SYMBOLS.contains(c)
}
