use std::fmt;

use thiserror::Error;

/// Credential provider error codes the login page knows how to word.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    WrongPassword,
    UserNotFound,
    InvalidCredential,
    AccountExistsWithDifferentCredential,
    PopupClosedByUser,
    NetworkRequestFailed,
    TooManyRequests,
    UserDisabled,
    OperationNotSupported,
    /// A provider code this crate has no name for, kept verbatim.
    Other(String),
}

impl AuthErrorCode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::WrongPassword => "auth/wrong-password",
            Self::UserNotFound => "auth/user-not-found",
            Self::InvalidCredential => "auth/invalid-credential",
            Self::AccountExistsWithDifferentCredential => {
                "auth/account-exists-with-different-credential"
            }
            Self::PopupClosedByUser => "auth/popup-closed-by-user",
            Self::NetworkRequestFailed => "auth/network-request-failed",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::UserDisabled => "auth/user-disabled",
            Self::OperationNotSupported => "auth/operation-not-supported-in-this-environment",
            Self::Other(code) => code,
        }
    }

    /// Parse an `auth/*` code string.
    #[must_use]
    pub fn parse(code: &str) -> Self {
        match code {
            "auth/wrong-password" => Self::WrongPassword,
            "auth/user-not-found" => Self::UserNotFound,
            "auth/invalid-credential" => Self::InvalidCredential,
            "auth/account-exists-with-different-credential" => {
                Self::AccountExistsWithDifferentCredential
            }
            "auth/popup-closed-by-user" => Self::PopupClosedByUser,
            "auth/network-request-failed" => Self::NetworkRequestFailed,
            "auth/too-many-requests" => Self::TooManyRequests,
            "auth/user-disabled" => Self::UserDisabled,
            "auth/operation-not-supported-in-this-environment" => Self::OperationNotSupported,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed credential provider call. Recoverable by resubmitting.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} ({code})")]
pub struct AuthError {
    pub code: AuthErrorCode,
    pub message: String,
}

impl AuthError {
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::NetworkRequestFailed, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::OperationNotSupported, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_parse_back() {
        for code in [
            AuthErrorCode::WrongPassword,
            AuthErrorCode::AccountExistsWithDifferentCredential,
            AuthErrorCode::PopupClosedByUser,
            AuthErrorCode::OperationNotSupported,
        ] {
            assert_eq!(AuthErrorCode::parse(code.as_str()), code);
        }
    }

    #[test]
    fn unknown_code_is_kept_verbatim() {
        let code = AuthErrorCode::parse("auth/quota-exceeded");
        assert_eq!(code, AuthErrorCode::Other("auth/quota-exceeded".into()));
        assert_eq!(code.as_str(), "auth/quota-exceeded");
    }

    #[test]
    fn display_includes_code() {
        let err = AuthError::new(AuthErrorCode::WrongPassword, "wrong password");
        assert_eq!(err.to_string(), "wrong password (auth/wrong-password)");
    }
}
