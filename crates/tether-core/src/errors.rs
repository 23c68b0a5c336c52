//! Core error types
//!
//! Navigation itself never fails; the only fallible surface in this crate is
//! parsing screen identifiers and describing why admin access was denied.

use thiserror::Error;

/// Failure to resolve a screen slug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenParseError {
    /// No screen has this slug
    #[error("unknown screen '{0}'")]
    Unknown(String),
}

/// Why the access gate resolved to `Denied`.
///
/// Every cause renders the same access-denied state; the variant is kept for
/// logging and for the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenial {
    /// Admin mode requested without a session
    #[error("sign-in required")]
    AuthRequired,
    /// Session present but the role lookup said no
    #[error("administrator privileges required")]
    PermissionDenied,
    /// The role lookup itself failed; treated as a denial
    #[error("authorization check failed: {reason}")]
    CheckFailed {
        /// Collaborator error message
        reason: String,
    },
}

impl AccessDenial {
    /// Short label for logging/display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::CheckFailed { .. } => "CHECK_FAILED",
        }
    }

    /// Message for the access-denied screen.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AuthRequired => "Sign in with an administrator account to continue",
            Self::PermissionDenied => "This account does not have access to the admin portal",
            Self::CheckFailed { .. } => "Access could not be confirmed. Try again later",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_display() {
        let denial = AccessDenial::CheckFailed {
            reason: "timeout".to_string(),
        };
        assert_eq!(denial.to_string(), "authorization check failed: timeout");
        assert_eq!(denial.label(), "CHECK_FAILED");
        assert_eq!(AccessDenial::AuthRequired.label(), "AUTH_REQUIRED");
    }
}
