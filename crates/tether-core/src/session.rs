//! Session model consumed by the access gate.
//!
//! Sessions are created and destroyed by the external auth provider; the
//! navigation core only reads them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier issued by the auth provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a provider-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Role carried by a session.
///
/// Informational only: admin access is always confirmed through the role
/// lookup, never taken from the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// No session
    #[default]
    None,
    /// Regular member
    User,
    /// Platform administrator
    Admin,
}

/// Current authentication state.
///
/// Invariant: `is_authenticated()` holds exactly when a user id is present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    user_id: Option<UserId>,
    role: Role,
}

impl Session {
    /// Signed-out session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Signed-in session.
    pub fn authenticated(user_id: UserId, role: Role) -> Self {
        Self {
            user_id: Some(user_id),
            role,
        }
    }

    /// Check if a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Signed-in user, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Role reported by the auth provider.
    pub fn role(&self) -> Role {
        if self.is_authenticated() {
            self.role
        } else {
            Role::None
        }
    }
}
