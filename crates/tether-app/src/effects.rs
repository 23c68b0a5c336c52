//! External collaborator interfaces
//!
//! The controllers in this crate never talk to a backend directly. Identity,
//! role lookup and step verification are injected through these traits so the
//! host can wire real services and tests can wire recording mocks.

use async_trait::async_trait;
use tether_core::{Session, UserId};
use thiserror::Error;

use crate::funnel::StepId;

/// Failure of the role lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleLookupError {
    /// Service unreachable or returned an error
    #[error("role service unavailable: {0}")]
    Unavailable(String),
    /// No answer in time
    #[error("role lookup timed out")]
    Timeout,
}

/// Failure of an external step verification call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Verification backend unreachable or returned an error
    #[error("verification service unavailable: {0}")]
    Unavailable(String),
}

/// Failure of the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Credentials rejected
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Provider unreachable
    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}

/// Credentials presented at sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account identifier
    pub user_id: UserId,
    /// Secret
    pub password: String,
}

/// Session/auth provider.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Snapshot of the current session
    fn current_session(&self) -> Session;

    /// Create a session
    async fn sign_in(&self, credentials: Credentials) -> Result<Session, AuthError>;

    /// Destroy the current session
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Role lookup service consulted by the access gate.
#[async_trait]
pub trait RoleLookup: Send + Sync {
    /// Check whether a user holds the admin role
    async fn is_admin_user(&self, user_id: &UserId) -> Result<bool, RoleLookupError>;
}

/// External check run after a funnel step's local predicate passes.
#[async_trait]
pub trait StepVerifier<I>: Send + Sync {
    /// Confirm a submission; `Ok(false)` rejects it
    async fn verify(&self, step: StepId, input: &I) -> Result<bool, VerifyError>;
}
