//! In-process stand-ins for the identity and verification backends.
//!
//! Used by the `tether` binary and by tests that want realistic latency
//! without a network.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::time::Duration;
use tether_core::{Role, Session, UserId};

use crate::config::SimulationConfig;
use crate::effects::{
    AuthError, Credentials, RoleLookup, RoleLookupError, SessionProvider, StepVerifier,
    VerifyError,
};
use crate::funnel::StepId;

/// Session store and role directory in one.
///
/// Any non-empty password signs in; users listed as admins get [`Role::Admin`].
#[derive(Debug)]
pub struct SimulatedAuth {
    session: Mutex<Session>,
    admins: HashSet<UserId>,
    latency: Duration,
    fail_lookups: bool,
}

impl SimulatedAuth {
    /// Build from explicit settings.
    pub fn new<I, U>(admins: I, latency: Duration) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UserId>,
    {
        Self {
            session: Mutex::new(Session::anonymous()),
            admins: admins.into_iter().map(Into::into).collect(),
            latency,
            fail_lookups: false,
        }
    }

    /// Build from the `[simulation]` config section.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            config.admin_users.iter().map(|u| UserId::new(u.clone())),
            Duration::from_millis(config.lookup_latency_ms),
        )
        .with_failing_lookups(config.fail_role_lookup)
    }

    /// Make every role lookup return an error.
    pub fn with_failing_lookups(mut self, fail: bool) -> Self {
        self.fail_lookups = fail;
        self
    }

    /// Sign in without credentials
    pub fn force_session(&self, user_id: UserId) -> Session {
        let role = self.role_of(&user_id);
        let session = Session::authenticated(user_id, role);
        *self.session.lock() = session.clone();
        session
    }

    fn role_of(&self, user_id: &UserId) -> Role {
        if self.admins.contains(user_id) {
            Role::Admin
        } else {
            Role::User
        }
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl SessionProvider for SimulatedAuth {
    fn current_session(&self) -> Session {
        self.session.lock().clone()
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<Session, AuthError> {
        self.pause().await;
        if credentials.user_id.as_str().is_empty() || credentials.password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        tracing::info!(user = %credentials.user_id, "signed in");
        Ok(self.force_session(credentials.user_id))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.session.lock() = Session::anonymous();
        tracing::info!("signed out");
        Ok(())
    }
}

#[async_trait]
impl RoleLookup for SimulatedAuth {
    async fn is_admin_user(&self, user_id: &UserId) -> Result<bool, RoleLookupError> {
        self.pause().await;
        if self.fail_lookups {
            return Err(RoleLookupError::Unavailable("simulated outage".to_string()));
        }
        Ok(self.admins.contains(user_id))
    }
}

/// Accepts every submission after a delay.
pub struct SimulatedVerifier<I> {
    latency: Duration,
    _input: PhantomData<fn(&I)>,
}

impl<I> SimulatedVerifier<I> {
    /// Verifier answering after `latency`
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            _input: PhantomData,
        }
    }
}

#[async_trait]
impl<I> StepVerifier<I> for SimulatedVerifier<I>
where
    I: Send + Sync + 'static,
{
    async fn verify(&self, step: StepId, _input: &I) -> Result<bool, VerifyError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        tracing::debug!(%step, "simulated verification accepted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_assigns_role() {
        let auth = SimulatedAuth::new(["root"], Duration::ZERO);

        let session = auth
            .sign_in(Credentials {
                user_id: UserId::from("root"),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(session.role(), Role::Admin);
        assert_eq!(auth.current_session(), session);

        auth.sign_out().await.unwrap();
        assert!(!auth.current_session().is_authenticated());
    }

    #[tokio::test]
    async fn test_empty_password_rejected() {
        let auth = SimulatedAuth::new(Vec::<UserId>::new(), Duration::ZERO);
        let result = auth
            .sign_in(Credentials {
                user_id: UserId::from("kim"),
                password: String::new(),
            })
            .await;
        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_role_lookup() {
        let auth = SimulatedAuth::new(["root"], Duration::ZERO);
        assert_eq!(auth.is_admin_user(&UserId::from("root")).await, Ok(true));
        assert_eq!(auth.is_admin_user(&UserId::from("kim")).await, Ok(false));

        let failing = SimulatedAuth::new(["root"], Duration::ZERO).with_failing_lookups(true);
        assert!(failing.is_admin_user(&UserId::from("root")).await.is_err());
    }
}
