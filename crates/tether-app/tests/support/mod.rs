//! Shared collaborator mocks for tether-app integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tether_app::{FunnelInput, RoleLookup, RoleLookupError, StepId, StepVerifier, VerifyError};
use tether_core::{Role, Session, UserId};
use tokio::sync::oneshot;

pub fn signed_in(user: &str) -> Session {
    Session::authenticated(UserId::from(user), Role::User)
}

// ============================================================================
// Role lookup
// ============================================================================

/// Answers immediately and counts calls.
pub struct CountingLookup {
    answer: Result<bool, RoleLookupError>,
    calls: AtomicUsize,
}

impl CountingLookup {
    pub fn new(answer: Result<bool, RoleLookupError>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleLookup for CountingLookup {
    async fn is_admin_user(&self, _user_id: &UserId) -> Result<bool, RoleLookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// Blocks the first lookup until the test releases it.
pub struct GatedLookup {
    release: Mutex<Option<oneshot::Receiver<Result<bool, RoleLookupError>>>>,
    calls: AtomicUsize,
}

impl GatedLookup {
    pub fn new() -> (Arc<Self>, oneshot::Sender<Result<bool, RoleLookupError>>) {
        let (tx, rx) = oneshot::channel();
        let lookup = Arc::new(Self {
            release: Mutex::new(Some(rx)),
            calls: AtomicUsize::new(0),
        });
        (lookup, tx)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleLookup for GatedLookup {
    async fn is_admin_user(&self, _user_id: &UserId) -> Result<bool, RoleLookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let release = self.release.lock().take();
        match release {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(RoleLookupError::Unavailable("released".to_string()))),
            None => Ok(true),
        }
    }
}

// ============================================================================
// Step verification
// ============================================================================

/// Same answer for every step.
pub struct ScriptedVerifier {
    answer: Result<bool, VerifyError>,
    calls: AtomicUsize,
}

impl ScriptedVerifier {
    pub fn new(answer: Result<bool, VerifyError>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StepVerifier<FunnelInput> for ScriptedVerifier {
    async fn verify(&self, _step: StepId, _input: &FunnelInput) -> Result<bool, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// Accepts every step immediately except `held`, which waits for the test.
pub struct GatedVerifier {
    held: StepId,
    release: Mutex<Option<oneshot::Receiver<bool>>>,
}

impl GatedVerifier {
    pub fn new(held: &'static str) -> (Arc<Self>, oneshot::Sender<bool>) {
        let (tx, rx) = oneshot::channel();
        let verifier = Arc::new(Self {
            held: StepId(held),
            release: Mutex::new(Some(rx)),
        });
        (verifier, tx)
    }
}

#[async_trait]
impl StepVerifier<FunnelInput> for GatedVerifier {
    async fn verify(&self, step: StepId, _input: &FunnelInput) -> Result<bool, VerifyError> {
        if step != self.held {
            return Ok(true);
        }
        let release = self.release.lock().take();
        match release {
            Some(rx) => Ok(rx.await.unwrap_or(false)),
            None => Ok(true),
        }
    }
}
