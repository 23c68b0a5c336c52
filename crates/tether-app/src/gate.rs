//! # Access Gate
//!
//! Authorization checkpoint in front of the admin screen subtree.
//!
//! ```text
//! Unchecked ──request──▶ Checking ──lookup true──▶ Allowed
//!     │                      ├──lookup false─▶ Denied(PermissionDenied)
//!     │                      └──lookup error─▶ Denied(CheckFailed)
//!     └──request, no session──────────────────▶ Denied(AuthRequired)
//! ```
//!
//! The gate fails closed: a lookup that errors is a denial, never a stuck
//! `Checking`. Only one lookup runs per gate at a time; a duplicate `request`
//! while `Checking` is ignored, and `reset` discards whatever the in-flight
//! lookup eventually returns. Dropping a `request` future mid-lookup settles
//! the gate to `Denied(CheckFailed)` so a later request can run again.

use parking_lot::Mutex;
use std::sync::Arc;
use tether_core::{AccessDenial, Session};
use tokio::sync::watch;

use crate::effects::RoleLookup;

/// Gate state exposed to the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GateState {
    /// No check requested yet
    #[default]
    Unchecked,
    /// Role lookup in flight
    Checking,
    /// Admin subtree may render
    Allowed,
    /// Access denied screen
    Denied,
}

impl GateState {
    /// Check if the gate reached a decision
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Allowed | Self::Denied)
    }
}

struct GateInner {
    state: GateState,
    denial: Option<AccessDenial>,
    epoch: u64,
}

/// Admin access gate.
pub struct AccessGate {
    lookup: Arc<dyn RoleLookup>,
    inner: Mutex<GateInner>,
    updates: watch::Sender<GateState>,
}

impl AccessGate {
    /// Create an unchecked gate backed by a role lookup service.
    pub fn new(lookup: Arc<dyn RoleLookup>) -> Self {
        let (updates, _) = watch::channel(GateState::Unchecked);
        Self {
            lookup,
            inner: Mutex::new(GateInner {
                state: GateState::Unchecked,
                denial: None,
                epoch: 0,
            }),
            updates,
        }
    }

    /// Current state
    pub fn state(&self) -> GateState {
        self.inner.lock().state
    }

    /// Reason for the current denial, if denied
    pub fn denial(&self) -> Option<AccessDenial> {
        self.inner.lock().denial.clone()
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.updates.subscribe()
    }

    /// Run the authorization check for `session`.
    ///
    /// Returns the state the gate is in once this call is done with it.
    pub async fn request(&self, session: &Session) -> GateState {
        let (epoch, user_id) = {
            let mut inner = self.inner.lock();
            if inner.state == GateState::Checking {
                tracing::debug!("admin check already in flight; ignoring duplicate request");
                return GateState::Checking;
            }

            inner.epoch += 1;
            let Some(user_id) = session.user_id().cloned() else {
                tracing::info!("admin access denied: no session");
                self.settle(&mut inner, Err(AccessDenial::AuthRequired));
                return inner.state;
            };

            inner.state = GateState::Checking;
            inner.denial = None;
            self.updates.send_replace(GateState::Checking);
            (inner.epoch, user_id)
        };

        tracing::debug!(user = %user_id, "checking admin role");
        let mut pending = PendingCheck { gate: self, epoch, armed: true };
        let result = self.lookup.is_admin_user(&user_id).await;
        pending.armed = false;

        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            tracing::debug!(user = %user_id, "discarding admin check for a reset gate");
            return inner.state;
        }

        let decision = match result {
            Ok(true) => Ok(()),
            Ok(false) => Err(AccessDenial::PermissionDenied),
            Err(error) => {
                tracing::warn!(user = %user_id, %error, "role lookup failed; denying admin access");
                Err(AccessDenial::CheckFailed {
                    reason: error.to_string(),
                })
            }
        };
        self.settle(&mut inner, decision);
        tracing::info!(user = %user_id, state = ?inner.state, "admin access decided");
        inner.state
    }

    /// Return to `Unchecked`, abandoning any in-flight check.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        inner.state = GateState::Unchecked;
        inner.denial = None;
        self.updates.send_replace(GateState::Unchecked);
    }

    fn settle(&self, inner: &mut GateInner, decision: Result<(), AccessDenial>) {
        match decision {
            Ok(()) => {
                inner.state = GateState::Allowed;
                inner.denial = None;
            }
            Err(denial) => {
                inner.state = GateState::Denied;
                inner.denial = Some(denial);
            }
        }
        self.updates.send_replace(inner.state);
    }
}

/// Settles the gate if a `request` future is dropped mid-lookup.
struct PendingCheck<'a> {
    gate: &'a AccessGate,
    epoch: u64,
    armed: bool,
}

impl Drop for PendingCheck<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.gate.inner.lock();
        if inner.epoch == self.epoch && inner.state == GateState::Checking {
            tracing::warn!("admin check cancelled before the role lookup answered; denying");
            self.gate.settle(
                &mut inner,
                Err(AccessDenial::CheckFailed {
                    reason: "check cancelled".to_string(),
                }),
            );
        }
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("AccessGate")
            .field("state", &inner.state)
            .field("denial", &inner.denial)
            .finish_non_exhaustive()
    }
}
