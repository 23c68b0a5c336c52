#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! # Access Gate
//!
//! Lifecycle of the admin access gate against mocked role lookups.

mod support;

use assert_matches::assert_matches;
use support::{signed_in, CountingLookup, GatedLookup};
use tether_app::{AccessGate, GateState, RoleLookupError};
use tether_core::{AccessDenial, Session};

#[tokio::test]
async fn anonymous_request_denied_without_lookup() {
    let lookup = CountingLookup::new(Ok(true));
    let gate = AccessGate::new(lookup.clone());

    assert_eq!(gate.request(&Session::anonymous()).await, GateState::Denied);
    assert_eq!(gate.denial(), Some(AccessDenial::AuthRequired));
    assert_eq!(lookup.calls(), 0);
}

#[tokio::test]
async fn admin_passes_through_checking() {
    let (lookup, release) = GatedLookup::new();
    let gate = AccessGate::new(lookup.clone());
    let mut updates = gate.subscribe();
    assert_eq!(gate.state(), GateState::Unchecked);

    let session = signed_in("root");
    let mut pending = Box::pin(gate.request(&session));
    assert!(futures::poll!(pending.as_mut()).is_pending());
    assert_eq!(gate.state(), GateState::Checking);
    assert_eq!(*updates.borrow_and_update(), GateState::Checking);

    release.send(Ok(true)).unwrap();
    assert_eq!(pending.await, GateState::Allowed);
    assert_eq!(*updates.borrow_and_update(), GateState::Allowed);
    assert_eq!(gate.denial(), None);
    assert_eq!(lookup.calls(), 1);
}

#[tokio::test]
async fn lookup_failure_fails_closed() {
    let lookup = CountingLookup::new(Err(RoleLookupError::Unavailable("503".to_string())));
    let gate = AccessGate::new(lookup.clone());

    assert_eq!(gate.request(&signed_in("root")).await, GateState::Denied);
    assert_matches!(
        gate.denial(),
        Some(AccessDenial::CheckFailed { reason }) if reason.contains("503")
    );
    assert_eq!(lookup.calls(), 1);
}

#[tokio::test]
async fn duplicate_request_while_checking_is_ignored() {
    let (lookup, release) = GatedLookup::new();
    let gate = AccessGate::new(lookup.clone());
    let session = signed_in("root");

    let mut first = Box::pin(gate.request(&session));
    assert!(futures::poll!(first.as_mut()).is_pending());

    assert_eq!(gate.request(&session).await, GateState::Checking);
    assert_eq!(gate.request(&session).await, GateState::Checking);

    release.send(Ok(false)).unwrap();
    assert_eq!(first.await, GateState::Denied);
    assert_eq!(gate.denial(), Some(AccessDenial::PermissionDenied));
    assert_eq!(lookup.calls(), 1);
}

#[tokio::test]
async fn reset_discards_late_result() {
    let (lookup, release) = GatedLookup::new();
    let gate = AccessGate::new(lookup);
    let session = signed_in("root");

    let mut pending = Box::pin(gate.request(&session));
    assert!(futures::poll!(pending.as_mut()).is_pending());

    gate.reset();
    release.send(Ok(true)).unwrap();

    assert_eq!(pending.await, GateState::Unchecked);
    assert_eq!(gate.state(), GateState::Unchecked);
    assert_eq!(gate.denial(), None);
}

#[tokio::test]
async fn settled_gate_can_be_rechecked() {
    let lookup = CountingLookup::new(Ok(false));
    let gate = AccessGate::new(lookup.clone());

    assert_eq!(gate.request(&signed_in("kim")).await, GateState::Denied);
    assert_eq!(gate.request(&signed_in("kim")).await, GateState::Denied);
    assert_eq!(lookup.calls(), 2);
}

#[tokio::test]
async fn dropped_request_does_not_leave_gate_checking() {
    let (lookup, _release) = GatedLookup::new();
    let gate = AccessGate::new(lookup.clone());
    let session = signed_in("root");

    let mut abandoned = Box::pin(gate.request(&session));
    assert!(futures::poll!(abandoned.as_mut()).is_pending());
    assert_eq!(gate.state(), GateState::Checking);
    drop(abandoned);

    assert_eq!(gate.state(), GateState::Denied);
    assert_matches!(gate.denial(), Some(AccessDenial::CheckFailed { .. }));

    // The next request runs a fresh lookup
    assert_eq!(gate.request(&session).await, GateState::Allowed);
    assert_eq!(lookup.calls(), 2);
}

#[tokio::test]
async fn request_abandoned_by_timeout_can_be_retried() {
    let (lookup, _release) = GatedLookup::new();
    let gate = AccessGate::new(lookup.clone());
    let session = signed_in("root");

    let timed_out =
        tokio::time::timeout(std::time::Duration::from_millis(10), gate.request(&session)).await;
    assert!(timed_out.is_err());
    assert_ne!(gate.state(), GateState::Checking);

    assert_eq!(gate.request(&session).await, GateState::Allowed);
    assert_eq!(lookup.calls(), 2);
}
