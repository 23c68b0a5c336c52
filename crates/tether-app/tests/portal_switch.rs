#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! # Portal Switch
//!
//! Portal selection, admin gating through bootstrap and isolation of the two
//! portals' navigation state.

mod support;

use std::sync::Arc;
use support::{signed_in, CountingLookup};
use tether_app::{PortalConfig, PortalError, PortalMode, PortalSwitch, PortalView, RoleLookupError};
use tether_core::{AccessDenial, BackOutcome, NavigationConfig, Portal, Screen, Session};

fn switch(lookup: Arc<CountingLookup>) -> PortalSwitch {
    PortalSwitch::new(lookup, PortalConfig::default(), NavigationConfig::default())
}

#[tokio::test]
async fn bootstrap_admin_query_is_still_gated() {
    let lookup = CountingLookup::new(Ok(false));
    let mut portal = switch(lookup.clone());

    let view = portal
        .bootstrap(Some("?portal=admin"), &Session::anonymous())
        .await;
    assert_eq!(view, PortalView::AccessDenied(AccessDenial::AuthRequired));
    assert_eq!(lookup.calls(), 0);

    let view = portal.bootstrap(Some("portal=admin"), &signed_in("kim")).await;
    assert_eq!(view, PortalView::AccessDenied(AccessDenial::PermissionDenied));
    assert_eq!(lookup.calls(), 1);
}

#[tokio::test]
async fn bootstrap_admin_for_admin_user() {
    let lookup = CountingLookup::new(Ok(true));
    let mut portal = switch(lookup);

    let view = portal
        .bootstrap(Some("lang=en&portal=admin"), &signed_in("root"))
        .await;
    assert_eq!(view, PortalView::Admin(Screen::AdminDashboard));
    assert_eq!(portal.mode(), PortalMode::Admin);
}

#[tokio::test]
async fn bootstrap_without_admin_shows_chooser() {
    let lookup = CountingLookup::new(Ok(true));
    let mut portal = switch(lookup.clone());

    assert_eq!(portal.bootstrap(None, &signed_in("root")).await, PortalView::Chooser);
    assert_eq!(
        portal.bootstrap(Some("portal=user"), &signed_in("root")).await,
        PortalView::Chooser
    );
    assert_eq!(lookup.calls(), 0);
}

#[tokio::test]
async fn histories_do_not_leak_between_portals() {
    let lookup = CountingLookup::new(Ok(true));
    let mut portal = switch(lookup);
    let session = signed_in("root");

    portal.enter_user(&session);
    portal.navigate(Screen::RentalHome, None).unwrap();
    portal.navigate(Screen::FriendList, None).unwrap();
    portal.navigate(Screen::UserProfile, None).unwrap();

    portal.enter_admin(&session).await;
    let nav = portal.navigation().unwrap();
    assert_eq!(nav.current(), Screen::AdminDashboard);
    assert_eq!(nav.history_len(), 0);
    assert_eq!(portal.back(), Ok(BackOutcome::Noop));

    portal.enter_user(&session);
    let nav = portal.navigation().unwrap();
    assert_eq!(nav.current(), Screen::Home);
    assert_eq!(nav.history_len(), 0);
    assert_eq!(nav.context_for(Screen::UserProfile), None);
}

#[tokio::test]
async fn cross_portal_navigation_rejected() {
    let lookup = CountingLookup::new(Ok(true));
    let mut portal = switch(lookup);
    let session = signed_in("root");

    portal.enter_user(&session);
    assert_eq!(
        portal.navigate(Screen::AdminUsers, None),
        Err(PortalError::ScreenOutsidePortal {
            screen: Screen::AdminUsers,
            portal: Portal::User,
        })
    );
    assert_eq!(portal.view(), PortalView::User(Screen::Home));

    portal.enter_admin(&session).await;
    assert_eq!(
        portal.navigate(Screen::Home, None),
        Err(PortalError::ScreenOutsidePortal {
            screen: Screen::Home,
            portal: Portal::Admin,
        })
    );
    assert_eq!(portal.view(), PortalView::Admin(Screen::AdminDashboard));
}

#[tokio::test]
async fn lookup_outage_shows_access_denied_with_return() {
    let lookup = CountingLookup::new(Err(RoleLookupError::Timeout));
    let mut portal = switch(lookup);

    portal.enter_admin(&signed_in("root")).await;
    assert!(matches!(
        portal.view(),
        PortalView::AccessDenied(AccessDenial::CheckFailed { .. })
    ));
    assert_eq!(portal.back(), Err(PortalError::AdminLocked));

    portal.return_to_chooser();
    assert_eq!(portal.view(), PortalView::Chooser);
    assert_eq!(portal.mode(), PortalMode::None);
}

#[tokio::test]
async fn sign_out_clears_portal_state() {
    let lookup = CountingLookup::new(Ok(true));
    let mut portal = switch(lookup);

    portal.enter_admin(&signed_in("root")).await;
    portal.navigate(Screen::AdminReports, None).unwrap();
    portal.handle_sign_out();

    assert_eq!(portal.view(), PortalView::Chooser);
    assert!(portal.navigation().is_none());
    assert!(portal.admin_gate().is_none());
}
