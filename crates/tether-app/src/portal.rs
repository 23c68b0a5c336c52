//! # Portal Switch
//!
//! Top-level mode selection between the consumer portal and the admin portal.
//!
//! Each portal gets its own [`NavigationController`], created fresh on entry
//! and dropped on exit, so history never leaks from one portal into the other.
//! The admin portal sits behind an [`AccessGate`]: until the gate reports
//! `Allowed` there is no admin navigation controller at all, and every admin
//! navigation request is refused.

use std::sync::Arc;
use tether_core::{
    AccessDenial, BackOutcome, NavPayload, NavigationConfig, NavigationController, Portal,
    Screen, Session,
};
use thiserror::Error;

use crate::config::PortalConfig;
use crate::effects::RoleLookup;
use crate::gate::{AccessGate, GateState};

/// Which portal is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PortalMode {
    /// Portal chooser
    #[default]
    None,
    /// Consumer portal
    User,
    /// Admin portal (gated)
    Admin,
}

/// What the renderer should show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortalView {
    /// Portal chooser
    Chooser,
    /// Consumer portal at a screen
    User(Screen),
    /// Admin requested, decision not in yet
    AdminPending(GateState),
    /// Admin refused; offers a return to the chooser
    AccessDenied(AccessDenial),
    /// Admin portal at a screen
    Admin(Screen),
}

/// Navigation refused by the portal switch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortalError {
    /// No portal entered yet
    #[error("no portal is active")]
    NoActivePortal,
    /// Target belongs to the other portal
    #[error("screen '{screen}' is not part of the {portal} portal")]
    ScreenOutsidePortal {
        /// Requested screen
        screen: Screen,
        /// Active portal
        portal: Portal,
    },
    /// Admin portal selected but access not granted
    #[error("admin portal is locked")]
    AdminLocked,
}

struct AdminPortal {
    gate: Arc<AccessGate>,
    navigation: Option<NavigationController>,
}

/// Owns the active portal and its navigation state.
pub struct PortalSwitch {
    lookup: Arc<dyn RoleLookup>,
    portal_config: PortalConfig,
    nav_config: NavigationConfig,
    mode: PortalMode,
    user: Option<NavigationController>,
    admin: Option<AdminPortal>,
}

impl PortalSwitch {
    /// Start at the portal chooser.
    pub fn new(
        lookup: Arc<dyn RoleLookup>,
        portal_config: PortalConfig,
        nav_config: NavigationConfig,
    ) -> Self {
        Self {
            lookup,
            portal_config,
            nav_config,
            mode: PortalMode::None,
            user: None,
            admin: None,
        }
    }

    /// Active mode
    pub fn mode(&self) -> PortalMode {
        self.mode
    }

    /// Apply the one-shot startup query (`portal=admin`).
    ///
    /// Requesting the admin portal here goes through the gate exactly like
    /// [`PortalSwitch::enter_admin`]. Anything else leaves the chooser up.
    pub async fn bootstrap(&mut self, query: Option<&str>, session: &Session) -> PortalView {
        let wants_admin = query.is_some_and(|q| {
            let q = q.strip_prefix('?').unwrap_or(q);
            url::form_urlencoded::parse(q.as_bytes()).any(|(key, value)| {
                key == self.portal_config.bootstrap_param.as_str()
                    && value == self.portal_config.admin_value.as_str()
            })
        });

        if wants_admin {
            tracing::info!("bootstrap query requests the admin portal");
            self.enter_admin(session).await;
        }
        self.view()
    }

    /// Enter the consumer portal with a fresh history.
    pub fn enter_user(&mut self, session: &Session) -> Screen {
        let start = if session.is_authenticated() {
            Screen::Home
        } else {
            Screen::Welcome
        };
        self.admin = None;
        self.user = Some(NavigationController::with_config(start, &self.nav_config));
        self.mode = PortalMode::User;
        tracing::info!(screen = %start, "entered user portal");
        start
    }

    /// Enter the admin portal, waiting for the access decision.
    pub async fn enter_admin(&mut self, session: &Session) -> GateState {
        self.user = None;
        self.mode = PortalMode::Admin;
        let gate = Arc::new(AccessGate::new(Arc::clone(&self.lookup)));
        self.admin = Some(AdminPortal {
            gate: Arc::clone(&gate),
            navigation: None,
        });

        let state = gate.request(session).await;
        if state == GateState::Allowed {
            if let Some(admin) = self.admin.as_mut().filter(|a| Arc::ptr_eq(&a.gate, &gate)) {
                admin.navigation = Some(NavigationController::with_config(
                    Screen::AdminDashboard,
                    &self.nav_config,
                ));
                tracing::info!("entered admin portal");
            }
        }
        state
    }

    /// Gate guarding the current admin session, if admin mode is active
    pub fn admin_gate(&self) -> Option<Arc<AccessGate>> {
        self.admin.as_ref().map(|a| Arc::clone(&a.gate))
    }

    /// Leave whatever portal is active and show the chooser.
    pub fn return_to_chooser(&mut self) {
        if let Some(admin) = self.admin.take() {
            admin.gate.reset();
        }
        self.user = None;
        self.mode = PortalMode::None;
        tracing::debug!("returned to portal chooser");
    }

    /// Drop all portal state after the user signs out.
    pub fn handle_sign_out(&mut self) {
        tracing::info!(mode = ?self.mode, "session ended; clearing portal state");
        self.return_to_chooser();
    }

    /// Navigation controller of the active portal
    pub fn navigation(&self) -> Option<&NavigationController> {
        match self.mode {
            PortalMode::None => None,
            PortalMode::User => self.user.as_ref(),
            PortalMode::Admin => self.admin.as_ref().and_then(|a| a.navigation.as_ref()),
        }
    }

    /// Mutable navigation controller of the active portal
    pub fn navigation_mut(&mut self) -> Option<&mut NavigationController> {
        match self.mode {
            PortalMode::None => None,
            PortalMode::User => self.user.as_mut(),
            PortalMode::Admin => self.admin.as_mut().and_then(|a| a.navigation.as_mut()),
        }
    }

    /// Navigate within the active portal.
    pub fn navigate(&mut self, screen: Screen, payload: Option<NavPayload>) -> Result<(), PortalError> {
        let portal = self.active_portal()?;
        if screen.portal() != portal {
            tracing::warn!(%screen, %portal, "refusing navigation outside the active portal");
            return Err(PortalError::ScreenOutsidePortal { screen, portal });
        }
        self.controller()?.navigate(screen, payload);
        Ok(())
    }

    /// Go back within the active portal.
    pub fn back(&mut self) -> Result<BackOutcome, PortalError> {
        self.active_portal()?;
        Ok(self.controller()?.back())
    }

    /// Render state
    pub fn view(&self) -> PortalView {
        match self.mode {
            PortalMode::None => PortalView::Chooser,
            PortalMode::User => match &self.user {
                Some(nav) => PortalView::User(nav.current()),
                None => PortalView::Chooser,
            },
            PortalMode::Admin => {
                let Some(admin) = &self.admin else {
                    return PortalView::Chooser;
                };
                match (admin.gate.state(), &admin.navigation) {
                    (GateState::Allowed, Some(nav)) => PortalView::Admin(nav.current()),
                    (GateState::Denied, _) => match admin.gate.denial() {
                        Some(denial) => PortalView::AccessDenied(denial),
                        None => PortalView::AdminPending(GateState::Denied),
                    },
                    (state, _) => PortalView::AdminPending(state),
                }
            }
        }
    }

    fn active_portal(&self) -> Result<Portal, PortalError> {
        match self.mode {
            PortalMode::None => Err(PortalError::NoActivePortal),
            PortalMode::User => Ok(Portal::User),
            PortalMode::Admin => {
                let allowed = self
                    .admin
                    .as_ref()
                    .is_some_and(|a| a.gate.state() == GateState::Allowed && a.navigation.is_some());
                if allowed {
                    Ok(Portal::Admin)
                } else {
                    tracing::warn!("admin navigation requested without access");
                    Err(PortalError::AdminLocked)
                }
            }
        }
    }

    fn controller(&mut self) -> Result<&mut NavigationController, PortalError> {
        let mode = self.mode;
        self.navigation_mut().ok_or(match mode {
            PortalMode::Admin => PortalError::AdminLocked,
            _ => PortalError::NoActivePortal,
        })
    }
}

impl std::fmt::Debug for PortalSwitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalSwitch")
            .field("mode", &self.mode)
            .field("view", &self.view())
            .finish_non_exhaustive()
    }
}
