//! # Tether Core - Navigation State Machine
//!
//! Pure, synchronous navigation model for the Tether platform:
//!
//! - [`screen`]: the closed screen registry and the render spec each screen
//!   resolves to
//! - [`routes`]: the static fallback route map used when no history exists
//! - [`navigation`]: the navigation controller owning current screen, history
//!   and context memory
//! - [`session`]: the session shape consumed by the admin access gate
//!
//! Nothing here performs I/O or depends on a renderer, so every transition can
//! be unit tested directly.

#![forbid(unsafe_code)]

pub mod errors;
pub mod navigation;
pub mod routes;
pub mod screen;
pub mod session;

pub use errors::{AccessDenial, ScreenParseError};
pub use navigation::{
    BackOutcome, NavAction, NavPayload, NavigationConfig, NavigationController, NavigationState,
};
pub use screen::{Flow, Portal, Screen, ScreenSpec};
pub use session::{Role, Session, UserId};
