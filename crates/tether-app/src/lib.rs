//! # Tether App - Funnels, Access Gate and Portal Switch
//!
//! The asynchronous half of the Tether navigation layer, built on the pure
//! state machine in `tether-core`:
//!
//! - [`funnel`]: linear step machines for identity verification and password
//!   recovery
//! - [`gate`]: the admin access gate
//! - [`portal`]: portal selection composing navigation controllers and the gate
//! - [`effects`]: collaborator traits for auth, role lookup and verification
//! - [`simulated`]: in-process collaborators for the host binary and tests
//! - [`config`]: TOML configuration

#![forbid(unsafe_code)]

pub mod config;
pub mod effects;
pub mod funnel;
pub mod gate;
pub mod portal;
pub mod simulated;

pub use config::{ConfigError, FunnelConfig, PortalConfig, SimulationConfig, TetherConfig};
pub use effects::{
    AuthError, Credentials, RoleLookup, RoleLookupError, SessionProvider, StepVerifier,
    VerifyError,
};
pub use funnel::flows::FunnelInput;
pub use funnel::otp::OtpCode;
pub use funnel::{
    FunnelController, FunnelDefinition, FunnelError, FunnelKind, FunnelState, IgnoreReason,
    InputShape, StepDescriptor, StepError, StepId, StepStatus, StepTarget, SubmitOutcome,
};
pub use gate::{AccessGate, GateState};
pub use portal::{PortalError, PortalMode, PortalSwitch, PortalView};
pub use simulated::{SimulatedAuth, SimulatedVerifier};
