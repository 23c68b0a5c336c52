//! Configuration
//!
//! `tether.toml` layout; every section and field is optional.
//!
//! ```toml
//! [navigation]
//! # unbounded when omitted
//! max_history = 256
//!
//! [portal]
//! bootstrap_param = "portal"
//! admin_value = "admin"
//!
//! [funnels]
//! settle_delay_ms = 1500
//! min_age = 18
//! max_image_bytes = 5242880
//!
//! [simulation]
//! lookup_latency_ms = 300
//! verify_latency_ms = 800
//! admin_users = ["root"]
//! fail_role_lookup = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tether_core::NavigationConfig;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File exists but could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Config file path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// Not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Parsed, but a value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Portal bootstrap settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Query parameter that selects the initial portal
    pub bootstrap_param: String,
    /// Value of that parameter requesting the admin portal
    pub admin_value: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            bootstrap_param: "portal".to_string(),
            admin_value: "admin".to_string(),
        }
    }
}

/// Funnel timing and limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelConfig {
    /// Pause between a verified step and the next one
    pub settle_delay_ms: u64,
    /// Minimum age accepted by age verification
    pub min_age: u32,
    /// Largest accepted image upload
    pub max_image_bytes: usize,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1500,
            min_age: 18,
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

impl FunnelConfig {
    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Simulated collaborator behaviour for the host binary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Role lookup latency
    pub lookup_latency_ms: u64,
    /// Step verification latency
    pub verify_latency_ms: u64,
    /// Users holding the admin role
    pub admin_users: Vec<String>,
    /// Make every role lookup fail
    pub fail_role_lookup: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lookup_latency_ms: 300,
            verify_latency_ms: 800,
            admin_users: vec!["root".to_string()],
            fail_role_lookup: false,
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    /// History limits
    pub navigation: NavigationConfig,
    /// Portal bootstrap
    pub portal: PortalConfig,
    /// Funnel behaviour
    pub funnels: FunnelConfig,
    /// Simulated backends
    pub simulation: SimulationConfig,
}

impl TetherConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found; using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the controllers cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.navigation.max_history == Some(0) {
            return Err(ConfigError::Invalid(
                "navigation.max_history must be at least 1".to_string(),
            ));
        }
        if self.portal.bootstrap_param.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "portal.bootstrap_param cannot be empty".to_string(),
            ));
        }
        if !(1..=150).contains(&self.funnels.min_age) {
            return Err(ConfigError::Invalid(format!(
                "funnels.min_age must be between 1 and 150, got {}",
                self.funnels.min_age
            )));
        }
        if self.funnels.max_image_bytes == 0 {
            return Err(ConfigError::Invalid(
                "funnels.max_image_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
