//! Layered TOML configuration. Every section falls back to [`defaults`].

mod backend_config;
pub mod defaults;
mod observability_config;
mod reconnect_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub use backend_config::BackendConfig;
pub use observability_config::ObservabilityConfig;
pub use reconnect_config::ReconnectConfig;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnwatchConfig {
    pub backend: BackendConfig,
    pub reconnect: ReconnectConfig,
    pub observability: ObservabilityConfig,
}

impl ChurnwatchConfig {
    /// Parse from a TOML string. Missing sections and fields take defaults.
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(invalid("backend.base_url", "must not be empty"));
        }
        if self.backend.ws_url.trim().is_empty() {
            return Err(invalid("backend.ws_url", "must not be empty"));
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(invalid("backend.request_timeout_secs", "must be positive"));
        }
        if self.backend.alert_window_hours == 0 {
            return Err(invalid("backend.alert_window_hours", "must be positive"));
        }
        match self.reconnect.strategy.as_str() {
            "exponential" | "fixed" => {}
            other => {
                return Err(invalid(
                    "reconnect.strategy",
                    format!("expected \"exponential\" or \"fixed\", got {other:?}"),
                ))
            }
        }
        if self.reconnect.base_delay_ms == 0 {
            return Err(invalid("reconnect.base_delay_ms", "must be positive"));
        }
        if self.reconnect.max_delay_ms < self.reconnect.base_delay_ms {
            return Err(invalid(
                "reconnect.max_delay_ms",
                "must be at least reconnect.base_delay_ms",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
