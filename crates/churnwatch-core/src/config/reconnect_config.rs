use serde::{Deserialize, Serialize};

use super::defaults;

/// Push channel reconnection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// "exponential" or "fixed".
    pub strategy: String,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Consecutive failed attempts before giving up. 0 = never give up.
    pub max_attempts: u32,
    pub jitter: bool,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            strategy: defaults::DEFAULT_RECONNECT_STRATEGY.to_string(),
            base_delay_ms: defaults::DEFAULT_RECONNECT_BASE_DELAY_MS,
            max_delay_ms: defaults::DEFAULT_RECONNECT_MAX_DELAY_MS,
            max_attempts: defaults::DEFAULT_RECONNECT_MAX_ATTEMPTS,
            jitter: defaults::DEFAULT_RECONNECT_JITTER,
        }
    }
}
