use serde::{Deserialize, Serialize};

use super::defaults;

/// Where the backend lives and how hard to try reaching it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// REST base URL.
    pub base_url: String,
    /// WebSocket base URL.
    pub ws_url: String,
    pub request_timeout_secs: u64,
    /// Retries after the first attempt for network failures and 5xx.
    pub max_retries: u32,
    /// Initial retry backoff (doubles each retry).
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// How far back the initial alert fetch reaches.
    pub alert_window_hours: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::DEFAULT_BASE_URL.to_string(),
            ws_url: defaults::DEFAULT_WS_URL.to_string(),
            request_timeout_secs: defaults::DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: defaults::DEFAULT_MAX_RETRIES,
            initial_backoff_ms: defaults::DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: defaults::DEFAULT_MAX_BACKOFF_MS,
            alert_window_hours: defaults::DEFAULT_ALERT_WINDOW_HOURS,
        }
    }
}
