// Single source of truth for all default values.

// --- Backend ---
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;
pub const DEFAULT_ALERT_WINDOW_HOURS: u32 = 24;

// --- Reconnect ---
pub const DEFAULT_RECONNECT_STRATEGY: &str = "exponential";
pub const DEFAULT_RECONNECT_BASE_DELAY_MS: u64 = 5_000;
pub const DEFAULT_RECONNECT_MAX_DELAY_MS: u64 = 60_000;
pub const DEFAULT_RECONNECT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_RECONNECT_JITTER: bool = true;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_JSON: bool = false;
