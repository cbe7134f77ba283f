/// REST path of the active watchlist.
pub const WATCHLIST_PATH: &str = "/api/watchlist/";

/// REST path of recent anomaly alerts. Takes an `hours` query parameter.
pub const ALERTS_PATH: &str = "/api/alerts/";

/// REST path used to resolve an alert.
pub const RESOLVE_ALERT_PATH: &str = "/api/resolve-alert/";

/// REST path used to request an anomaly scan for one customer.
pub const TRIGGER_ANOMALY_PATH: &str = "/api/trigger-anomaly/";

/// WebSocket path of the watchlist push channel.
pub const WATCHLIST_CHANNEL_PATH: &str = "/ws/watchlist/";

/// WebSocket path of the alerts push channel.
pub const ALERTS_CHANNEL_PATH: &str = "/ws/alerts/";

/// Environment variable holding the tracing filter.
pub const LOG_ENV_VAR: &str = "CHURNWATCH_LOG";

/// How far apart a pushed anomaly and the server's alert row may be
/// stamped and still describe the same occurrence. The row is written by
/// the detector; the push is sent later from a separate task.
pub const ALERT_MATCH_WINDOW_SECS: i64 = 300;

/// Removal tombstones older than this, relative to the newest timestamped
/// event seen, are forgotten.
pub const TOMBSTONE_RETENTION_SECS: i64 = 3_600;
