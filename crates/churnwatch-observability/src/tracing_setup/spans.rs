//! Span definitions for the sync operations.

/// Create a span around the initial REST load.
#[macro_export]
macro_rules! initial_load_span {
    ($alert_window_hours:expr) => {
        tracing::info_span!("churnwatch.initial_load", alert_window_hours = $alert_window_hours)
    };
}

/// Create a span around a REST refetch after a reconnect.
#[macro_export]
macro_rules! refetch_span {
    () => {
        tracing::info_span!("churnwatch.refetch")
    };
}

/// Create a span around one push channel's task.
#[macro_export]
macro_rules! channel_span {
    ($channel:expr) => {
        tracing::info_span!("churnwatch.channel", channel = %$channel)
    };
}

/// Create a span around a user action.
#[macro_export]
macro_rules! action_span {
    ($action:expr, $target:expr) => {
        tracing::info_span!("churnwatch.action", action = $action, target = %$target)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const INITIAL_LOAD: &str = "churnwatch.initial_load";
    pub const REFETCH: &str = "churnwatch.refetch";
    pub const CHANNEL: &str = "churnwatch.channel";
    pub const ACTION: &str = "churnwatch.action";
}

#[cfg(test)]
mod tests {
    use super::names;

    #[test]
    fn span_macros_use_the_named_constants() {
        let span = crate::initial_load_span!(24);
        if let Some(meta) = span.metadata() {
            assert_eq!(meta.name(), names::INITIAL_LOAD);
        }
        let span = crate::channel_span!("alerts");
        if let Some(meta) = span.metadata() {
            assert_eq!(meta.name(), names::CHANNEL);
        }
    }
}
