/// Errors raised by engine actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The alert only has a local ID; the backend cannot resolve it yet.
    #[error("alert {alert_id} is not yet confirmed by the backend")]
    UnconfirmedAlert { alert_id: String },

    #[error("alert not found: {alert_id}")]
    AlertNotFound { alert_id: String },

    /// The engine was shut down.
    #[error("sync engine has been disposed")]
    Disposed,
}
