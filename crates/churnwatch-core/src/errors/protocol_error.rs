/// Inbound push payloads that cannot be reduced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {reason}")]
    Malformed { reason: String },

    #[error("unknown message type: {type_name}")]
    UnknownMessageType { type_name: String },

    #[error("{message_type} message is missing field {field}")]
    MissingField {
        message_type: String,
        field: &'static str,
    },
}
