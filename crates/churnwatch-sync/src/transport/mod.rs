//! Transport layer: REST client with retry/backoff, WebSocket push channels,
//! and the wire protocol.

#[cfg(feature = "live")]
pub mod http_client;
pub mod protocol;
#[cfg(feature = "live")]
pub mod ws;

#[cfg(feature = "live")]
pub use http_client::{HttpBackend, HttpClientConfig};
pub use protocol::{
    parse_server_message, AnomalyEvent, ClientMessage, ServerMessage, WatchlistAction,
    WatchlistChange,
};
#[cfg(feature = "live")]
pub use ws::WsConnector;
