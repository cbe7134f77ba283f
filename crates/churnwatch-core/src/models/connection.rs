use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{ALERTS_CHANNEL_PATH, WATCHLIST_CHANNEL_PATH};

/// The two independent push channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Watchlist,
    Alerts,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 2] = [ChannelKind::Watchlist, ChannelKind::Alerts];

    /// WebSocket path relative to the push base URL.
    pub fn path(self) -> &'static str {
        match self {
            ChannelKind::Watchlist => WATCHLIST_CHANNEL_PATH,
            ChannelKind::Alerts => ALERTS_CHANNEL_PATH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Watchlist => "watchlist",
            ChannelKind::Alerts => "alerts",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
    /// Torn down. Terminal: no reconnection follows.
    Disposed,
}

impl ConnectionState {
    pub fn is_open(self) -> bool {
        self == ConnectionState::Open
    }
}
