use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Prefix marking an alert ID that was generated locally.
const LOCAL_PREFIX: &str = "local-";

/// The backend emits integer primary keys; other producers use strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Signed(n) => n.to_string(),
            RawId::Unsigned(n) => n.to_string(),
        }
    }
}

/// Opaque customer identifier. Unique key of a watchlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CustomerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'de> Deserialize<'de> for CustomerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into_string()))
    }
}

/// Identifier of an alert.
///
/// Alerts fetched over REST carry the backend's permanent ID. Alerts that
/// arrive on the push channel have no ID yet and get a UUID until a refetch
/// reconciles them with their server counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlertId {
    Server(String),
    Local(Uuid),
}

impl AlertId {
    /// Generate a fresh local ID.
    pub fn local() -> Self {
        AlertId::Local(Uuid::new_v4())
    }

    pub fn server(id: impl Into<String>) -> Self {
        AlertId::Server(id.into())
    }

    /// Whether the backend knows this ID.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, AlertId::Server(_))
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertId::Server(id) => f.write_str(id),
            AlertId::Local(uuid) => write!(f, "{LOCAL_PREFIX}{uuid}"),
        }
    }
}

impl Serialize for AlertId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AlertId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawId::deserialize(deserializer)?.into_string();
        if let Some(rest) = raw.strip_prefix(LOCAL_PREFIX) {
            if let Ok(uuid) = Uuid::parse_str(rest) {
                return Ok(AlertId::Local(uuid));
            }
        }
        Ok(AlertId::Server(raw))
    }
}
