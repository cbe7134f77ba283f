//! Test support for the churnwatch crates.
//!
//! Provides JSON fixture loading, in-memory fakes for the backend, push
//! channels and notifier, and builders for entries, alerts and push frames.

pub mod backend;
pub mod builders;
pub mod connector;
pub mod notifier;

use serde::de::DeserializeOwned;
use std::path::PathBuf;

pub use backend::FakeBackend;
pub use connector::FakeConnector;
pub use notifier::RecordingNotifier;

/// Root directory of the bundled JSON fixtures.
fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Load a fixture file as raw text, e.g. to feed a parser.
pub fn load_fixture_text(relative_path: &str) -> String {
    let path = fixtures_root().join(relative_path);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

/// Check that a fixture file exists.
pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_fixtures_exist() {
        assert!(fixture_exists("watchlist_response.json"));
        assert!(fixture_exists("alerts_response.json"));
        assert!(!fixture_exists("missing.json"));
    }

    #[test]
    fn fixtures_are_valid_json() {
        let value: serde_json::Value = load_fixture("watchlist_response.json");
        assert_eq!(value["count"], 4);
        assert!(load_fixture_text("alerts_response.json").contains("\"alerts\""));
    }
}
