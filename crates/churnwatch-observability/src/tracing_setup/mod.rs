//! Tracing initialization.

pub mod spans;

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use churnwatch_core::config::ObservabilityConfig;
use churnwatch_core::constants::LOG_ENV_VAR;

static INIT: Once = Once::new();

/// Initialize the tracing subscriber.
///
/// `CHURNWATCH_LOG` takes precedence over `config.log_level`, e.g.
/// `CHURNWATCH_LOG=churnwatch_sync=debug,reqwest=warn`. Output is JSON when
/// `config.json` is set.
///
/// Idempotent. If another subscriber is already installed it is left alone.
pub fn init_tracing(config: &ObservabilityConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
        install(filter, config.json);
    });
}

/// Initialize tracing with an explicit filter string, ignoring the
/// environment (for tests or embedding).
pub fn init_tracing_with_filter(filter: &str) {
    INIT.call_once(|| install(EnvFilter::new(filter), false));
}

fn install(filter: EnvFilter, json: bool) {
    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .json(),
            )
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("churnwatch: tracing subscriber already installed");
    }
}
