#![forbid(unsafe_code)]

//! Headless watchlist monitor: mirrors the server state and logs every
//! change of the derived counts until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use churnwatch_core::ChurnwatchConfig;
use churnwatch_observability::init_tracing;
use churnwatch_sync::{SyncEngine, TracingNotifier};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "churnwatch-monitor: live churn watchlist and anomaly alerts",
    long_about = None
)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `backend.base_url` (REST).
    #[arg(long)]
    base_url: Option<String>,

    /// Override `backend.ws_url` (push channels).
    #[arg(long)]
    ws_url: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<ChurnwatchConfig> {
        let mut config = match &self.config {
            Some(path) => ChurnwatchConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ChurnwatchConfig::default(),
        };
        if let Some(url) = &self.base_url {
            config.backend.base_url = url.clone();
        }
        if let Some(url) = &self.ws_url {
            config.backend.ws_url = url.clone();
        }
        if self.json {
            config.observability.json = true;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_tracing(&config.observability);

    tracing::info!(
        "churnwatch: monitoring {} (push {})",
        config.backend.base_url,
        config.backend.ws_url
    );

    let mut engine = SyncEngine::from_config(&config, Arc::new(TracingNotifier))
        .context("building sync engine")?;
    engine.start().await.context("starting sync engine")?;

    let mut snapshots = engine.subscribe();
    let reporter = tokio::spawn(async move {
        let mut last = None;
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            let current = (snapshot.stats(), snapshot.is_live());
            if last == Some(current) {
                continue;
            }
            let (stats, live) = current;
            tracing::info!(
                watched = stats.total_watched,
                high_risk = stats.high_risk,
                medium_risk = stats.medium_risk,
                active_alerts = stats.active_alerts,
                live,
                "churnwatch: stats changed"
            );
            last = Some(current);
        }
    });

    engine
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("churnwatch: cannot listen for Ctrl-C: {e}");
            }
        })
        .await;

    drop(engine);
    if let Err(e) = reporter.await {
        tracing::warn!("churnwatch: stats reporter ended abnormally: {e}");
    }
    Ok(())
}
