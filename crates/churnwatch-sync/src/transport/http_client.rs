//! REST client with retry, exponential backoff, timeout, and gzip.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use churnwatch_core::config::BackendConfig;
use churnwatch_core::constants::{
    ALERTS_PATH, RESOLVE_ALERT_PATH, TRIGGER_ANOMALY_PATH, WATCHLIST_PATH,
};
use churnwatch_core::errors::{ChurnwatchResult, TransportError};
use churnwatch_core::models::{Alert, AlertId, CustomerId, WatchlistEntry};
use churnwatch_core::traits::IWatchlistBackend;

use super::protocol::{
    ActionResponse, AlertsResponse, ResolveAlertRequest, TriggerAnomalyRequest,
    WatchlistResponse,
};

/// Configuration for the HTTP transport layer.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL of the churn API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry).
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from(&BackendConfig::default())
    }
}

impl From<&BackendConfig> for HttpClientConfig {
    fn from(config: &BackendConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

fn net_err(reason: impl Into<String>) -> TransportError {
    TransportError::Network {
        reason: reason.into(),
    }
}

/// HTTP implementation of [`IWatchlistBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: HttpClientConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: HttpClientConfig) -> ChurnwatchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(|e| net_err(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// GET a resource with retry and backoff.
    async fn get<Resp: DeserializeOwned>(&self, path: &str) -> ChurnwatchResult<Resp> {
        self.do_request(reqwest::Method::GET, &self.url(path), None::<&()>)
            .await
    }

    /// POST a JSON body with retry and backoff.
    async fn post<Req: Serialize + Sync, Resp: DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> ChurnwatchResult<Resp> {
        self.do_request(reqwest::Method::POST, &self.url(path), Some(body))
            .await
    }

    /// Unified retry loop. Network failures and 5xx are retried; 4xx is final.
    async fn do_request<Resp: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&(impl Serialize + Sync)>,
    ) -> ChurnwatchResult<Resp> {
        let mut backoff = self.config.initial_backoff;
        let mut last_err = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    "churnwatch: retry attempt {}/{} for {} after {:?}",
                    attempt,
                    self.config.max_retries,
                    url,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(self.config.max_backoff);
            }

            let mut req = self.client.request(method.clone(), url);
            if let Some(b) = body {
                req = req.json(b);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp.json::<Resp>().await.map_err(|e| {
                            net_err(format!("deserialization failed: {e}")).into()
                        });
                    }
                    if status.is_client_error() {
                        let body_text = resp.text().await.unwrap_or_default();
                        return Err(TransportError::Http {
                            status: status.as_u16(),
                            body: body_text,
                        }
                        .into());
                    }
                    last_err = format!("HTTP {status}");
                }
                Err(e) => {
                    last_err = e.to_string();
                }
            }
        }

        Err(net_err(format!(
            "all {} retries exhausted: {last_err}",
            self.config.max_retries
        ))
        .into())
    }
}

#[async_trait]
impl IWatchlistBackend for HttpBackend {
    async fn fetch_watchlist(&self) -> ChurnwatchResult<Vec<WatchlistEntry>> {
        let resp: WatchlistResponse = self.get(WATCHLIST_PATH).await?;
        tracing::debug!("churnwatch: fetched {} watchlist entries", resp.watchlist.len());
        Ok(resp.watchlist)
    }

    async fn fetch_alerts(&self, hours: u32) -> ChurnwatchResult<Vec<Alert>> {
        let path = format!("{ALERTS_PATH}?hours={hours}");
        let resp: AlertsResponse = self.get(&path).await?;
        tracing::debug!("churnwatch: fetched {} alerts", resp.alerts.len());
        Ok(resp.alerts)
    }

    async fn resolve_alert(&self, alert_id: &AlertId) -> ChurnwatchResult<()> {
        let body = ResolveAlertRequest {
            alert_id: alert_id.clone(),
        };
        let resp: ActionResponse = self.post(RESOLVE_ALERT_PATH, &body).await?;
        resp.into_result()?;
        Ok(())
    }

    async fn trigger_anomaly(&self, customer_id: &CustomerId) -> ChurnwatchResult<()> {
        let body = TriggerAnomalyRequest {
            customer_id: customer_id.clone(),
        };
        let resp: ActionResponse = self.post(TRIGGER_ANOMALY_PATH, &body).await?;
        resp.into_result()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_backend_strips_trailing_slash() {
        let backend = BackendConfig {
            base_url: "http://churn.local:8000/".into(),
            ..Default::default()
        };
        let config = HttpClientConfig::from(&backend);
        assert_eq!(config.base_url, "http://churn.local:8000");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.initial_backoff, Duration::from_millis(500));
    }

    #[test]
    fn urls_join_base_and_path() {
        let backend = HttpBackend::new(HttpClientConfig::default()).unwrap();
        assert_eq!(
            backend.url(WATCHLIST_PATH),
            "http://localhost:8000/api/watchlist/"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_exhausts_retries() {
        let backend = HttpBackend::new(HttpClientConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_millis(200),
            max_retries: 1,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
        })
        .unwrap();
        let err = backend.fetch_watchlist().await.unwrap_err();
        assert!(err.is_connectivity());
        assert!(err.to_string().contains("retries exhausted"));
    }
}
