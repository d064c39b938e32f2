use super::cancel::CancelToken;
use super::host::HostEnvironment;
use super::types::{FailureReason, ProbeOutcome, ProbeResult};
use crate::errors::MonitorError;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, EXPIRES, PRAGMA};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Performs one bounded, cancellable health check
///
/// Implementations must:
/// - Return `ProbeOutcome::Cancelled` as soon as `cancel` fires, without
///   reporting anything else
/// - Give up after `timeout` and report `FailureReason::Timeout`
/// - Measure latency to response arrival, not body completion
/// - Never mutate connectivity state; the caller applies the outcome
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &Url, timeout: Duration, cancel: &CancelToken) -> ProbeOutcome;
}

/// Query parameter appended to every probe URL to defeat caches
const CACHE_BUST_PARAM: &str = "_t";

/// HTTP GET prober backed by reqwest
pub struct HttpProber {
    client: reqwest::Client,
    host: Arc<dyn HostEnvironment>,
}

impl HttpProber {
    pub fn new(host: Arc<dyn HostEnvironment>) -> Result<Self, MonitorError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(EXPIRES, HeaderValue::from_static("0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, host })
    }

    fn cache_busted(url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut().append_pair(
            CACHE_BUST_PARAM,
            &chrono::Utc::now().timestamp_millis().to_string(),
        );
        url
    }

    fn failure(&self, reason: FailureReason) -> ProbeResult {
        let host_online = self.host.is_online();
        logger::debug(
            LogTag::Prober,
            &format!(
                "Probe failed ({}), falling back to host flag online={}",
                reason, host_online
            ),
        );
        ProbeResult::failure(reason, host_online)
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &Url, timeout: Duration, cancel: &CancelToken) -> ProbeOutcome {
        if cancel.is_cancelled() {
            return ProbeOutcome::Cancelled;
        }

        let request = self.client.get(Self::cache_busted(url)).send();
        let start = Instant::now();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                logger::verbose(
                    LogTag::Prober,
                    &format!("Probe cancelled after {}ms", start.elapsed().as_millis()),
                );
                ProbeOutcome::Cancelled
            }
            response = tokio::time::timeout(timeout, request) => {
                let result = match response {
                    Ok(Ok(response)) => {
                        let latency = start.elapsed().as_millis() as u64;
                        let status = response.status();
                        if status.is_success() {
                            logger::debug(
                                LogTag::Prober,
                                &format!("Probe ok: HTTP {} in {}ms", status.as_u16(), latency),
                            );
                            ProbeResult::success(latency)
                        } else {
                            self.failure(FailureReason::HttpStatus {
                                status: status.as_u16(),
                            })
                        }
                    }
                    Ok(Err(e)) => self.failure(FailureReason::Network {
                        message: e.to_string(),
                    }),
                    Err(_) => self.failure(FailureReason::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                };
                ProbeOutcome::Completed(result)
            }
        }
    }
}
