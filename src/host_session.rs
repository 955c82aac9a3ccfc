//! Per-host HTTP client with a minimum inter-request spacing gate and cookie
//! retention.
//!
//! One Δ-spacing gate per `HostSession`, and exactly one `HostSession` lives
//! per run. The gate is a single packed nanosecond timestamp updated with a
//! compare-and-swap loop rather than a lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::debug;

use crate::browser_setup::CHROME_USER_AGENT;
use crate::error::ChapterError;

/// One HTTP client + cookie jar + minimum inter-request interval Δ, scoped
/// to a single target host for the lifetime of one run.
pub struct HostSession {
    client: Client,
    min_delay: Duration,
    /// Nanoseconds since `epoch`, the `Instant` used as each session's zero
    /// point. `u64` nanoseconds comfortably covers any run's lifetime.
    last_request_nanos: AtomicU64,
    epoch: Instant,
}

impl HostSession {
    /// Build a session with realistic browser-identity headers and a
    /// persistent cookie jar.
    pub fn new(min_delay: Duration, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .parse()?,
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.9".parse()?,
        );
        headers.insert("Upgrade-Insecure-Requests", "1".parse()?);
        headers.insert("Sec-Fetch-Dest", "document".parse()?);
        headers.insert("Sec-Fetch-Mode", "navigate".parse()?);
        headers.insert("Sec-Fetch-Site", "none".parse()?);
        headers.insert("Sec-Fetch-User", "?1".parse()?);

        let client = Client::builder()
            .user_agent(CHROME_USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            min_delay,
            last_request_nanos: AtomicU64::new(0),
            epoch: Instant::now(),
        })
    }

    /// Blocks until wall time since the previous request on this session is
    /// ≥ Δ, then records the current instant as the new last-request time.
    /// Exposed publicly so the browser-driver strategy can observe the same
    /// Δ for its own browser-issued navigations.
    pub async fn rate_limit(&self) {
        loop {
            let now_nanos = self.epoch.elapsed().as_nanos() as u64;
            let last = self.last_request_nanos.load(Ordering::Acquire);
            let min_delay_nanos = self.min_delay.as_nanos() as u64;
            let elapsed = now_nanos.saturating_sub(last);

            if elapsed >= min_delay_nanos {
                if self
                    .last_request_nanos
                    .compare_exchange_weak(last, now_nanos, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    return;
                }
                // Lost the race to another caller; re-check.
                continue;
            }

            let wait = Duration::from_nanos(min_delay_nanos - elapsed);
            tokio::time::sleep(wait).await;
        }
    }

    /// Performs an HTTP GET, blocking on the Δ-spacing gate first. Transport
    /// errors bubble up as a single `TransportFailure`; HTTP status is not
    /// coerced to a failure here, the caller inspects it.
    pub async fn request(&self, url: &str) -> Result<reqwest::Response, ChapterError> {
        self.rate_limit().await;
        debug!(url, "host_session: issuing request");
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| ChapterError::TransportFailure(e.to_string()))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_limit_enforces_minimum_spacing() {
        let session = HostSession::new(Duration::from_millis(50), Duration::from_secs(5)).unwrap();
        let start = Instant::now();
        session.rate_limit().await;
        session.rate_limit().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn first_call_does_not_block() {
        let session = HostSession::new(Duration::from_secs(10), Duration::from_secs(5)).unwrap();
        let start = Instant::now();
        session.rate_limit().await;
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
