//! Readiness probing - polling the server until it answers

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};

/// Default pause between readiness attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Configuration for a readiness probe
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// URL that receives the `HEAD` request
    pub url: String,

    /// Total time allowed for the server to come up
    pub timeout: Duration,

    /// Pause between attempts
    pub interval: Duration,
}

impl ProbeConfig {
    pub fn for_port(port: u16, timeout: Duration) -> Self {
        Self {
            url: format!("http://localhost:{}", port),
            timeout,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Polls a URL with lightweight `HEAD` requests until something answers
pub struct ReadinessProber {
    config: ProbeConfig,
    client: reqwest::Client,
}

impl ReadinessProber {
    pub fn new(config: ProbeConfig) -> E2eResult<Self> {
        // A single attempt must never outlive the pause between attempts,
        // otherwise a hung connection could stretch the deadline.
        // Readiness means the server itself answered, never an HTTP proxy.
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(config.interval.max(Duration::from_millis(10)))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Issue one readiness check.
    ///
    /// Any HTTP response counts as ready; connection errors mean "not yet".
    pub async fn probe_once(&self) -> bool {
        match self.client.head(&self.config.url).send().await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    debug!("Readiness probe answered with {}", resp.status());
                }
                true
            }
            Err(e) => {
                debug!("Readiness probe failed: {}", e);
                false
            }
        }
    }

    /// Block until the server answers or the timeout elapses.
    ///
    /// A timed-out wait returns no earlier than `timeout` and no later than
    /// `timeout + interval`.
    pub async fn wait(&self) -> E2eResult<()> {
        let deadline = Instant::now() + self.config.timeout;
        let mut attempts = 0usize;

        loop {
            attempts += 1;

            if self.probe_once().await {
                info!("Server is ready at {} (attempt {})", self.config.url, attempts);
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }

            sleep(self.config.interval.min(deadline - now)).await;
            info!("Waiting for server... (attempt {})", attempts);
        }

        Err(E2eError::ServerStartTimeout {
            timeout: self.config.timeout,
        })
    }
}

/// Wait for `http://localhost:<port>` to answer, polling once per second.
pub async fn wait_for_server(port: u16, timeout: Duration) -> E2eResult<()> {
    ReadinessProber::new(ProbeConfig::for_port(port, timeout))?
        .wait()
        .await
}
