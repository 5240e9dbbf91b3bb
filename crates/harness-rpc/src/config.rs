//! Connection configuration and retry policy.

use std::path::PathBuf;
use std::time::Duration;

use harness_core::constants::{
    DEFAULT_MAX_CONN_RETRIES, DEFAULT_RETRY_DELAY_MS, DEFAULT_RPC_ENDPOINT,
};

use crate::error::RpcError;

/// Everything a client factory needs to reach one RPC server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// `host:port` of the RPC listener.
    pub host: String,
    /// Path component, e.g. `"ws"`.
    pub endpoint: String,
    pub user: String,
    pub pass: String,
    /// Certificate the server writes once it is listening.
    pub certificate_file: Option<PathBuf>,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            endpoint: DEFAULT_RPC_ENDPOINT.to_string(),
            user: user.into(),
            pass: pass.into(),
            certificate_file: None,
        }
    }

    pub fn with_certificate(mut self, path: impl Into<PathBuf>) -> Self {
        self.certificate_file = Some(path.into());
        self
    }

    /// Websocket URL of the endpoint: `wss` when a certificate is configured.
    pub fn url(&self) -> String {
        let scheme = if self.certificate_file.is_some() {
            "wss"
        } else {
            "ws"
        };
        format!(
            "{scheme}://{}/{}",
            self.host,
            self.endpoint.trim_start_matches('/')
        )
    }

    /// Load `<PREFIX>_RPC_HOST`, `_RPC_ENDPOINT`, `_RPC_USER`, `_RPC_PASS`
    /// and `_RPC_CERT`. Only the host is required.
    pub fn from_env(prefix: &str) -> Result<Self, RpcError> {
        let var = |name: &str| std::env::var(format!("{prefix}_RPC_{name}")).ok();

        let host = var("HOST")
            .ok_or_else(|| RpcError::Config(format!("{prefix}_RPC_HOST is required")))?;

        Ok(Self {
            host,
            endpoint: var("ENDPOINT").unwrap_or_else(|| DEFAULT_RPC_ENDPOINT.to_string()),
            user: var("USER").unwrap_or_default(),
            pass: var("PASS").unwrap_or_default(),
            certificate_file: var("CERT").map(PathBuf::from),
        })
    }
}

/// How the pause between connection attempts evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed,
    /// Delay multiplied by `factor` after each failure, capped at `max_delay`.
    Exponential { factor: u32, max_delay: Duration },
}

/// Bounded retry for connection establishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one fails.
    pub max_retries: u32,
    /// Pause before the first retry.
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(
            DEFAULT_MAX_CONN_RETRIES,
            Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        )
    }
}

impl RetryPolicy {
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn exponential(max_retries: u32, delay: Duration, factor: u32, max_delay: Duration) -> Self {
        Self {
            max_retries,
            delay,
            backoff: Backoff::Exponential { factor, max_delay },
        }
    }

    /// No retries: a single attempt.
    pub fn no_retry() -> Self {
        Self::fixed(0, Duration::ZERO)
    }

    /// Pause after the failed attempt numbered `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { factor, max_delay } => {
                let multiplier = factor.checked_pow(attempt).unwrap_or(u32::MAX);
                self.delay
                    .checked_mul(multiplier)
                    .unwrap_or(max_delay)
                    .min(max_delay)
            }
        }
    }
}
