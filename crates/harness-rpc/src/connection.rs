//! Single-owner RPC connection with bounded connect retry.
//!
//! External node and wallet processes need a grace period before their RPC
//! listener accepts connections. [`RpcConnection::connect`] absorbs it with an
//! explicit loop over a [`RetryPolicy`] and an injectable [`Sleeper`], so tests
//! can drive the retry logic with a fake factory and no real waiting.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{ConnectionConfig, RetryPolicy};
use crate::error::{ClientError, RpcError};

/// Callback for server-pushed notifications: method name and params.
pub type NotificationHandler = Arc<dyn Fn(&str, &serde_json::Value) + Send + Sync>;

/// Builds a client handle for one connection attempt.
pub trait ClientFactory {
    type Client;

    fn new_client(
        &self,
        config: &ConnectionConfig,
        handler: Option<NotificationHandler>,
    ) -> Result<Self::Client, ClientError>;
}

/// Waits between connection attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<F: Fn(Duration)> Sleeper for F {
    fn sleep(&self, duration: Duration) {
        self(duration)
    }
}

/// Blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Owns at most one live client handle.
pub struct RpcConnection<F: ClientFactory, S = ThreadSleeper> {
    factory: F,
    policy: RetryPolicy,
    sleeper: S,
    client: Option<F::Client>,
}

impl<F: ClientFactory> RpcConnection<F, ThreadSleeper> {
    pub fn new(factory: F, policy: RetryPolicy) -> Self {
        Self::with_sleeper(factory, policy, ThreadSleeper)
    }
}

impl<F: ClientFactory, S: Sleeper> RpcConnection<F, S> {
    pub fn with_sleeper(factory: F, policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            factory,
            policy,
            sleeper,
            client: None,
        }
    }

    /// Build a client, retrying transient failures per the policy.
    ///
    /// Makes at most `max_retries + 1` attempts. A [`ClientError::Rejected`]
    /// aborts at once. On failure the connection stays disconnected.
    pub fn connect(
        &mut self,
        config: &ConnectionConfig,
        handler: Option<NotificationHandler>,
    ) -> Result<(), RpcError> {
        if self.client.is_some() {
            return Err(RpcError::AlreadyConnected);
        }

        let attempts = self.policy.max_retries.saturating_add(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            debug!(url = %config.url(), attempt = attempt + 1, attempts, "connecting");
            match self.factory.new_client(config, handler.clone()) {
                Ok(client) => {
                    info!(url = %config.url(), attempt = attempt + 1, "rpc connected");
                    self.client = Some(client);
                    return Ok(());
                }
                Err(err) if err.is_transient() => {
                    if attempt + 1 < attempts {
                        let delay = self.policy.delay_for(attempt);
                        warn!(
                            url = %config.url(),
                            attempt = attempt + 1,
                            attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "rpc endpoint not ready, retrying"
                        );
                        self.sleeper.sleep(delay);
                    }
                    last_error = Some(err);
                }
                Err(err) => return Err(RpcError::Client(err)),
            }
        }

        Err(RpcError::ConnectionFailed {
            attempts,
            source: last_error
                .unwrap_or_else(|| ClientError::Unavailable("no attempt made".into())),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Release the client handle. No-op when already disconnected.
    pub fn disconnect(&mut self) {
        if self.client.take().is_some() {
            info!("rpc disconnected");
        }
    }

    /// The live client handle.
    pub fn connection(&self) -> Result<&F::Client, RpcError> {
        self.client.as_ref().ok_or(RpcError::NotConnected)
    }

    pub fn max_retries(&self) -> u32 {
        self.policy.max_retries
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }
}
