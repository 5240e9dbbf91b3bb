//! # harness-rpc: resilient RPC connections to node and wallet processes.
//!
//! - [`config`]: `ConnectionConfig` and `RetryPolicy`
//! - [`connection::RpcConnection`]: owns one client handle, connects with bounded retry
//! - [`client`]: `jsonrpsee` websocket client and factory
//! - [`tls`]: pinning the certificate a process writes
//! - [`error`]: `RpcError`, `ClientError`

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod tls;

pub use client::{
    BestBlock, DEFAULT_NOTIFICATION_METHODS, JsonRpcClient, JsonRpcClientFactory, WalletClient,
};
pub use config::{Backoff, ConnectionConfig, RetryPolicy};
pub use connection::{ClientFactory, NotificationHandler, RpcConnection, Sleeper, ThreadSleeper};
pub use error::{ClientError, RpcError};
