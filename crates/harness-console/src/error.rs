//! Console facade errors.

use std::path::PathBuf;
use std::time::Duration;

use harness_core::error::CollaboratorError;
use harness_rpc::RpcError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// Start on a running facade, stop on a stopped one.
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("config: {0}")]
    Config(String),
    #[error("io error on {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("{} did not appear within {waited:?}", path.display())]
    FileTimeout { path: PathBuf, waited: Duration },
    #[error("wallet synced to height {reached}, wanted {target}")]
    SyncTimeout { reached: i64, target: i64 },
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl ConsoleError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        ConsoleError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<ConsoleError> for CollaboratorError {
    fn from(err: ConsoleError) -> Self {
        match err {
            ConsoleError::Rpc(rpc) => rpc.into(),
            other => CollaboratorError::Rpc(other.to_string()),
        }
    }
}
