//! RPC error types.

use harness_core::error::CollaboratorError;
use thiserror::Error;

/// Failure reported by a [`ClientFactory`](crate::connection::ClientFactory).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The endpoint is not ready yet; worth retrying.
    #[error("endpoint unavailable: {0}")]
    Unavailable(String),
    /// The configuration can never produce a client.
    #[error("client rejected: {0}")]
    Rejected(String),
}

impl ClientError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Unavailable(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("rpc client already connected")]
    AlreadyConnected,
    #[error("rpc client is not connected")]
    NotConnected,
    #[error("failed to connect after {attempts} attempts: {source}")]
    ConnectionFailed {
        attempts: u32,
        #[source]
        source: ClientError,
    },
    #[error(transparent)]
    Client(ClientError),
    #[error("rpc call failed: {0}")]
    Call(String),
    #[error("config: {0}")]
    Config(String),
}

impl From<RpcError> for CollaboratorError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::NotConnected => CollaboratorError::NotConnected,
            other => CollaboratorError::Rpc(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_is_transient() {
        assert!(ClientError::Unavailable("refused".into()).is_transient());
        assert!(!ClientError::Rejected("bad url".into()).is_transient());
    }

    #[test]
    fn display_connection_failed() {
        let e = RpcError::ConnectionFailed {
            attempts: 3,
            source: ClientError::Unavailable("connection refused".into()),
        };
        assert_eq!(
            e.to_string(),
            "failed to connect after 3 attempts: endpoint unavailable: connection refused"
        );
    }

    #[test]
    fn connection_failed_keeps_source() {
        use std::error::Error as _;
        let e = RpcError::ConnectionFailed {
            attempts: 1,
            source: ClientError::Unavailable("x".into()),
        };
        assert_eq!(e.source().unwrap().to_string(), "endpoint unavailable: x");
    }

    #[test]
    fn into_collaborator_error() {
        assert_eq!(
            CollaboratorError::from(RpcError::NotConnected),
            CollaboratorError::NotConnected
        );
        assert_eq!(
            CollaboratorError::from(RpcError::Call("boom".into())),
            CollaboratorError::Rpc("rpc call failed: boom".into())
        );
    }
}
