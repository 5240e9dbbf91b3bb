//! Error types shared across the harness.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid amount: {0:?}")] Parse(String),
    #[error("too many fractional digits: {0:?}")] Precision(String),
    #[error("amount overflow")] Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty address")] Empty,
    #[error("address contains whitespace: {0:?}")] Whitespace(String),
    #[error("unknown network: {0}")] UnknownNetwork(String),
}

/// Failure reported by a wallet, address, script or RPC collaborator.
///
/// Funding passes these through untouched so callers see the root cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("rpc: {0}")] Rpc(String),
    #[error("account: {0}")] Account(String),
    #[error(transparent)] Address(#[from] AddressError),
    #[error("script: {0}")] Script(String),
    #[error("rpc client is not connected")] NotConnected,
}
