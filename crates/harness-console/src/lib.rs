//! # harness-console: node and wallet executables as test fixtures.
//!
//! - [`process`]: `ExternalProcess` and `wait_for_file`
//! - [`cook`]: argument maps for node and wallet command lines
//! - [`node::ConsoleNode`] / [`wallet::ConsoleWallet`]: launch, wait for the
//!   RPC certificate, connect, forward calls, stop and clean up
//! - [`error`]: `ConsoleError`

pub mod cook;
pub mod error;
pub mod node;
pub mod process;
mod service;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use cook::{
    Arguments, DefaultNodeCook, DefaultWalletCook, NodeArgumentsCook, NodeCommandParams,
    WalletArgumentsCook, WalletCommandParams, arguments_to_vec,
};
pub use error::ConsoleError;
pub use node::{ConsoleNode, ConsoleNodeConfig, StartNodeArgs};
pub use process::{ExternalProcess, wait_for_file};
pub use wallet::{ConsoleWallet, ConsoleWalletConfig, StartWalletArgs};
