//! # harness-wallet: transaction funding for test harnesses.
//!
//! Selects spendable outputs first-fit in wallet order, charges a per-byte
//! fee on the provisional size, and appends a change output when value is
//! left over.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` enum
//! - [`coin_selection`]: first-fit funder
//! - [`builder`]: transaction builder over a wallet collaborator
//! - [`memory`]: in-process wallet test double

pub mod builder;
pub mod coin_selection;
pub mod error;
pub mod memory;

// Re-exports for convenient access
pub use builder::{create_transaction, CreateTransactionArgs, TransactionBuilder};
pub use coin_selection::{CoinSelector, FundedTransaction};
pub use error::WalletError;
pub use memory::InMemoryWallet;
