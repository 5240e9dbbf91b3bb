//! # harness-core
//! Foundation types and collaborator traits shared by the coinharness crates.
//!
//! # Modules
//!
//! - [`amount`]: fixed-point `Amount` in atoms
//! - [`constants`]: harness-wide constants
//! - [`error`]: `AmountError`, `AddressError`, `CollaboratorError`
//! - [`script`]: pay-to-pubkey-hash script helpers
//! - [`traits`]: UTXO, address, script and serializer collaborators
//! - [`types`]: outpoints, inputs, outputs, skeletons, unspent outputs

pub mod amount;
pub mod constants;
pub mod error;
pub mod script;
pub mod traits;
pub mod types;

pub use amount::Amount;
pub use error::{AddressError, AmountError, CollaboratorError};
pub use traits::{
    AddressProvider, EstimatingSerializer, ScriptBuilder, TxSerializer, UtxoProvider, Wallet,
};
pub use types::{
    Address, Hash256, Network, OutPoint, TransactionSkeleton, TxIn, TxOut, UnspentOutput,
};
