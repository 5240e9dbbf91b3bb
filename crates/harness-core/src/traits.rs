//! Collaborator interfaces consumed by the funder.
//!
//! - [`UtxoProvider`]: lists the wallet's unspent outputs
//! - [`AddressProvider`]: hands out fresh change addresses
//! - [`ScriptBuilder`]: turns an address into an output script
//! - [`TxSerializer`]: measures a skeleton for fee computation
//!
//! The in-memory test wallet and the RPC-backed console wallet both
//! implement [`Wallet`].

use crate::error::CollaboratorError;
use crate::types::{Address, TransactionSkeleton, UnspentOutput};

/// Source of the wallet's unspent outputs.
pub trait UtxoProvider {
    /// Unspent outputs belonging to `account`, in wallet order.
    fn list_unspent(&self, account: &str) -> Result<Vec<UnspentOutput>, CollaboratorError>;
}

/// Source of fresh addresses.
pub trait AddressProvider {
    /// A new address owned by `account`.
    fn new_address(&self, account: &str) -> Result<Address, CollaboratorError>;
}

/// A wallet able to both list outputs and issue addresses.
pub trait Wallet: UtxoProvider + AddressProvider {}

impl<T: UtxoProvider + AddressProvider> Wallet for T {}

/// Builds the output script paying to an address.
pub trait ScriptBuilder {
    fn pay_to_address_script(&self, address: &Address) -> Result<Vec<u8>, CollaboratorError>;
}

impl<F> ScriptBuilder for F
where
    F: Fn(&Address) -> Result<Vec<u8>, CollaboratorError>,
{
    fn pay_to_address_script(&self, address: &Address) -> Result<Vec<u8>, CollaboratorError> {
        self(address)
    }
}

/// Measures the serialized size of a skeleton in bytes.
pub trait TxSerializer {
    fn serialized_size(&self, tx: &TransactionSkeleton) -> usize;
}

impl<F> TxSerializer for F
where
    F: Fn(&TransactionSkeleton) -> usize,
{
    fn serialized_size(&self, tx: &TransactionSkeleton) -> usize {
        self(tx)
    }
}

/// Serializer using [`TransactionSkeleton::estimated_serialize_size`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatingSerializer;

impl TxSerializer for EstimatingSerializer {
    fn serialized_size(&self, tx: &TransactionSkeleton) -> usize {
        tx.estimated_serialize_size()
    }
}
