//! First-fit coin selection.
//!
//! Walks the wallet's unspent outputs in the order given, adding every
//! spendable output of the requested account as an input until the value
//! collected, less the fee for the provisional size, covers the outputs.
//! Selection stops at the first prefix that suffices; outputs are never
//! re-ordered by value.

use harness_core::constants::{DEFAULT_TX_VERSION, SPEND_INPUT_OVERHEAD};
use harness_core::traits::{AddressProvider, ScriptBuilder, TxSerializer};
use harness_core::types::{TransactionSkeleton, TxIn, TxOut, UnspentOutput};
use harness_core::Amount;
use serde::Serialize;
use tracing::debug;

use crate::error::WalletError;

/// Result of funding: the skeleton plus the fee/change breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundedTransaction {
    /// Inputs in selection order; outputs as requested, change last.
    pub tx: TransactionSkeleton,
    /// Fee charged for the size computed when selection stopped.
    pub fee: Amount,
    /// Value of the change output, zero when none was added.
    pub change: Amount,
    /// Total value of the selected inputs.
    pub selected: Amount,
}

/// First-fit funder over borrowed collaborators.
///
/// # Example
/// ```ignore
/// let funded = CoinSelector::new(&wallet, &wallet, &EstimatingSerializer)
///     .fund("default", &unspent, outputs, Amount::from_atoms(10))?;
/// ```
pub struct CoinSelector<'a> {
    addresses: &'a dyn AddressProvider,
    scripts: &'a dyn ScriptBuilder,
    serializer: &'a dyn TxSerializer,
    version: u16,
    lock_time: u32,
}

impl<'a> CoinSelector<'a> {
    pub fn new(
        addresses: &'a dyn AddressProvider,
        scripts: &'a dyn ScriptBuilder,
        serializer: &'a dyn TxSerializer,
    ) -> Self {
        Self {
            addresses,
            scripts,
            serializer,
            version: DEFAULT_TX_VERSION,
            lock_time: 0,
        }
    }

    pub fn with_version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    pub fn with_lock_time(mut self, lock_time: u32) -> Self {
        self.lock_time = lock_time;
        self
    }

    /// Fund `outputs` from `unspent` at `fee_rate` atoms per byte.
    ///
    /// Requests one change address from the address provider only when the
    /// selected value exceeds outputs plus fee. Errors from the address
    /// provider or script builder abort funding and are returned as
    /// [`WalletError::Collaborator`] unchanged.
    pub fn fund(
        &self,
        account: &str,
        unspent: &[UnspentOutput],
        outputs: Vec<TxOut>,
        fee_rate: Amount,
    ) -> Result<FundedTransaction, WalletError> {
        if account.is_empty() {
            return Err(WalletError::EmptyAccount);
        }
        if fee_rate.is_negative() {
            return Err(WalletError::InvalidFeeRate(fee_rate));
        }
        if outputs.is_empty() {
            return Err(WalletError::NoOutputs);
        }

        let mut target = Amount::ZERO;
        for (i, output) in outputs.iter().enumerate() {
            if !output.value.is_positive() {
                return Err(WalletError::InvalidAmount(format!(
                    "output {i} has non-positive value {}",
                    output.value
                )));
            }
            target = target
                .checked_add(output.value)
                .ok_or(WalletError::AmountOverflow)?;
        }

        let mut tx = TransactionSkeleton {
            version: self.version,
            lock_time: self.lock_time,
            ..TransactionSkeleton::with_outputs(outputs)
        };

        let mut selected = Amount::ZERO;
        let mut required_fee = Amount::ZERO;

        for output in unspent {
            // Immature, locked or foreign outputs are never candidates.
            if !output.spendable || output.account != account {
                continue;
            }

            selected = selected
                .checked_add(output.amount)
                .ok_or(WalletError::AmountOverflow)?;
            tx.inputs.push(TxIn::spending(output));

            let size = self.serializer.serialized_size(&tx)
                + SPEND_INPUT_OVERHEAD * tx.inputs.len();
            required_fee = fee_for_size(size, fee_rate)?;

            let collected = selected
                .checked_sub(required_fee)
                .ok_or(WalletError::AmountOverflow)?;

            debug!(
                outpoint = %output.outpoint,
                amount = %output.amount,
                inputs = tx.inputs.len(),
                size,
                fee = %required_fee,
                "selected input"
            );

            if collected < target {
                continue;
            }

            let change = collected - target;
            if change.is_positive() {
                let address = self.addresses.new_address(account)?;
                let pk_script = self.scripts.pay_to_address_script(&address)?;
                debug!(%address, change = %change, "adding change output");
                tx.outputs.push(TxOut::new(change, pk_script));
            }

            return Ok(FundedTransaction {
                tx,
                fee: required_fee,
                change,
                selected,
            });
        }

        Err(WalletError::InsufficientFunds {
            have: selected,
            need: target
                .checked_add(required_fee)
                .ok_or(WalletError::AmountOverflow)?,
        })
    }
}

/// Fee for `size` bytes at `fee_rate` atoms per byte.
pub fn fee_for_size(size: usize, fee_rate: Amount) -> Result<Amount, WalletError> {
    let size = i64::try_from(size).map_err(|_| WalletError::AmountOverflow)?;
    fee_rate
        .checked_mul(size)
        .ok_or(WalletError::AmountOverflow)
}
