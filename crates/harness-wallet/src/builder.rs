//! Transaction builder over a wallet collaborator.
//!
//! 1. Add outputs (script + amount, or address + amount)
//! 2. Build: list the account's unspent outputs and fund first-fit

use harness_core::constants::{DEFAULT_ACCOUNT_NAME, DEFAULT_TX_VERSION};
use harness_core::traits::{ScriptBuilder, TxSerializer, Wallet};
use harness_core::types::{Address, TxOut};
use harness_core::Amount;
use tracing::info;

use crate::coin_selection::{CoinSelector, FundedTransaction};
use crate::error::WalletError;

/// Builder for funding transactions out of a wallet.
///
/// # Example
/// ```ignore
/// let funded = TransactionBuilder::new()
///     .add_output(script, Amount::from_atoms(100_000))
///     .set_fee_rate(Amount::from_atoms(10))
///     .build(&wallet, &wallet, &EstimatingSerializer)?;
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    outputs: Vec<TxOut>,
    fee_rate: Amount,
    account: String,
    version: u16,
    lock_time: u32,
}

impl TransactionBuilder {
    /// A builder for the default account with a zero fee rate.
    pub fn new() -> Self {
        Self {
            outputs: Vec::new(),
            fee_rate: Amount::ZERO,
            account: DEFAULT_ACCOUNT_NAME.to_string(),
            version: DEFAULT_TX_VERSION,
            lock_time: 0,
        }
    }

    /// Pay `amount` to an already built output script.
    pub fn add_output(&mut self, pk_script: Vec<u8>, amount: Amount) -> &mut Self {
        self.outputs.push(TxOut::new(amount, pk_script));
        self
    }

    /// Pay `amount` to `address`, building the script with `scripts`.
    pub fn add_payment(
        &mut self,
        address: &Address,
        amount: Amount,
        scripts: &dyn ScriptBuilder,
    ) -> Result<&mut Self, WalletError> {
        let pk_script = scripts.pay_to_address_script(address)?;
        Ok(self.add_output(pk_script, amount))
    }

    /// Fee in atoms per serialized byte.
    pub fn set_fee_rate(&mut self, fee_rate: Amount) -> &mut Self {
        self.fee_rate = fee_rate;
        self
    }

    /// Account to spend from and receive change into.
    pub fn set_account(&mut self, account: impl Into<String>) -> &mut Self {
        self.account = account.into();
        self
    }

    pub fn set_version(&mut self, version: u16) -> &mut Self {
        self.version = version;
        self
    }

    pub fn set_lock_time(&mut self, lock_time: u32) -> &mut Self {
        self.lock_time = lock_time;
        self
    }

    /// List the account's unspent outputs and fund the outputs from them.
    ///
    /// Callers sharing `wallet` across threads must hold the wallet's lock
    /// for the whole call so the same outputs are not selected twice.
    pub fn build<W: Wallet>(
        &self,
        wallet: &W,
        scripts: &dyn ScriptBuilder,
        serializer: &dyn TxSerializer,
    ) -> Result<FundedTransaction, WalletError> {
        let unspent = wallet.list_unspent(&self.account)?;

        let funded = CoinSelector::new(wallet, scripts, serializer)
            .with_version(self.version)
            .with_lock_time(self.lock_time)
            .fund(&self.account, &unspent, self.outputs.clone(), self.fee_rate)?;

        info!(
            account = %self.account,
            inputs = funded.tx.inputs.len(),
            outputs = funded.tx.outputs.len(),
            fee = %funded.fee,
            change = %funded.change,
            "funded transaction"
        );
        Ok(funded)
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments for [`create_transaction`].
#[derive(Debug, Clone)]
pub struct CreateTransactionArgs {
    pub outputs: Vec<TxOut>,
    /// Atoms per serialized byte.
    pub fee_rate: Amount,
    pub account: String,
    pub tx_version: u16,
}

impl CreateTransactionArgs {
    /// Pay `outputs` from the default account at `fee_rate`.
    pub fn new(outputs: Vec<TxOut>, fee_rate: Amount) -> Self {
        Self {
            outputs,
            fee_rate,
            account: DEFAULT_ACCOUNT_NAME.to_string(),
            tx_version: DEFAULT_TX_VERSION,
        }
    }
}

/// Fund a transaction paying `args.outputs` while observing the fee rate.
pub fn create_transaction<W: Wallet>(
    wallet: &W,
    args: CreateTransactionArgs,
    scripts: &dyn ScriptBuilder,
    serializer: &dyn TxSerializer,
) -> Result<FundedTransaction, WalletError> {
    let mut builder = TransactionBuilder::new();
    builder
        .set_fee_rate(args.fee_rate)
        .set_account(args.account)
        .set_version(args.tx_version);
    builder.outputs.extend(args.outputs);
    builder.build(wallet, scripts, serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_core::error::CollaboratorError;
    use harness_core::traits::{AddressProvider, UtxoProvider};
    use harness_core::types::{Hash256, OutPoint, TransactionSkeleton, UnspentOutput};
    use std::cell::RefCell;

    // --- Mock wallet ---

    struct MockWallet {
        unspent: Vec<UnspentOutput>,
        listed_accounts: RefCell<Vec<String>>,
        list_error: Option<CollaboratorError>,
    }

    impl MockWallet {
        fn with_amounts(amounts: &[i64]) -> Self {
            let unspent = amounts
                .iter()
                .enumerate()
                .map(|(i, &amount)| UnspentOutput {
                    outpoint: OutPoint::new(Hash256([i as u8 + 1; 32]), 0, 0),
                    amount: Amount::from_atoms(amount),
                    account: "default".into(),
                    spendable: true,
                    confirmations: 1,
                    address: None,
                    pk_script: vec![],
                })
                .collect();
            Self {
                unspent,
                listed_accounts: RefCell::new(Vec::new()),
                list_error: None,
            }
        }
    }

    impl UtxoProvider for MockWallet {
        fn list_unspent(&self, account: &str) -> Result<Vec<UnspentOutput>, CollaboratorError> {
            self.listed_accounts.borrow_mut().push(account.to_string());
            match &self.list_error {
                Some(e) => Err(e.clone()),
                None => Ok(self.unspent.clone()),
            }
        }
    }

    impl AddressProvider for MockWallet {
        fn new_address(&self, _account: &str) -> Result<Address, CollaboratorError> {
            Ok(Address::new("SsChange").unwrap())
        }
    }

    fn echo_script(address: &Address) -> Result<Vec<u8>, CollaboratorError> {
        Ok(address.as_str().as_bytes().to_vec())
    }

    fn fixed_size(_: &TransactionSkeleton) -> usize {
        200
    }

    #[test]
    fn build_single_output() {
        let wallet = MockWallet::with_amounts(&[150_000]);
        let mut builder = TransactionBuilder::new();
        builder
            .add_output(vec![0xAA; 25], Amount::from_atoms(100_000))
            .set_fee_rate(Amount::from_atoms(10));
        let funded = builder.build(&wallet, &echo_script, &fixed_size).unwrap();

        assert_eq!(funded.tx.outputs[0].value, Amount::from_atoms(100_000));
        assert_eq!(funded.tx.outputs[1].pk_script, b"SsChange".to_vec());
        assert_eq!(funded.change, Amount::from_atoms(46_920));
    }

    #[test]
    fn build_lists_configured_account() {
        let wallet = MockWallet::with_amounts(&[150_000]);
        let mut builder = TransactionBuilder::new();
        builder
            .add_output(vec![0xAA; 25], Amount::from_atoms(1))
            .set_account("savings");
        let err = builder.build(&wallet, &echo_script, &fixed_size).unwrap_err();

        // The mock only holds "default" outputs.
        assert!(matches!(err, WalletError::InsufficientFunds { .. }));
        assert_eq!(*wallet.listed_accounts.borrow(), vec!["savings".to_string()]);
    }

    #[test]
    fn build_propagates_listing_error() {
        let mut wallet = MockWallet::with_amounts(&[150_000]);
        wallet.list_error = Some(CollaboratorError::NotConnected);
        let mut builder = TransactionBuilder::new();
        builder.add_output(vec![0xAA; 25], Amount::from_atoms(1));
        let err = builder.build(&wallet, &echo_script, &fixed_size).unwrap_err();
        assert_eq!(err, WalletError::Collaborator(CollaboratorError::NotConnected));
    }

    #[test]
    fn build_no_outputs_fails() {
        let wallet = MockWallet::with_amounts(&[150_000]);
        let err = TransactionBuilder::new()
            .build(&wallet, &echo_script, &fixed_size)
            .unwrap_err();
        assert_eq!(err, WalletError::NoOutputs);
    }

    #[test]
    fn build_with_version_and_lock_time() {
        let wallet = MockWallet::with_amounts(&[150_000]);
        let mut builder = TransactionBuilder::new();
        builder
            .add_output(vec![0xAA; 25], Amount::from_atoms(1_000))
            .set_version(2)
            .set_lock_time(77);
        let funded = builder.build(&wallet, &echo_script, &fixed_size).unwrap();
        assert_eq!(funded.tx.version, 2);
        assert_eq!(funded.tx.lock_time, 77);
    }

    #[test]
    fn add_payment_uses_script_builder() {
        let mut builder = TransactionBuilder::new();
        let addr = Address::new("SsPayee").unwrap();
        builder
            .add_payment(&addr, Amount::from_atoms(5), &echo_script)
            .unwrap();
        assert_eq!(builder.outputs[0].pk_script, b"SsPayee".to_vec());
    }

    #[test]
    fn add_payment_script_error() {
        let failing = |_: &Address| -> Result<Vec<u8>, CollaboratorError> {
            Err(CollaboratorError::Script("bad".into()))
        };
        let mut builder = TransactionBuilder::new();
        let addr = Address::new("SsPayee").unwrap();
        let err = builder
            .add_payment(&addr, Amount::from_atoms(5), &failing)
            .unwrap_err();
        assert_eq!(err, WalletError::Collaborator(CollaboratorError::Script("bad".into())));
        assert!(builder.outputs.is_empty());
    }

    #[test]
    fn create_transaction_uses_args() {
        let wallet = MockWallet::with_amounts(&[40_000, 40_000, 40_000]);
        let args = CreateTransactionArgs::new(
            vec![TxOut::new(Amount::from_atoms(60_000), vec![0xAA; 25])],
            Amount::from_atoms(10),
        );
        let funded = create_transaction(&wallet, args, &echo_script, &fixed_size).unwrap();
        assert_eq!(funded.tx.inputs.len(), 2);
        assert_eq!(funded.fee, Amount::from_atoms(4_160));
    }

    #[test]
    fn builder_default() {
        let builder = TransactionBuilder::default();
        assert_eq!(builder.account, DEFAULT_ACCOUNT_NAME);
        assert_eq!(builder.fee_rate, Amount::ZERO);
        assert_eq!(builder.version, DEFAULT_TX_VERSION);
        assert_eq!(builder.lock_time, 0);
    }
}
