//! In-process wallet test double.
//!
//! Holds unspent outputs in memory and derives deterministic addresses from
//! a seed, so funding can be exercised without launching a wallet process.
//! Addresses are the network prefix followed by the hex of a 20-byte
//! SHA-256-derived pubkey hash; [`InMemoryWallet`] builds P2PKH scripts for
//! any address in that form.

use std::collections::{BTreeMap, HashMap, HashSet};

use harness_core::constants::DEFAULT_ACCOUNT_NAME;
use harness_core::error::CollaboratorError;
use harness_core::script::{extract_pubkey_hash, pay_to_pubkey_hash};
use harness_core::traits::{AddressProvider, ScriptBuilder, UtxoProvider};
use harness_core::types::{
    Address, Hash256, Network, OutPoint, TransactionSkeleton, UnspentOutput,
};
use harness_core::Amount;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::WalletError;

#[derive(Debug, Default)]
struct WalletState {
    utxos: Vec<UnspentOutput>,
    locked: HashSet<OutPoint>,
    /// Account name to next address index.
    accounts: BTreeMap<String, u32>,
    /// Pubkey hash to owning address and account.
    owned: HashMap<[u8; 20], (Address, String)>,
}

/// A wallet kept entirely in memory.
#[derive(Debug)]
pub struct InMemoryWallet {
    seed: [u8; 32],
    network: Network,
    state: Mutex<WalletState>,
}

impl InMemoryWallet {
    /// A wallet with only the default account.
    pub fn new(seed: [u8; 32], network: Network) -> Self {
        let mut state = WalletState::default();
        state.accounts.insert(DEFAULT_ACCOUNT_NAME.to_string(), 0);
        Self {
            seed,
            network,
            state: Mutex::new(state),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn create_account(&self, name: &str) -> Result<(), CollaboratorError> {
        if name.is_empty() {
            return Err(CollaboratorError::Account("account name is empty".into()));
        }
        let mut state = self.state.lock();
        if state.accounts.contains_key(name) {
            return Err(CollaboratorError::Account(format!("{name} already exists")));
        }
        state.accounts.insert(name.to_string(), 0);
        Ok(())
    }

    pub fn accounts(&self) -> Vec<String> {
        self.state.lock().accounts.keys().cloned().collect()
    }

    /// Record an output as owned by the wallet.
    pub fn add_utxo(&self, utxo: UnspentOutput) {
        self.state.lock().utxos.push(utxo);
    }

    /// Create a fresh address in `account` and credit it with a confirmed
    /// spendable output at `outpoint`.
    pub fn credit(
        &self,
        account: &str,
        amount: Amount,
        outpoint: OutPoint,
    ) -> Result<UnspentOutput, CollaboratorError> {
        let address = self.new_address(account)?;
        let pk_script = self.pay_to_address_script(&address)?;
        let utxo = UnspentOutput {
            outpoint,
            amount,
            account: account.to_string(),
            spendable: true,
            confirmations: 1,
            address: Some(address),
            pk_script,
        };
        self.add_utxo(utxo.clone());
        Ok(utxo)
    }

    /// Mark an output as locked; it is listed but not spendable.
    pub fn lock_outpoint(&self, outpoint: OutPoint) {
        self.state.lock().locked.insert(outpoint);
    }

    pub fn unlock_outpoints(&self, outpoints: &[OutPoint]) {
        let mut state = self.state.lock();
        for outpoint in outpoints {
            state.locked.remove(outpoint);
        }
    }

    /// Spendable, unlocked value held by `account`.
    pub fn balance(&self, account: &str) -> Result<Amount, WalletError> {
        let state = self.state.lock();
        Amount::checked_sum(
            state
                .utxos
                .iter()
                .filter(|u| {
                    u.account == account && u.spendable && !state.locked.contains(&u.outpoint)
                })
                .map(|u| u.amount),
        )
        .ok_or(WalletError::AmountOverflow)
    }

    pub fn utxo_count(&self) -> usize {
        self.state.lock().utxos.len()
    }

    /// Spend the inputs of `tx` and credit its outputs that pay to this
    /// wallet. Credited outputs are unconfirmed but spendable.
    pub fn apply_transaction(&self, txid: Hash256, tx: &TransactionSkeleton) {
        let mut state = self.state.lock();
        let spent: HashSet<&OutPoint> = tx.inputs.iter().map(|i| &i.previous_outpoint).collect();
        state.utxos.retain(|u| !spent.contains(&u.outpoint));

        for (index, output) in tx.outputs.iter().enumerate() {
            let Some(hash) = extract_pubkey_hash(&output.pk_script) else {
                continue;
            };
            let Some((address, account)) = state.owned.get(&hash).cloned() else {
                continue;
            };
            let outpoint = OutPoint::new(txid, index as u32, 0);
            debug!(%outpoint, %account, value = %output.value, "credited output");
            state.utxos.push(UnspentOutput {
                outpoint,
                amount: output.value,
                account,
                spendable: true,
                confirmations: 0,
                address: Some(address),
                pk_script: output.pk_script.clone(),
            });
        }
    }

    fn derive_pubkey_hash(&self, account: &str, index: u32) -> [u8; 20] {
        let mut hasher = Sha256::new();
        hasher.update(self.seed);
        hasher.update(account.as_bytes());
        hasher.update(index.to_le_bytes());
        let digest = hasher.finalize();
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&digest[..20]);
        hash
    }

    fn decode_pubkey_hash(&self, address: &Address) -> Option<[u8; 20]> {
        let encoded = address.as_str().strip_prefix(self.network.address_prefix())?;
        let mut hash = [0u8; 20];
        hex::decode_to_slice(encoded, &mut hash).ok()?;
        Some(hash)
    }
}

impl UtxoProvider for InMemoryWallet {
    fn list_unspent(&self, account: &str) -> Result<Vec<UnspentOutput>, CollaboratorError> {
        let state = self.state.lock();
        if !state.accounts.contains_key(account) {
            return Err(CollaboratorError::Account(format!("unknown account {account}")));
        }
        Ok(state
            .utxos
            .iter()
            .filter(|u| u.account == account)
            .map(|u| UnspentOutput {
                spendable: u.spendable && !state.locked.contains(&u.outpoint),
                ..u.clone()
            })
            .collect())
    }
}

impl AddressProvider for InMemoryWallet {
    fn new_address(&self, account: &str) -> Result<Address, CollaboratorError> {
        let index = {
            let mut state = self.state.lock();
            let next = state
                .accounts
                .get_mut(account)
                .ok_or_else(|| CollaboratorError::Account(format!("unknown account {account}")))?;
            let index = *next;
            *next += 1;
            index
        };

        let hash = self.derive_pubkey_hash(account, index);
        let address = Address::new(format!(
            "{}{}",
            self.network.address_prefix(),
            hex::encode(hash)
        ))?;
        self.state
            .lock()
            .owned
            .insert(hash, (address.clone(), account.to_string()));
        Ok(address)
    }
}

impl ScriptBuilder for InMemoryWallet {
    fn pay_to_address_script(&self, address: &Address) -> Result<Vec<u8>, CollaboratorError> {
        let hash = self.decode_pubkey_hash(address).ok_or_else(|| {
            CollaboratorError::Script(format!("not a {} address: {address}", self.network))
        })?;
        Ok(pay_to_pubkey_hash(&hash))
    }
}
