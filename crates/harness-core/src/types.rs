//! Transaction skeleton types handed between the funder, the wallet
//! collaborator and the caller.
//!
//! All monetary values are [`Amount`]s in atoms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::amount::Amount;
use crate::constants::{DEFAULT_SCRIPT_VERSION, DEFAULT_TX_VERSION, MAX_TX_IN_SEQUENCE};
use crate::error::AddressError;

/// A 32-byte hash value, rendered as lowercase hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes).
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Hash256 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Network a node or wallet process runs on.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    #[default]
    Simnet,
    Regtest,
}

impl Network {
    pub fn name(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Simnet => "simnet",
            Network::Regtest => "regtest",
        }
    }

    /// Two-character prefix of pay-to-pubkey-hash addresses.
    pub fn address_prefix(self) -> &'static str {
        match self {
            Network::Mainnet => "Ds",
            Network::Testnet => "Ts",
            Network::Simnet => "Ss",
            Network::Regtest => "Rs",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "simnet" => Ok(Network::Simnet),
            "regtest" => Ok(Network::Regtest),
            other => Err(AddressError::UnknownNetwork(other.to_string())),
        }
    }
}

/// An encoded payment address as reported by the wallet.
///
/// The harness never decodes addresses itself; turning one into a script is
/// the job of a [`ScriptBuilder`](crate::traits::ScriptBuilder).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn new(encoded: impl Into<String>) -> Result<Self, AddressError> {
        let encoded = encoded.into();
        if encoded.is_empty() {
            return Err(AddressError::Empty);
        }
        if encoded.chars().any(char::is_whitespace) {
            return Err(AddressError::Whitespace(encoded));
        }
        Ok(Self(encoded))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Reference to a specific output of a previous transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// Transaction containing the referenced output.
    pub hash: Hash256,
    /// Index of the output within the transaction.
    pub index: u32,
    /// Tree the transaction lives in (0 regular, 1 stake).
    #[serde(default)]
    pub tree: i8,
}

impl OutPoint {
    pub fn new(hash: Hash256, index: u32, tree: i8) -> Self {
        Self { hash, index, tree }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hash, self.index)
    }
}

/// An unsigned transaction input.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxIn {
    /// The outpoint being spent.
    pub previous_outpoint: OutPoint,
    /// Value of the spent output, needed for fee accounting before signing.
    pub value_in: Amount,
    pub sequence: u32,
    /// Empty until the input is signed.
    #[serde(default, with = "hex_bytes")]
    pub signature_script: Vec<u8>,
}

impl TxIn {
    /// An unsigned input spending `output`.
    pub fn spending(output: &UnspentOutput) -> Self {
        Self {
            previous_outpoint: output.outpoint.clone(),
            value_in: output.amount,
            sequence: MAX_TX_IN_SEQUENCE,
            signature_script: Vec::new(),
        }
    }
}

/// A transaction output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxOut {
    pub value: Amount,
    #[serde(default)]
    pub version: u16,
    #[serde(with = "hex_bytes")]
    pub pk_script: Vec<u8>,
}

impl TxOut {
    pub fn new(value: Amount, pk_script: Vec<u8>) -> Self {
        Self {
            value,
            version: DEFAULT_SCRIPT_VERSION,
            pk_script,
        }
    }
}

/// A transaction under construction: ordered inputs and outputs, unsigned.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TransactionSkeleton {
    pub version: u16,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
    pub expiry: u32,
}

impl Default for TransactionSkeleton {
    fn default() -> Self {
        Self {
            version: DEFAULT_TX_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            expiry: 0,
        }
    }
}

impl TransactionSkeleton {
    /// A skeleton paying to `outputs` with no inputs yet.
    pub fn with_outputs(outputs: Vec<TxOut>) -> Self {
        Self {
            outputs,
            ..Self::default()
        }
    }

    /// Sum of input values. `None` on overflow.
    pub fn total_input(&self) -> Option<Amount> {
        Amount::checked_sum(self.inputs.iter().map(|txin| txin.value_in))
    }

    /// Sum of output values. `None` on overflow.
    pub fn total_output(&self) -> Option<Amount> {
        Amount::checked_sum(self.outputs.iter().map(|txout| txout.value))
    }

    /// Serialized size of the full (prefix + witness) encoding as it stands.
    ///
    /// Prefix: version, input outpoints and sequences, outputs, lock time,
    /// expiry. Witness: per-input value, block height, block index and
    /// signature script.
    pub fn estimated_serialize_size(&self) -> usize {
        // hash + index + tree + sequence
        const INPUT_PREFIX: usize = 32 + 4 + 1 + 4;
        // value + block height + block index
        const INPUT_WITNESS: usize = 8 + 4 + 4;
        // value + script version
        const OUTPUT_FIXED: usize = 8 + 2;

        let n_in = self.inputs.len();
        let n_out = self.outputs.len();

        let outputs: usize = self
            .outputs
            .iter()
            .map(|o| OUTPUT_FIXED + varint_size(o.pk_script.len()) + o.pk_script.len())
            .sum();
        let witnesses: usize = self
            .inputs
            .iter()
            .map(|i| {
                INPUT_WITNESS + varint_size(i.signature_script.len()) + i.signature_script.len()
            })
            .sum();

        4 + varint_size(n_in)
            + INPUT_PREFIX * n_in
            + varint_size(n_out)
            + outputs
            + 4
            + 4
            + varint_size(n_in)
            + witnesses
    }
}

/// Bytes used by a compact-size integer.
pub fn varint_size(n: usize) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// A spendable output reported by the wallet.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UnspentOutput {
    pub outpoint: OutPoint,
    pub amount: Amount,
    pub account: String,
    /// False while immature or locked.
    pub spendable: bool,
    #[serde(default)]
    pub confirmations: i64,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default, with = "hex_bytes")]
    pub pk_script: Vec<u8>,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
