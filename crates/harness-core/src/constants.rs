//! Harness constants. All monetary values in atoms (1 COIN = 10^8 atoms).

pub const ATOMS_PER_COIN: i64 = 100_000_000;

/// Number of fractional digits in a rendered coin amount.
pub const COIN_DECIMALS: usize = 8;

/// Account used when the caller does not name one.
pub const DEFAULT_ACCOUNT_NAME: &str = "default";

/// Largest signature script spending a pay-to-pubkey-hash output:
/// `OP_DATA_73 <sig> OP_DATA_33 <compressed pubkey>`.
pub const SPEND_INPUT_OVERHEAD: usize = 1 + 73 + 1 + 33;

/// Transaction version stamped on skeletons unless overridden.
pub const DEFAULT_TX_VERSION: u16 = 1;

/// Script version of standard outputs.
pub const DEFAULT_SCRIPT_VERSION: u16 = 0;

/// Sequence number of a finalized input.
pub const MAX_TX_IN_SEQUENCE: u32 = u32::MAX;

/// Connection attempts beyond the first before giving up.
pub const DEFAULT_MAX_CONN_RETRIES: u32 = 20;

/// Pause between connection attempts in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// RPC path served by node and wallet processes.
pub const DEFAULT_RPC_ENDPOINT: &str = "ws";

/// Certificate written by an RPC server once it accepts connections.
pub const CERT_FILE_NAME: &str = "rpc.cert";

/// Private key paired with [`CERT_FILE_NAME`].
pub const KEY_FILE_NAME: &str = "rpc.key";

/// How long a launched process gets to write its certificate, in seconds.
pub const DEFAULT_CERT_WAIT_SECS: u64 = 15;
