//! harness-cli: fund transactions offline and probe node/wallet RPC servers.
//!
//! `fund` loads unspent outputs from a JSON file into an in-memory wallet and
//! prints the funded skeleton. `probe` connects to an RPC server with the
//! retrying connection manager. `node-args` prints the command line a console
//! node would be launched with.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use harness_console::{
    DefaultNodeCook, NodeArgumentsCook, NodeCommandParams, arguments_to_vec,
};
use harness_core::constants::{CERT_FILE_NAME, DEFAULT_ACCOUNT_NAME, KEY_FILE_NAME};
use harness_core::{Address, Amount, EstimatingSerializer, Network, UnspentOutput};
use harness_rpc::{
    ConnectionConfig, JsonRpcClientFactory, RetryPolicy, RpcConnection, WalletClient,
};
use harness_wallet::{InMemoryWallet, TransactionBuilder};
use tracing::info;

/// Coinharness command-line tools.
#[derive(Parser)]
#[command(name = "harness-cli")]
#[command(version, about = "Funding and RPC plumbing for node/wallet integration tests.")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fund a transaction from a UTXO file.
    Fund(FundArgs),
    /// Connect to an RPC server and print its best block.
    Probe(ProbeArgs),
    /// Print the command line a console node would be launched with.
    NodeArgs(NodeArgsArgs),
}

#[derive(Args)]
struct FundArgs {
    /// JSON array of unspent outputs.
    #[arg(short, long)]
    utxos: PathBuf,

    /// Payment as `ADDRESS=AMOUNT`, amount in coins. Repeatable.
    ///
    /// The address must be in the in-memory wallet's form: the network
    /// prefix followed by a 40-hex pubkey hash. Use `--to-script` for any
    /// other payee.
    #[arg(short = 't', long = "to", required_unless_present = "script_payments")]
    payments: Vec<String>,

    /// Payment as `HEX_SCRIPT=AMOUNT` to a raw output script. Repeatable.
    #[arg(long = "to-script")]
    script_payments: Vec<String>,

    /// Fee rate in atoms per byte.
    #[arg(short, long, default_value_t = 10)]
    fee_rate: i64,

    /// Account to spend from.
    #[arg(short, long, default_value = DEFAULT_ACCOUNT_NAME)]
    account: String,

    /// Network (mainnet, testnet, simnet, regtest).
    #[arg(short, long, default_value = "simnet")]
    network: String,

    /// Hex-encoded 32-byte seed for change addresses.
    #[arg(long)]
    seed: Option<String>,
}

#[derive(Args)]
struct ProbeArgs {
    /// RPC listener as host:port.
    #[arg(long, env = "HARNESS_RPC_HOST", default_value = "127.0.0.1:19556")]
    rpc_host: String,

    #[arg(long, env = "HARNESS_RPC_ENDPOINT", default_value = "ws")]
    rpc_endpoint: String,

    #[arg(long, env = "HARNESS_RPC_USER", default_value = "")]
    rpc_user: String,

    #[arg(long, env = "HARNESS_RPC_PASS", default_value = "")]
    rpc_pass: String,

    /// Certificate written by the server; connect waits for it.
    #[arg(long, env = "HARNESS_RPC_CERT")]
    rpc_cert: Option<PathBuf>,

    /// Connection attempts after the first.
    #[arg(long, default_value_t = 20)]
    retries: u32,

    /// Pause between attempts in milliseconds.
    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,
}

#[derive(Args)]
struct NodeArgsArgs {
    /// Node application directory (default: <data dir>/coinharness/node).
    #[arg(long)]
    app_dir: Option<PathBuf>,

    #[arg(long, default_value = "simnet")]
    network: String,

    #[arg(long, default_value = "127.0.0.1:19556")]
    rpc_listen: String,

    #[arg(long, default_value = "127.0.0.1:18555")]
    p2p_listen: String,

    #[arg(long, default_value = "user")]
    rpc_user: String,

    #[arg(long, default_value = "pass")]
    rpc_pass: String,

    /// Address receiving mined coins.
    #[arg(long)]
    mining_address: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Commands::Fund(args) => fund(args),
        Commands::Probe(args) => probe(args),
        Commands::NodeArgs(args) => node_args(args),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Fund the requested payments and print the result as JSON.
fn fund(args: FundArgs) -> Result<()> {
    let network: Network = args.network.parse().context("Invalid network")?;
    let seed = parse_seed(args.seed.as_deref())?;

    let raw = std::fs::read_to_string(&args.utxos)
        .with_context(|| format!("Failed to read {}", args.utxos.display()))?;
    let utxos: Vec<UnspentOutput> =
        serde_json::from_str(&raw).context("Failed to parse UTXO file")?;

    let wallet = load_wallet(seed, network, utxos)?;
    let balance = wallet
        .balance(&args.account)
        .with_context(|| format!("Balance of account {} overflows", args.account))?;
    info!(utxos = wallet.utxo_count(), %balance, "wallet loaded");

    let mut builder = TransactionBuilder::new();
    builder
        .set_account(args.account)
        .set_fee_rate(Amount::from_atoms(args.fee_rate));
    for payment in &args.payments {
        let (address, amount) = parse_payment(payment)?;
        builder
            .add_payment(&address, amount, &wallet)
            .with_context(|| format!("Invalid payment {payment}"))?;
    }
    for payment in &args.script_payments {
        let (pk_script, amount) = parse_script_payment(payment)?;
        builder.add_output(pk_script, amount);
    }

    let funded = builder
        .build(&wallet, &wallet, &EstimatingSerializer)
        .context("Funding failed")?;
    println!("{}", serde_json::to_string_pretty(&funded)?);
    Ok(())
}

/// Connect with retries and print the server's best block.
fn probe(args: ProbeArgs) -> Result<()> {
    let config = ConnectionConfig {
        host: args.rpc_host,
        endpoint: args.rpc_endpoint,
        user: args.rpc_user,
        pass: args.rpc_pass,
        certificate_file: args.rpc_cert,
    };
    let policy = RetryPolicy::fixed(args.retries, Duration::from_millis(args.retry_delay_ms));

    let mut connection = RpcConnection::new(JsonRpcClientFactory::default(), policy);
    connection
        .connect(&config, None)
        .with_context(|| format!("Failed to connect to {}", config.url()))?;

    let best = connection
        .connection()?
        .get_best_block()
        .context("getbestblock failed")?;
    println!("{}", serde_json::to_string_pretty(&best)?);

    connection.disconnect();
    Ok(())
}

fn node_args(args: NodeArgsArgs) -> Result<()> {
    let app_dir = resolve_app_dir(args.app_dir)?;
    let network: Network = args.network.parse().context("Invalid network")?;
    let mining_address = args
        .mining_address
        .map(Address::new)
        .transpose()
        .context("Invalid mining address")?;

    let params = NodeCommandParams {
        rpc_user: args.rpc_user,
        rpc_pass: args.rpc_pass,
        rpc_listen: args.rpc_listen,
        p2p_address: args.p2p_listen,
        cert_file: app_dir.join(CERT_FILE_NAME),
        key_file: app_dir.join(KEY_FILE_NAME),
        app_dir,
        mining_address,
        network,
        ..Default::default()
    };
    for arg in arguments_to_vec(&DefaultNodeCook.cook_arguments(&params)) {
        println!("{arg}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// In-memory wallet holding `utxos`, with every account they name.
fn load_wallet(
    seed: [u8; 32],
    network: Network,
    utxos: Vec<UnspentOutput>,
) -> Result<InMemoryWallet> {
    let wallet = InMemoryWallet::new(seed, network);
    for utxo in utxos {
        if !wallet.accounts().contains(&utxo.account) {
            wallet
                .create_account(&utxo.account)
                .with_context(|| format!("Failed to create account {}", utxo.account))?;
        }
        wallet.add_utxo(utxo);
    }
    Ok(wallet)
}

fn resolve_app_dir(path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(p) = path {
        return Ok(p);
    }
    let data = dirs::data_local_dir().context("Could not determine data directory")?;
    Ok(data.join("coinharness").join("node"))
}

/// Parse `ADDRESS=AMOUNT` with the amount in coins.
fn parse_payment(s: &str) -> Result<(Address, Amount)> {
    let Some((address, amount)) = s.split_once('=') else {
        bail!("Payment must be ADDRESS=AMOUNT, got {s:?}");
    };
    let address = Address::new(address).context("Invalid address")?;
    Ok((address, parse_payment_amount(amount)?))
}

/// Parse `HEX_SCRIPT=AMOUNT` with the amount in coins.
fn parse_script_payment(s: &str) -> Result<(Vec<u8>, Amount)> {
    let Some((script, amount)) = s.split_once('=') else {
        bail!("Script payment must be HEX_SCRIPT=AMOUNT, got {s:?}");
    };
    let pk_script = hex::decode(script).context("Output script must be hex")?;
    if pk_script.is_empty() {
        bail!("Output script must not be empty");
    }
    Ok((pk_script, parse_payment_amount(amount)?))
}

fn parse_payment_amount(s: &str) -> Result<Amount> {
    let amount: Amount = s.parse().context("Invalid amount")?;
    if !amount.is_positive() {
        bail!("Payment amount must be positive");
    }
    Ok(amount)
}

fn parse_seed(s: Option<&str>) -> Result<[u8; 32]> {
    let mut seed = [0u8; 32];
    if let Some(hex_seed) = s {
        hex::decode_to_slice(hex_seed, &mut seed).context("Seed must be 64 hex characters")?;
    }
    Ok(seed)
}
