//! Wallet process launched from the command line.
//!
//! Once started, [`ConsoleWallet`] forwards unspent-output listing and address
//! generation to the wallet's RPC server, so it can fund transactions
//! through the same collaborator traits as the in-memory wallet.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use harness_core::constants::{DEFAULT_ACCOUNT_NAME, DEFAULT_CERT_WAIT_SECS, DEFAULT_RPC_ENDPOINT};
use harness_core::{Address, AddressProvider, Amount, CollaboratorError, Network, UnspentOutput, UtxoProvider};
use harness_rpc::{ClientFactory, ConnectionConfig, RetryPolicy, RpcConnection, WalletClient};
use tracing::debug;

use crate::cook::{Arguments, DefaultWalletCook, WalletArgumentsCook, WalletCommandParams, arguments_to_vec};
use crate::error::ConsoleError;
use crate::service::{ProcessService, join_host_port};

#[derive(Debug, Clone)]
pub struct ConsoleWalletConfig {
    pub executable: PathBuf,
    pub app_dir: PathBuf,
    pub network: Network,
    pub node_rpc_host: String,
    pub node_rpc_port: u16,
    pub node_user: String,
    pub node_pass: String,
    pub wallet_rpc_host: String,
    pub wallet_rpc_port: u16,
    pub wallet_user: String,
    pub wallet_pass: String,
    pub debug_level: Option<String>,
    pub endpoint: String,
    pub retry: RetryPolicy,
    pub cert_wait: Duration,
    /// Pause between height checks in [`ConsoleWallet::sync`].
    pub sync_poll: Duration,
    /// Give up syncing after this long.
    pub sync_timeout: Duration,
}

impl ConsoleWalletConfig {
    /// Simnet defaults on localhost.
    pub fn new(executable: impl Into<PathBuf>, app_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            app_dir: app_dir.into(),
            network: Network::Simnet,
            node_rpc_host: "127.0.0.1".into(),
            node_rpc_port: 19556,
            node_user: "user".into(),
            node_pass: "pass".into(),
            wallet_rpc_host: "127.0.0.1".into(),
            wallet_rpc_port: 19557,
            wallet_user: "user".into(),
            wallet_pass: "pass".into(),
            debug_level: None,
            endpoint: DEFAULT_RPC_ENDPOINT.into(),
            retry: RetryPolicy::default(),
            cert_wait: Duration::from_secs(DEFAULT_CERT_WAIT_SECS),
            sync_poll: Duration::from_secs(1),
            sync_timeout: Duration::from_secs(120),
        }
    }

    pub fn validate(&self) -> Result<(), ConsoleError> {
        if self.node_rpc_host.is_empty() {
            return Err(ConsoleError::Config("node rpc host is empty".into()));
        }
        if self.wallet_rpc_host.is_empty() {
            return Err(ConsoleError::Config("wallet rpc host is empty".into()));
        }
        if self.node_rpc_port == 0 {
            return Err(ConsoleError::Config("node rpc port is zero".into()));
        }
        if self.wallet_rpc_port == 0 {
            return Err(ConsoleError::Config("wallet rpc port is zero".into()));
        }
        Ok(())
    }
}

/// Per-launch options.
#[derive(Debug, Clone, Default)]
pub struct StartWalletArgs {
    pub extra_arguments: Arguments,
    pub debug_output: bool,
    /// Certificate of the node the wallet connects to.
    pub node_cert_file: Option<PathBuf>,
}

/// A wallet executable driven over RPC.
pub struct ConsoleWallet<F: ClientFactory> {
    config: ConsoleWalletConfig,
    service: ProcessService<F>,
    cook: Box<dyn WalletArgumentsCook>,
}

impl<F: ClientFactory> ConsoleWallet<F> {
    pub fn new(config: ConsoleWalletConfig, factory: F) -> Result<Self, ConsoleError> {
        config.validate()?;
        let service = ProcessService::new(
            "wallet",
            config.executable.clone(),
            config.app_dir.clone(),
            factory,
            config.retry,
            config.cert_wait,
        );
        Ok(Self {
            config,
            service,
            cook: Box::new(DefaultWalletCook),
        })
    }

    pub fn with_cook(mut self, cook: impl WalletArgumentsCook + 'static) -> Self {
        self.cook = Box::new(cook);
        self
    }

    pub fn node_rpc_listener(&self) -> String {
        join_host_port(&self.config.node_rpc_host, self.config.node_rpc_port)
    }

    pub fn wallet_rpc_listener(&self) -> String {
        join_host_port(&self.config.wallet_rpc_host, self.config.wallet_rpc_port)
    }

    pub fn cert_file(&self) -> PathBuf {
        self.service.cert_file()
    }

    pub fn key_file(&self) -> PathBuf {
        self.service.key_file()
    }

    pub fn app_dir(&self) -> &Path {
        self.service.app_dir()
    }

    pub fn network(&self) -> Network {
        self.config.network
    }

    pub fn is_running(&self) -> bool {
        self.service.is_running()
    }

    pub fn rpc_client(&self) -> &RpcConnection<F> {
        self.service.rpc()
    }

    pub fn full_console_command(&self) -> String {
        self.service.process().full_console_command()
    }

    pub fn rpc_connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: self.wallet_rpc_listener(),
            endpoint: self.config.endpoint.clone(),
            user: self.config.wallet_user.clone(),
            pass: self.config.wallet_pass.clone(),
            certificate_file: Some(self.cert_file()),
        }
    }

    fn command_params(&self, args: &StartWalletArgs) -> WalletCommandParams {
        WalletCommandParams {
            extra_arguments: args.extra_arguments.clone(),
            node_rpc_user: self.config.node_user.clone(),
            node_rpc_pass: self.config.node_pass.clone(),
            wallet_rpc_user: self.config.wallet_user.clone(),
            wallet_rpc_pass: self.config.wallet_pass.clone(),
            rpc_connect: self.node_rpc_listener(),
            rpc_listen: self.wallet_rpc_listener(),
            app_dir: self.config.app_dir.clone(),
            debug_level: self.config.debug_level.clone(),
            cert_file: self.cert_file(),
            node_cert_file: args.node_cert_file.clone(),
            key_file: self.key_file(),
            network: self.config.network,
        }
    }

    /// Launch the wallet and connect to its RPC server.
    pub fn start(&mut self, args: &StartWalletArgs) -> Result<(), ConsoleError> {
        let arguments = arguments_to_vec(&self.cook.cook_arguments(&self.command_params(args)));
        let rpc_config = self.rpc_connection_config();
        self.service.start(arguments, args.debug_output, &rpc_config)
    }

    pub fn stop(&mut self) -> Result<(), ConsoleError> {
        self.service.stop()
    }

    pub fn dispose(&mut self) -> Result<(), ConsoleError> {
        self.service.dispose()
    }
}

impl<F> ConsoleWallet<F>
where
    F: ClientFactory,
    F::Client: WalletClient,
{
    fn client(&self) -> Result<&F::Client, ConsoleError> {
        self.service.connection()
    }

    /// Fresh address for `account`, or the default account when `None`.
    pub fn get_new_address(&self, account: Option<&str>) -> Result<Address, ConsoleError> {
        Ok(self
            .client()?
            .get_new_address(account.unwrap_or(DEFAULT_ACCOUNT_NAME))?)
    }

    pub fn get_balance(&self, account: &str) -> Result<Amount, ConsoleError> {
        Ok(self.client()?.get_balance(account)?)
    }

    pub fn create_new_account(&self, name: &str) -> Result<(), ConsoleError> {
        Ok(self.client()?.create_new_account(name)?)
    }

    pub fn validate_address(&self, address: &Address) -> Result<bool, ConsoleError> {
        Ok(self.client()?.validate_address(address)?)
    }

    pub fn wallet_lock(&self) -> Result<(), ConsoleError> {
        Ok(self.client()?.wallet_lock()?)
    }

    pub fn wallet_unlock(&self, passphrase: &str, timeout: Duration) -> Result<(), ConsoleError> {
        Ok(self.client()?.wallet_unlock(passphrase, timeout)?)
    }

    /// Height of the wallet's best block.
    pub fn synced_height(&self) -> Result<i64, ConsoleError> {
        Ok(self.client()?.get_best_block()?.height)
    }

    /// Poll until the wallet reaches `desired_height` and return the height
    /// reached, or fail after `sync_timeout`.
    pub fn sync(&self, desired_height: i64) -> Result<i64, ConsoleError> {
        let started = Instant::now();
        loop {
            let height = self.synced_height()?;
            if height >= desired_height {
                return Ok(height);
            }
            if started.elapsed() >= self.config.sync_timeout {
                return Err(ConsoleError::SyncTimeout {
                    reached: height,
                    target: desired_height,
                });
            }
            debug!(height, desired_height, "waiting for wallet sync");
            std::thread::sleep(self.config.sync_poll);
        }
    }
}

impl<F> UtxoProvider for ConsoleWallet<F>
where
    F: ClientFactory,
    F::Client: WalletClient,
{
    fn list_unspent(&self, account: &str) -> Result<Vec<UnspentOutput>, CollaboratorError> {
        Ok(self.client()?.list_unspent(account)?)
    }
}

impl<F> AddressProvider for ConsoleWallet<F>
where
    F: ClientFactory,
    F::Client: WalletClient,
{
    fn new_address(&self, account: &str) -> Result<Address, CollaboratorError> {
        Ok(self.client()?.get_new_address(account)?)
    }
}
