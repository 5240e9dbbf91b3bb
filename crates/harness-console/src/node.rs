//! Node process launched from the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use harness_core::constants::{DEFAULT_CERT_WAIT_SECS, DEFAULT_RPC_ENDPOINT};
use harness_core::{Address, Network};
use harness_rpc::{ClientFactory, ConnectionConfig, RetryPolicy, RpcConnection, WalletClient};

use crate::cook::{Arguments, DefaultNodeCook, NodeArgumentsCook, NodeCommandParams, arguments_to_vec};
use crate::error::ConsoleError;
use crate::service::{ProcessService, join_host_port};

#[derive(Debug, Clone)]
pub struct ConsoleNodeConfig {
    pub executable: PathBuf,
    pub app_dir: PathBuf,
    pub network: Network,
    pub rpc_user: String,
    pub rpc_pass: String,
    pub p2p_host: String,
    pub p2p_port: u16,
    pub rpc_host: String,
    pub rpc_port: u16,
    /// Peer to connect to on launch.
    pub rpc_connect: Option<String>,
    pub debug_level: Option<String>,
    pub profile: Option<String>,
    pub endpoint: String,
    pub retry: RetryPolicy,
    /// How long the launched node gets to write `rpc.cert`.
    pub cert_wait: Duration,
}

impl ConsoleNodeConfig {
    /// Simnet defaults on localhost.
    pub fn new(executable: impl Into<PathBuf>, app_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            app_dir: app_dir.into(),
            network: Network::Simnet,
            rpc_user: "user".into(),
            rpc_pass: "pass".into(),
            p2p_host: "127.0.0.1".into(),
            p2p_port: 18555,
            rpc_host: "127.0.0.1".into(),
            rpc_port: 19556,
            rpc_connect: None,
            debug_level: None,
            profile: None,
            endpoint: DEFAULT_RPC_ENDPOINT.into(),
            retry: RetryPolicy::default(),
            cert_wait: Duration::from_secs(DEFAULT_CERT_WAIT_SECS),
        }
    }
}

/// Per-launch options.
#[derive(Debug, Clone, Default)]
pub struct StartNodeArgs {
    pub extra_arguments: Arguments,
    pub debug_output: bool,
    pub mining_address: Option<Address>,
}

/// A node executable driven over RPC.
pub struct ConsoleNode<F: ClientFactory> {
    config: ConsoleNodeConfig,
    service: ProcessService<F>,
    cook: Box<dyn NodeArgumentsCook>,
}

impl<F: ClientFactory> ConsoleNode<F> {
    pub fn new(config: ConsoleNodeConfig, factory: F) -> Self {
        let service = ProcessService::new(
            "node",
            config.executable.clone(),
            config.app_dir.clone(),
            factory,
            config.retry,
            config.cert_wait,
        );
        Self {
            config,
            service,
            cook: Box::new(DefaultNodeCook),
        }
    }

    pub fn with_cook(mut self, cook: impl NodeArgumentsCook + 'static) -> Self {
        self.cook = Box::new(cook);
        self
    }

    pub fn p2p_address(&self) -> String {
        join_host_port(&self.config.p2p_host, self.config.p2p_port)
    }

    pub fn rpc_listen(&self) -> String {
        join_host_port(&self.config.rpc_host, self.config.rpc_port)
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

    /// Command line of the last launch.
    pub fn full_console_command(&self) -> String {
        self.service.process().full_console_command()
    }

    pub fn rpc_connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: self.rpc_listen(),
            endpoint: self.config.endpoint.clone(),
            user: self.config.rpc_user.clone(),
            pass: self.config.rpc_pass.clone(),
            certificate_file: Some(self.cert_file()),
        }
    }

    fn command_params(&self, args: &StartNodeArgs) -> NodeCommandParams {
        NodeCommandParams {
            extra_arguments: args.extra_arguments.clone(),
            rpc_user: self.config.rpc_user.clone(),
            rpc_pass: self.config.rpc_pass.clone(),
            rpc_connect: self.config.rpc_connect.clone(),
            rpc_listen: self.rpc_listen(),
            p2p_address: self.p2p_address(),
            app_dir: self.config.app_dir.clone(),
            debug_level: self.config.debug_level.clone(),
            profile: self.config.profile.clone(),
            cert_file: self.cert_file(),
            key_file: self.key_file(),
            mining_address: args.mining_address.clone(),
            network: self.config.network,
        }
    }

    /// Launch the node and connect to its RPC server.
    pub fn start(&mut self, args: &StartNodeArgs) -> Result<(), ConsoleError> {
        let arguments = arguments_to_vec(&self.cook.cook_arguments(&self.command_params(args)));
        let rpc_config = self.rpc_connection_config();
        self.service.start(arguments, args.debug_output, &rpc_config)
    }

    pub fn stop(&mut self) -> Result<(), ConsoleError> {
        self.service.stop()
    }

    /// Stop if running.
    pub fn dispose(&mut self) -> Result<(), ConsoleError> {
        self.service.dispose()
    }
}

impl<F> ConsoleNode<F>
where
    F: ClientFactory,
    F::Client: WalletClient,
{
    pub fn wallet_lock(&self) -> Result<(), ConsoleError> {
        Ok(self.service.connection()?.wallet_lock()?)
    }

    pub fn wallet_unlock(&self, passphrase: &str, timeout: Duration) -> Result<(), ConsoleError> {
        Ok(self.service.connection()?.wallet_unlock(passphrase, timeout)?)
    }
}
