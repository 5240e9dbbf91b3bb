//! Command-line argument assembly for node and wallet executables.
//!
//! A cook turns the facade's launch parameters into a flag map; the map is
//! rendered with [`arguments_to_vec`]. Caller-supplied extra arguments are
//! merged last and win over cooked ones.

use std::collections::BTreeMap;
use std::path::PathBuf;

use harness_core::{Address, Network};

/// Flag name to optional value. `None` renders as a bare `--flag`.
pub type Arguments = BTreeMap<String, Option<String>>;

/// Render `--key=value` and `--flag` strings in key order.
pub fn arguments_to_vec(arguments: &Arguments) -> Vec<String> {
    arguments
        .iter()
        .map(|(key, value)| match value {
            Some(v) => format!("--{key}={v}"),
            None => format!("--{key}"),
        })
        .collect()
}

/// Launch parameters for a node process.
#[derive(Debug, Clone, Default)]
pub struct NodeCommandParams {
    pub extra_arguments: Arguments,
    pub rpc_user: String,
    pub rpc_pass: String,
    pub rpc_connect: Option<String>,
    pub rpc_listen: String,
    pub p2p_address: String,
    pub app_dir: PathBuf,
    pub debug_level: Option<String>,
    pub profile: Option<String>,
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    pub mining_address: Option<Address>,
    pub network: Network,
}

/// Launch parameters for a wallet process.
#[derive(Debug, Clone, Default)]
pub struct WalletCommandParams {
    pub extra_arguments: Arguments,
    pub node_rpc_user: String,
    pub node_rpc_pass: String,
    pub wallet_rpc_user: String,
    pub wallet_rpc_pass: String,
    /// Node RPC listener the wallet connects to.
    pub rpc_connect: String,
    pub rpc_listen: String,
    pub app_dir: PathBuf,
    pub debug_level: Option<String>,
    pub cert_file: PathBuf,
    pub node_cert_file: Option<PathBuf>,
    pub key_file: PathBuf,
    pub network: Network,
}

pub trait NodeArgumentsCook {
    fn cook_arguments(&self, params: &NodeCommandParams) -> Arguments;
}

pub trait WalletArgumentsCook {
    fn cook_arguments(&self, params: &WalletCommandParams) -> Arguments;
}

impl<F: Fn(&NodeCommandParams) -> Arguments> NodeArgumentsCook for F {
    fn cook_arguments(&self, params: &NodeCommandParams) -> Arguments {
        self(params)
    }
}

impl<F: Fn(&WalletCommandParams) -> Arguments> WalletArgumentsCook for F {
    fn cook_arguments(&self, params: &WalletCommandParams) -> Arguments {
        self(params)
    }
}

/// dcrd-style node flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNodeCook;

impl NodeArgumentsCook for DefaultNodeCook {
    fn cook_arguments(&self, p: &NodeCommandParams) -> Arguments {
        let mut args = Arguments::new();
        set(&mut args, "rpcuser", &p.rpc_user);
        set(&mut args, "rpcpass", &p.rpc_pass);
        set(&mut args, "rpclisten", &p.rpc_listen);
        set(&mut args, "listen", &p.p2p_address);
        set(&mut args, "appdata", p.app_dir.display());
        set(&mut args, "rpccert", p.cert_file.display());
        set(&mut args, "rpckey", p.key_file.display());
        if let Some(connect) = &p.rpc_connect {
            set(&mut args, "connect", connect);
        }
        if let Some(level) = &p.debug_level {
            set(&mut args, "debuglevel", level);
        }
        if let Some(profile) = &p.profile {
            set(&mut args, "profile", profile);
        }
        if let Some(addr) = &p.mining_address {
            set(&mut args, "miningaddr", addr);
        }
        add_network(&mut args, p.network);
        args.extend(p.extra_arguments.clone());
        args
    }
}

/// dcrwallet-style wallet flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultWalletCook;

impl WalletArgumentsCook for DefaultWalletCook {
    fn cook_arguments(&self, p: &WalletCommandParams) -> Arguments {
        let mut args = Arguments::new();
        set(&mut args, "username", &p.wallet_rpc_user);
        set(&mut args, "password", &p.wallet_rpc_pass);
        set(&mut args, "dcrdusername", &p.node_rpc_user);
        set(&mut args, "dcrdpassword", &p.node_rpc_pass);
        set(&mut args, "rpcconnect", &p.rpc_connect);
        set(&mut args, "rpclisten", &p.rpc_listen);
        set(&mut args, "appdata", p.app_dir.display());
        set(&mut args, "rpccert", p.cert_file.display());
        set(&mut args, "rpckey", p.key_file.display());
        if let Some(node_cert) = &p.node_cert_file {
            set(&mut args, "cafile", node_cert.display());
        }
        if let Some(level) = &p.debug_level {
            set(&mut args, "debuglevel", level);
        }
        add_network(&mut args, p.network);
        args.extend(p.extra_arguments.clone());
        args
    }
}

fn set(args: &mut Arguments, key: &str, value: impl std::fmt::Display) {
    args.insert(key.to_string(), Some(value.to_string()));
}

fn add_network(args: &mut Arguments, network: Network) {
    let flag = match network {
        Network::Mainnet => return,
        Network::Testnet => "testnet",
        Network::Simnet => "simnet",
        Network::Regtest => "regnet",
    };
    args.insert(flag.to_string(), None);
}
