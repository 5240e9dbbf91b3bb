//! `jsonrpsee` websocket client for node and wallet processes.
//!
//! The harness drives processes from synchronous test code, so each
//! [`JsonRpcClient`] owns a small tokio runtime and blocks on it for every
//! call. The runtime also keeps the websocket and notification forwarding
//! alive between calls.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use jsonrpsee::core::client::{ClientT, Subscription, SubscriptionClientT};
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::ws_client::{HeaderMap, HeaderValue, WsClient, WsClientBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use harness_core::{Address, Amount, Hash256, OutPoint, UnspentOutput};

use crate::config::ConnectionConfig;
use crate::connection::{ClientFactory, NotificationHandler};
use crate::error::{ClientError, RpcError};
use crate::tls;

/// Notifications the node pushes once a client registers for them.
pub const DEFAULT_NOTIFICATION_METHODS: &[&str] = &[
    "blockconnected",
    "blockdisconnected",
    "relevanttxaccepted",
    "txaccepted",
    "txacceptedverbose",
    "reorganization",
];

/// Chain tip reported by `getbestblock`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BestBlock {
    pub hash: Hash256,
    pub height: i64,
}

/// Wallet RPCs forwarded by the console facades.
pub trait WalletClient {
    fn list_unspent(&self, account: &str) -> Result<Vec<UnspentOutput>, RpcError>;
    fn get_new_address(&self, account: &str) -> Result<Address, RpcError>;
    fn get_balance(&self, account: &str) -> Result<Amount, RpcError>;
    fn get_best_block(&self) -> Result<BestBlock, RpcError>;
    fn create_new_account(&self, name: &str) -> Result<(), RpcError>;
    fn wallet_lock(&self) -> Result<(), RpcError>;
    fn wallet_unlock(&self, passphrase: &str, timeout: Duration) -> Result<(), RpcError>;
    fn validate_address(&self, address: &Address) -> Result<bool, RpcError>;
}

/// Blocking JSON-RPC client over a websocket.
pub struct JsonRpcClient {
    // Dropped before the runtime that drives it.
    inner: WsClient,
    runtime: tokio::runtime::Runtime,
    url: String,
    subscribed: Vec<String>,
}

impl std::fmt::Debug for JsonRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcClient")
            .field("url", &self.url)
            .field("subscribed", &self.subscribed)
            .finish()
    }
}

impl JsonRpcClient {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Notification methods forwarded to the handler given at connect time.
    pub fn subscribed_notifications(&self) -> &[String] {
        &self.subscribed
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// Issue `method` with positional `params` and wait for the result.
    pub fn call<R: DeserializeOwned>(&self, method: &str, params: ArrayParams) -> Result<R, RpcError> {
        debug!(method, url = %self.url, "rpc call");
        self.runtime
            .block_on(self.inner.request(method, params))
            .map_err(|e| RpcError::Call(format!("{method}: {e}")))
    }
}

impl WalletClient for JsonRpcClient {
    fn list_unspent(&self, account: &str) -> Result<Vec<UnspentOutput>, RpcError> {
        let mut p = ArrayParams::new();
        insert(&mut p, 1)?;
        insert(&mut p, 9_999_999)?;
        insert(&mut p, Vec::<String>::new())?;
        insert(&mut p, account)?;
        let entries: Vec<ListUnspentEntry> = self.call("listunspent", p)?;
        entries
            .into_iter()
            .filter(|e| e.account == account)
            .map(ListUnspentEntry::into_unspent)
            .collect()
    }

    fn get_new_address(&self, account: &str) -> Result<Address, RpcError> {
        let encoded: String = self.call("getnewaddress", params([account])?)?;
        Address::new(encoded).map_err(|e| RpcError::Call(format!("getnewaddress: {e}")))
    }

    fn get_balance(&self, account: &str) -> Result<Amount, RpcError> {
        let reply: serde_json::Value = self.call("getbalance", params([account])?)?;
        parse_balance(&reply, account)
    }

    fn get_best_block(&self) -> Result<BestBlock, RpcError> {
        self.call("getbestblock", ArrayParams::new())
    }

    fn create_new_account(&self, name: &str) -> Result<(), RpcError> {
        let _: serde_json::Value = self.call("createnewaccount", params([name])?)?;
        Ok(())
    }

    fn wallet_lock(&self) -> Result<(), RpcError> {
        let _: serde_json::Value = self.call("walletlock", ArrayParams::new())?;
        Ok(())
    }

    fn wallet_unlock(&self, passphrase: &str, timeout: Duration) -> Result<(), RpcError> {
        let mut p = ArrayParams::new();
        insert(&mut p, passphrase)?;
        insert(&mut p, timeout.as_secs())?;
        let _: serde_json::Value = self.call("walletpassphrase", p)?;
        Ok(())
    }

    fn validate_address(&self, address: &Address) -> Result<bool, RpcError> {
        let reply: serde_json::Value = self.call("validateaddress", params([address.as_str()])?)?;
        Ok(reply["isvalid"].as_bool().unwrap_or(false))
    }
}

/// Builds [`JsonRpcClient`]s, probing the listener first.
#[derive(Debug, Clone)]
pub struct JsonRpcClientFactory {
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
    /// Methods forwarded to the notification handler, when one is given.
    pub notification_methods: Vec<String>,
}

impl Default for JsonRpcClientFactory {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(1),
            notification_methods: DEFAULT_NOTIFICATION_METHODS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl ClientFactory for JsonRpcClientFactory {
    type Client = JsonRpcClient;

    /// A certificate that is not written yet, a refused listener and a
    /// failed handshake are `Unavailable`, so the connection manager retries
    /// them while the process starts up.
    fn new_client(
        &self,
        config: &ConnectionConfig,
        handler: Option<NotificationHandler>,
    ) -> Result<JsonRpcClient, ClientError> {
        let tls_config = match &config.certificate_file {
            Some(cert) => Some(tls::pinned_client_config(tls::load_pinned_certs(cert)?)?),
            None => None,
        };

        let addr = config
            .host
            .to_socket_addrs()
            .map_err(|e| ClientError::Rejected(format!("invalid host {:?}: {e}", config.host)))?
            .next()
            .ok_or_else(|| ClientError::Rejected(format!("host {:?} resolved to nothing", config.host)))?;

        TcpStream::connect_timeout(&addr, self.probe_timeout)
            .map_err(|e| ClientError::Unavailable(format!("{addr}: {e}")))?;

        let mut headers = HeaderMap::new();
        let token = STANDARD.encode(format!("{}:{}", config.user, config.pass));
        let auth = HeaderValue::from_str(&format!("Basic {token}"))
            .map_err(|e| ClientError::Rejected(format!("authorization header: {e}")))?;
        headers.insert("Authorization", auth);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("harness-rpc")
            .enable_all()
            .build()
            .map_err(|e| ClientError::Rejected(format!("tokio runtime: {e}")))?;

        let url = config.url();
        let mut builder = WsClientBuilder::default()
            .set_headers(headers)
            .request_timeout(self.request_timeout)
            .connection_timeout(self.probe_timeout.max(self.request_timeout));
        if let Some(tls_config) = tls_config {
            builder = builder.with_custom_cert_store(tls_config);
        }
        let inner = runtime
            .block_on(builder.build(&url))
            .map_err(|e| ClientError::Unavailable(format!("{url}: {e}")))?;

        let mut subscribed = Vec::new();
        if let Some(handler) = handler {
            for method in &self.notification_methods {
                let subscription: Subscription<serde_json::Value> = runtime
                    .block_on(inner.subscribe_to_method(method))
                    .map_err(|e| ClientError::Rejected(format!("subscribe {method}: {e}")))?;
                runtime.spawn(forward_notifications(
                    method.clone(),
                    subscription,
                    handler.clone(),
                ));
                subscribed.push(method.clone());
            }
        }

        Ok(JsonRpcClient {
            inner,
            runtime,
            url,
            subscribed,
        })
    }
}

/// Hand every notification of `method` to `handler` until the socket closes.
async fn forward_notifications(
    method: String,
    mut subscription: Subscription<serde_json::Value>,
    handler: NotificationHandler,
) {
    while let Some(notification) = subscription.next().await {
        match notification {
            Ok(params) => handler(&method, &params),
            Err(e) => warn!(%method, error = %e, "malformed notification"),
        }
    }
    debug!(%method, "notification stream closed");
}

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

fn insert<T: Serialize>(params: &mut ArrayParams, value: T) -> Result<(), RpcError> {
    params
        .insert(value)
        .map_err(|e| RpcError::Call(format!("encode params: {e}")))
}

fn params<const N: usize>(values: [&str; N]) -> Result<ArrayParams, RpcError> {
    let mut p = ArrayParams::new();
    for v in values {
        insert(&mut p, v)?;
    }
    Ok(p)
}

/// Coin-denominated JSON float to atoms, without float arithmetic drift.
fn coins_to_amount(coins: f64) -> Result<Amount, RpcError> {
    format!("{coins:.8}")
        .parse::<Amount>()
        .map_err(|e| RpcError::Call(format!("amount {coins}: {e}")))
}

/// `getbalance` replies either a bare number or a per-account breakdown.
fn parse_balance(reply: &serde_json::Value, account: &str) -> Result<Amount, RpcError> {
    if let Some(coins) = reply.as_f64() {
        return coins_to_amount(coins);
    }
    let balances = reply["balances"]
        .as_array()
        .ok_or_else(|| RpcError::Call(format!("getbalance: unexpected reply {reply}")))?;
    let entry = balances
        .iter()
        .find(|b| b["accountname"].as_str() == Some(account))
        .ok_or_else(|| RpcError::Call(format!("getbalance: no account {account:?}")))?;
    let coins = entry["spendable"]
        .as_f64()
        .ok_or_else(|| RpcError::Call("getbalance: missing spendable".into()))?;
    coins_to_amount(coins)
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ListUnspentEntry {
    txid: String,
    vout: u32,
    #[serde(default)]
    tree: i8,
    #[serde(default)]
    account: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    script_pub_key: String,
    amount: f64,
    #[serde(default)]
    confirmations: i64,
    #[serde(default)]
    spendable: bool,
}

impl ListUnspentEntry {
    fn into_unspent(self) -> Result<UnspentOutput, RpcError> {
        let hash: Hash256 = self
            .txid
            .parse()
            .map_err(|e| RpcError::Call(format!("listunspent txid {}: {e}", self.txid)))?;
        let pk_script = hex::decode(&self.script_pub_key)
            .map_err(|e| RpcError::Call(format!("listunspent script: {e}")))?;
        let address = self
            .address
            .map(Address::new)
            .transpose()
            .map_err(|e| RpcError::Call(format!("listunspent address: {e}")))?;
        Ok(UnspentOutput {
            outpoint: OutPoint::new(hash, self.vout, self.tree),
            amount: coins_to_amount(self.amount)?,
            account: self.account,
            spendable: self.spendable,
            confirmations: self.confirmations,
            address,
            pk_script,
        })
    }
}
