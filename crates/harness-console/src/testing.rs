//! Fake executable and RPC client shared by the facade tests.

#[cfg(unix)]
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::time::Duration;

use harness_core::{Address, Amount, Hash256, OutPoint, UnspentOutput};
use harness_rpc::{
    BestBlock, ClientError, ClientFactory, ConnectionConfig, NotificationHandler, RpcError,
    WalletClient,
};

/// Shell script that writes `rpc.cert`/`rpc.key` into its `--appdata` and sleeps.
#[cfg(unix)]
pub(crate) fn write_fake_executable(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-daemon.sh");
    std::fs::write(
        &path,
        "#!/bin/sh\n\
         for arg in \"$@\"; do\n\
           case \"$arg\" in\n\
             --appdata=*) dir=\"${arg#--appdata=}\" ;;\n\
           esac\n\
         done\n\
         touch \"$dir/rpc.cert\" \"$dir/rpc.key\"\n\
         exec sleep 30\n",
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

// --- Mock client ---

#[derive(Debug, Default)]
pub(crate) struct FakeClient {
    pub height: AtomicI64,
    pub locked: AtomicBool,
}

impl FakeClient {
    pub(crate) fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }
}

impl WalletClient for FakeClient {
    fn list_unspent(&self, account: &str) -> Result<Vec<UnspentOutput>, RpcError> {
        Ok(vec![UnspentOutput {
            outpoint: OutPoint::new(Hash256([1; 32]), 0, 0),
            amount: Amount::from_atoms(150_000),
            account: account.to_string(),
            spendable: true,
            confirmations: 1,
            address: None,
            pk_script: Vec::new(),
        }])
    }

    fn get_new_address(&self, account: &str) -> Result<Address, RpcError> {
        Address::new(format!("Ss{account}Change")).map_err(|e| RpcError::Call(e.to_string()))
    }

    fn get_balance(&self, _account: &str) -> Result<Amount, RpcError> {
        Ok(Amount::from_atoms(150_000))
    }

    /// Each query advances the tip by one block.
    fn get_best_block(&self) -> Result<BestBlock, RpcError> {
        let height = self.height.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(BestBlock {
            hash: Hash256::ZERO,
            height,
        })
    }

    fn create_new_account(&self, name: &str) -> Result<(), RpcError> {
        if name.is_empty() {
            return Err(RpcError::Call("createnewaccount: empty name".into()));
        }
        Ok(())
    }

    fn wallet_lock(&self) -> Result<(), RpcError> {
        self.locked.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn wallet_unlock(&self, passphrase: &str, _timeout: Duration) -> Result<(), RpcError> {
        if passphrase.is_empty() {
            return Err(RpcError::Call("walletpassphrase: empty passphrase".into()));
        }
        self.locked.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn validate_address(&self, address: &Address) -> Result<bool, RpcError> {
        Ok(address.as_str().starts_with("Ss"))
    }
}

// --- Mock factory ---

/// Requires the certificate file like the real factory does.
#[derive(Debug, Default, Clone)]
pub(crate) struct FakeFactory {
    pub calls: Arc<AtomicU32>,
}

impl ClientFactory for FakeFactory {
    type Client = FakeClient;

    fn new_client(
        &self,
        config: &ConnectionConfig,
        _handler: Option<NotificationHandler>,
    ) -> Result<FakeClient, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &config.certificate_file {
            Some(cert) if !cert.exists() => Err(ClientError::Unavailable("no cert".into())),
            _ => Ok(FakeClient::default()),
        }
    }
}
