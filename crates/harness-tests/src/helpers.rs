//! Shared test helpers for funding and connection tests.

use std::cell::Cell;
#[cfg(unix)]
use std::path::{Path, PathBuf};

use harness_core::{Amount, CollaboratorError, Hash256, OutPoint, TransactionSkeleton, UnspentOutput};
use harness_rpc::{ClientError, ClientFactory, ConnectionConfig, NotificationHandler};

/// A spendable-or-not output of `amount` atoms with a unique outpoint.
pub fn make_utxo(seed: u8, amount: i64, account: &str, spendable: bool) -> UnspentOutput {
    UnspentOutput {
        outpoint: OutPoint::new(Hash256([seed; 32]), u32::from(seed), 0),
        amount: Amount::from_atoms(amount),
        account: account.to_string(),
        spendable,
        confirmations: 1,
        address: None,
        pk_script: Vec::new(),
    }
}

/// Serializer reporting the same size for every skeleton.
pub fn fixed_size(size: usize) -> impl Fn(&TransactionSkeleton) -> usize {
    move |_| size
}

/// Script builder echoing the address bytes.
pub fn echo_script(
    address: &harness_core::Address,
) -> Result<Vec<u8>, CollaboratorError> {
    Ok(address.as_str().as_bytes().to_vec())
}

/// Factory failing `failures` times with `Unavailable` before succeeding.
/// The client is the 1-based attempt number that succeeded.
#[derive(Debug, Default)]
pub struct FlakyFactory {
    pub failures: u32,
    pub calls: Cell<u32>,
}

impl FlakyFactory {
    pub fn new(failures: u32) -> Self {
        Self {
            failures,
            calls: Cell::new(0),
        }
    }
}

impl ClientFactory for FlakyFactory {
    type Client = u32;

    fn new_client(
        &self,
        _config: &ConnectionConfig,
        _handler: Option<NotificationHandler>,
    ) -> Result<u32, ClientError> {
        let attempt = self.calls.get() + 1;
        self.calls.set(attempt);
        if attempt <= self.failures {
            Err(ClientError::Unavailable(format!("attempt {attempt} refused")))
        } else {
            Ok(attempt)
        }
    }
}

/// Factory that succeeds only once the configured certificate exists.
#[derive(Debug, Default)]
pub struct CertGatedFactory;

impl ClientFactory for CertGatedFactory {
    type Client = String;

    fn new_client(
        &self,
        config: &ConnectionConfig,
        _handler: Option<NotificationHandler>,
    ) -> Result<String, ClientError> {
        match &config.certificate_file {
            Some(cert) if !cert.exists() => Err(ClientError::Unavailable(format!(
                "{} missing",
                cert.display()
            ))),
            _ => Ok(config.url()),
        }
    }
}

/// Shell script that writes `rpc.cert` and `rpc.key` into its `--appdata`
/// directory, then sleeps.
#[cfg(unix)]
pub fn write_fake_daemon(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-daemon.sh");
    let script = "#!/bin/sh\n\
                  for arg in \"$@\"; do\n\
                    case \"$arg\" in\n\
                      --appdata=*) dir=\"${arg#--appdata=}\" ;;\n\
                    esac\n\
                  done\n\
                  touch \"$dir/rpc.cert\" \"$dir/rpc.key\"\n\
                  exec sleep 30\n";
    std::fs::write(&path, script).expect("write fake daemon");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake daemon");
    path
}
