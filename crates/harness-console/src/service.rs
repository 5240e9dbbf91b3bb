//! Launch-and-connect lifecycle shared by the node and wallet facades.

use std::path::{Path, PathBuf};
use std::time::Duration;

use harness_core::constants::{CERT_FILE_NAME, KEY_FILE_NAME};
use harness_rpc::{ClientFactory, ConnectionConfig, RetryPolicy, RpcConnection};
use tracing::{info, warn};

use crate::error::ConsoleError;
use crate::process::{ExternalProcess, delete_file, wait_for_file};

/// One external process plus the RPC connection into it.
pub(crate) struct ProcessService<F: ClientFactory> {
    name: &'static str,
    app_dir: PathBuf,
    process: ExternalProcess,
    rpc: RpcConnection<F>,
    cert_wait: Duration,
}

impl<F: ClientFactory> ProcessService<F> {
    pub(crate) fn new(
        name: &'static str,
        executable: PathBuf,
        app_dir: PathBuf,
        factory: F,
        policy: RetryPolicy,
        cert_wait: Duration,
    ) -> Self {
        Self {
            name,
            app_dir,
            process: ExternalProcess::new(executable, Vec::new()),
            rpc: RpcConnection::new(factory, policy),
            cert_wait,
        }
    }

    pub(crate) fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub(crate) fn cert_file(&self) -> PathBuf {
        self.app_dir.join(CERT_FILE_NAME)
    }

    pub(crate) fn key_file(&self) -> PathBuf {
        self.app_dir.join(KEY_FILE_NAME)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.process.is_running()
    }

    pub(crate) fn process(&self) -> &ExternalProcess {
        &self.process
    }

    pub(crate) fn rpc(&self) -> &RpcConnection<F> {
        &self.rpc
    }

    pub(crate) fn connection(&self) -> Result<&F::Client, ConsoleError> {
        Ok(self.rpc.connection()?)
    }

    /// Create the app dir, launch, wait for the certificate, connect.
    ///
    /// If the certificate never appears or the connection fails, the process
    /// is stopped again before the error is returned.
    pub(crate) fn start(
        &mut self,
        arguments: Vec<String>,
        debug_output: bool,
        config: &ConnectionConfig,
    ) -> Result<(), ConsoleError> {
        if self.is_running() {
            return Err(ConsoleError::InvalidState(format!(
                "{} is already running",
                self.name
            )));
        }
        info!(name = self.name, app_dir = %self.app_dir.display(), "starting process");
        std::fs::create_dir_all(&self.app_dir).map_err(|e| ConsoleError::io(&self.app_dir, e))?;

        self.process.arguments = arguments;
        self.process.launch(debug_output)?;

        let ready = wait_for_file(&self.cert_file(), self.cert_wait)
            .and_then(|()| self.rpc.connect(config, None).map_err(ConsoleError::from));
        if let Err(err) = ready {
            warn!(name = self.name, error = %err, "start failed, stopping process");
            if let Err(stop_err) = self.stop() {
                warn!(name = self.name, error = %stop_err, "cleanup after failed start");
            }
            return Err(err);
        }
        info!(name = self.name, "rpc client connected");
        Ok(())
    }

    /// Disconnect, kill the process, remove the certificate and key so the
    /// next launch writes fresh ones.
    pub(crate) fn stop(&mut self) -> Result<(), ConsoleError> {
        if !self.is_running() {
            return Err(ConsoleError::InvalidState(format!(
                "{} is not running",
                self.name
            )));
        }
        self.rpc.disconnect();
        info!(name = self.name, "stopping process");
        self.process.stop()?;
        delete_file(&self.cert_file())?;
        delete_file(&self.key_file())?;
        Ok(())
    }

    pub(crate) fn dispose(&mut self) -> Result<(), ConsoleError> {
        if self.is_running() {
            self.stop()?;
        }
        Ok(())
    }
}

/// `host:port`, bracketing IPv6 literals.
pub(crate) fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_host_port_brackets_ipv6() {
        assert_eq!(join_host_port("127.0.0.1", 19556), "127.0.0.1:19556");
        assert_eq!(join_host_port("::1", 19556), "[::1]:19556");
    }
}
