//! Connection manager and console lifecycle tests.
//!
//! Covers:
//! - Connect succeeds when failures fit in the retry budget, fails otherwise
//! - State transitions: disconnected, connected, disconnected
//! - Certificate-gated connect against a file written later
//! - Console node start/stop with a fake daemon (unix only)

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use harness_rpc::{ClientError, ConnectionConfig, RetryPolicy, RpcConnection, RpcError};
use harness_tests::helpers::{CertGatedFactory, FlakyFactory};
use proptest::prelude::*;

fn config() -> ConnectionConfig {
    ConnectionConfig::new("127.0.0.1:19556", "user", "pass")
}

fn no_sleep(_: Duration) {}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn connect_outcome_follows_retry_budget(failures in 0u32..30, max_retries in 0u32..30) {
        let mut conn = RpcConnection::with_sleeper(
            FlakyFactory::new(failures),
            RetryPolicy::fixed(max_retries, Duration::from_millis(5)),
            no_sleep,
        );
        let result = conn.connect(&config(), None);
        if max_retries >= failures {
            prop_assert!(result.is_ok());
            prop_assert!(conn.is_connected());
            prop_assert_eq!(*conn.connection().unwrap(), failures + 1);
        } else {
            let is_failed = matches!(
                result,
                Err(RpcError::ConnectionFailed { attempts, source: ClientError::Unavailable(_) })
                    if attempts == max_retries + 1
            );
            prop_assert!(is_failed);
            prop_assert!(!conn.is_connected());
            prop_assert_eq!(conn.factory().calls.get(), max_retries + 1);
        }
    }
}

#[test]
fn state_transitions() {
    let mut conn = RpcConnection::with_sleeper(FlakyFactory::new(2), RetryPolicy::default(), no_sleep);
    assert!(!conn.is_connected());
    assert_eq!(conn.connection(), Err(RpcError::NotConnected));

    conn.connect(&config(), None).unwrap();
    assert!(conn.is_connected());
    assert_eq!(conn.connect(&config(), None), Err(RpcError::AlreadyConnected));

    conn.disconnect();
    assert!(!conn.is_connected());
    conn.disconnect();
    assert!(!conn.is_connected());
}

#[test]
fn sleeps_between_attempts_only() {
    let slept = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&slept);
    let mut conn = RpcConnection::with_sleeper(
        FlakyFactory::new(100),
        RetryPolicy::exponential(4, Duration::from_millis(100), 3, Duration::from_secs(1)),
        move |d: Duration| sink.borrow_mut().push(d),
    );
    assert!(conn.connect(&config(), None).is_err());
    assert_eq!(
        *slept.borrow(),
        vec![
            Duration::from_millis(100),
            Duration::from_millis(300),
            Duration::from_millis(900),
            Duration::from_secs(1),
        ]
    );
}

#[test]
fn connects_once_certificate_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let cert = dir.path().join("rpc.cert");
    let cfg = config().with_certificate(&cert);

    let writer_cert = cert.clone();
    let polls = std::cell::Cell::new(0);
    let mut conn = RpcConnection::with_sleeper(
        CertGatedFactory,
        RetryPolicy::fixed(5, Duration::from_millis(1)),
        move |_: Duration| {
            polls.set(polls.get() + 1);
            if polls.get() == 2 {
                std::fs::write(&writer_cert, b"cert").unwrap();
            }
        },
    );
    conn.connect(&cfg, None).unwrap();
    assert_eq!(conn.connection().unwrap(), "wss://127.0.0.1:19556/ws");
}

#[test]
fn missing_certificate_exhausts_retries() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config().with_certificate(dir.path().join("rpc.cert"));
    let mut conn = RpcConnection::with_sleeper(
        CertGatedFactory,
        RetryPolicy::fixed(3, Duration::from_millis(1)),
        no_sleep,
    );
    match conn.connect(&cfg, None) {
        Err(RpcError::ConnectionFailed { attempts, source }) => {
            assert_eq!(attempts, 4);
            assert!(source.is_transient());
        }
        other => panic!("expected ConnectionFailed, got {other:?}"),
    }
}

#[cfg(unix)]
mod console {
    use super::*;
    use harness_console::{ConsoleError, ConsoleNode, ConsoleNodeConfig, StartNodeArgs};
    use harness_tests::helpers::write_fake_daemon;

    #[test]
    fn node_start_stop_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let exe = write_fake_daemon(dir.path());
        let mut node = ConsoleNode::new(
            ConsoleNodeConfig {
                retry: RetryPolicy::fixed(50, Duration::from_millis(20)),
                cert_wait: Duration::from_secs(5),
                ..ConsoleNodeConfig::new(exe, dir.path().join("node"))
            },
            CertGatedFactory,
        );

        for _ in 0..2 {
            node.start(&StartNodeArgs::default()).unwrap();
            assert!(node.is_running());
            assert_eq!(
                node.rpc_client().connection().unwrap(),
                "wss://127.0.0.1:19556/ws"
            );
            node.stop().unwrap();
            assert!(!node.is_running());
            assert!(!node.rpc_client().is_connected());
            assert!(!node.cert_file().exists());
        }

        assert!(matches!(node.stop(), Err(ConsoleError::InvalidState(_))));
        node.dispose().unwrap();
    }

    #[test]
    fn start_times_out_without_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let mut node = ConsoleNode::new(
            ConsoleNodeConfig {
                cert_wait: Duration::from_millis(200),
                ..ConsoleNodeConfig::new("sleep", dir.path().join("node"))
            },
            CertGatedFactory,
        )
        .with_cook(|_: &harness_console::NodeCommandParams| {
            let mut args = harness_console::Arguments::new();
            args.insert("version".into(), None);
            args
        });

        let err = node.start(&StartNodeArgs::default()).unwrap_err();
        assert!(matches!(err, ConsoleError::FileTimeout { .. }));
        // The launched process is cleaned up after the failed start.
        assert!(!node.is_running());
    }
}
