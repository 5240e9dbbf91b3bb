//! Integration test suite for coinharness.
//!
//! Funding properties run against both hand-built UTXO lists and the
//! in-memory wallet; connection tests drive the retrying connection manager
//! and the console facades with fake factories and a fake daemon script.

pub mod helpers;
