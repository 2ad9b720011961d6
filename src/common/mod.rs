//! Shared helpers for tests and benchmarks
//!
//! Loopback server spawning and an in-memory scripted connector.

pub mod test_utils;

pub use test_utils::{Reply, ScriptedConnector, ScriptedStream, TestServer, spawn_test_server};
