//! Logging utilities.
//!
//! The engine itself only talks to the `log` facade. This module wires up
//! `env_logger` for binaries and benches that want to see those records.

mod init;

pub use init::{init_logging, LoggingConfig};
