//! Tracing initialization
//!
//! Console output is compact by default; `LOG_FORMAT=json` switches to JSON
//! lines for log shippers.

mod init;

pub use init::{init_telemetry, shutdown_telemetry, LogFormat};
