//! Telemetry
//!
//! Opt-in `tracing` subscriber installation. The library itself only emits events and spans:
//! `truelayer.request` around each API call and `truelayer.token_refresh` around each token
//! request.

pub mod logging;

pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
