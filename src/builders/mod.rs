//! Builders
//!
//! Fluent builder for the TrueLayer client.

pub mod client;

pub use client::{TrueLayerClientBuilder, DEFAULT_TIMEOUT};
