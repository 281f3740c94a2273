//! Core Components
//!
//! HTTP transport shared by the authenticator and the API client.

pub mod transport;

pub use transport::*;
