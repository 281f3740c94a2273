//! TrueLayer Types
//!
//! Configuration, token and header types shared across the client.

pub mod config;
pub mod headers;
pub mod token;

pub use config::*;
pub use headers::*;
pub use token::*;
