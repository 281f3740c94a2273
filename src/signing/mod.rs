//! Request Signing
//!
//! Detached JWS signatures for state-mutating requests.

pub mod key;
pub mod signer;

pub use key::SigningAlgorithm;
pub use signer::*;
