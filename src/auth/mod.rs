//! Authentication
//!
//! Access-token acquisition ([`Authenticator`]) and caching ([`TokenCache`]).

pub mod authenticator;
pub mod cache;

pub use authenticator::*;
pub use cache::*;
