//! HTTP Pipeline
//!
//! Request building, the interceptor chain and the response envelope.

pub mod interceptors;
pub mod request;
pub mod response;

pub use interceptors::*;
pub use request::*;
pub use response::*;
