//! Payments
//!
//! Payments API sub-client and hosted payment page links.

pub mod client;
pub mod hpp;
pub mod types;

pub use client::PaymentsClient;
pub use hpp::HostedPaymentPageLinkBuilder;
pub use types::*;
