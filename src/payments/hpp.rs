//! Hosted Payment Page
//!
//! Links sending the payer to TrueLayer's hosted payment page for a created payment.

use url::{form_urlencoded, Url};

/// Builds hosted payment page links.
#[derive(Clone, Debug)]
pub struct HostedPaymentPageLinkBuilder {
    hpp_url: Url,
}

impl HostedPaymentPageLinkBuilder {
    /// Builder for links under `hpp_url`.
    pub fn new(hpp_url: Url) -> Self {
        Self { hpp_url }
    }

    /// `<hpp_url>/payments#payment_id=..&resource_token=..&return_uri=..`
    pub fn link(&self, payment_id: &str, resource_token: &str, return_uri: &str) -> Url {
        let fragment = form_urlencoded::Serializer::new(String::new())
            .append_pair("payment_id", payment_id)
            .append_pair("resource_token", resource_token)
            .append_pair("return_uri", return_uri)
            .finish();

        let mut url = self.hpp_url.clone();
        url.path_segments_mut()
            .map(|mut segments| {
                segments.pop_if_empty().push("payments");
            })
            .ok();
        url.set_query(None);
        url.set_fragment(Some(&fragment));
        url
    }
}
