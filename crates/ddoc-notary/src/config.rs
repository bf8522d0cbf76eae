#![forbid(unsafe_code)]

//! Notary service configuration.

use std::time::Duration;

/// Default OCSP responder of the Estonian certification centre.
pub const DEFAULT_RESPONDER_URL: &str = "http://ocsp.sk.ee";

/// Settings for [`OcspNotaryService`](crate::OcspNotaryService).
#[derive(Debug, Clone)]
pub struct NotaryConfig {
    /// URL OCSP requests are posted to.
    pub responder_url: String,
    /// Timeout for one OCSP round trip.
    pub timeout: Duration,
    /// Common names of responders whose confirmations are trusted.
    pub known_ocsp_cns: Vec<String>,
    /// Common names of trusted time-stamping authorities.
    pub known_tsa_cns: Vec<String>,
    /// Send a nonce and require it back in the response.
    pub use_nonce: bool,
}

impl NotaryConfig {
    pub fn new(responder_url: &str) -> Self {
        Self {
            responder_url: responder_url.to_owned(),
            timeout: Duration::from_secs(30),
            known_ocsp_cns: Vec::new(),
            known_tsa_cns: Vec::new(),
            use_nonce: true,
        }
    }

    /// Trust OCSP responses signed by a responder with this common name.
    pub fn add_known_ocsp_cn(&mut self, cn: &str) {
        self.known_ocsp_cns.push(cn.to_owned());
    }

    /// Trust timestamps issued by a TSA with this common name.
    pub fn add_known_tsa_cn(&mut self, cn: &str) {
        self.known_tsa_cns.push(cn.to_owned());
    }
}

impl Default for NotaryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RESPONDER_URL)
    }
}
