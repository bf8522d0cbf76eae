#![forbid(unsafe_code)]

//! Delivery of OCSP requests to a responder.

use ddoc_core::RevocationError;
use std::io::Read;
use std::time::Duration;

const MAX_RESPONSE_LEN: u64 = 1_000_000;

/// Posts a DER encoded OCSP request and returns the raw response.
pub trait OcspTransport: Send + Sync {
    fn post(&self, url: &str, request: &[u8]) -> Result<Vec<u8>, RevocationError>;
}

/// HTTP POST transport (RFC 6960 appendix A.1).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl OcspTransport for HttpTransport {
    fn post(&self, url: &str, request: &[u8]) -> Result<Vec<u8>, RevocationError> {
        log::debug!("posting {} byte OCSP request to {url}", request.len());
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let response = agent
            .post(url)
            .set("Content-Type", "application/ocsp-request")
            .set("Accept", "application/ocsp-response")
            .send_bytes(request)
            .map_err(|e| RevocationError::Transport(e.to_string()))?;

        let mut body = Vec::new();
        response
            .into_reader()
            .take(MAX_RESPONSE_LEN)
            .read_to_end(&mut body)
            .map_err(|e| RevocationError::Transport(e.to_string()))?;
        log::debug!("received {} byte OCSP response", body.len());
        Ok(body)
    }
}
