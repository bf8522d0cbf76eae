#![forbid(unsafe_code)]

//! A notary confirmation attached to a signature.

use chrono::{DateTime, Utc};
use std::fmt;

/// Certificate status reported by an OCSP responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertStatus {
    Good,
    Revoked {
        at: DateTime<Utc>,
        reason: Option<String>,
    },
    Unknown,
}

impl fmt::Display for CertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertStatus::Good => f.write_str("good"),
            CertStatus::Revoked { at, .. } => write!(f, "revoked at {at}"),
            CertStatus::Unknown => f.write_str("unknown"),
        }
    }
}

/// An OCSP response bound to one signature.
///
/// Created by [`NotaryService::get_confirmation`](crate::NotaryService::get_confirmation)
/// or rebuilt from a stored response and checked with
/// [`NotaryService::parse_and_verify_response`](crate::NotaryService::parse_and_verify_response).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notary {
    id: String,
    ocsp_response: Vec<u8>,
    responder_cn: Option<String>,
    responder_cert_serial: Option<String>,
    produced_at: Option<DateTime<Utc>>,
    cert_status: Option<CertStatus>,
}

impl Notary {
    /// Wrap a raw DER encoded OCSP response; details are filled by verification.
    pub fn new(id: &str, ocsp_response: Vec<u8>) -> Self {
        Self {
            id: id.to_owned(),
            ocsp_response,
            responder_cn: None,
            responder_cert_serial: None,
            produced_at: None,
            cert_status: None,
        }
    }

    /// Notary id derived from a signature id: a leading `S` becomes `N`.
    pub fn id_for_signature(signature_id: &str) -> String {
        match signature_id.strip_prefix('S') {
            Some(rest) => format!("N{rest}"),
            None => format!("N{signature_id}"),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ocsp_response(&self) -> &[u8] {
        &self.ocsp_response
    }

    pub fn responder_cn(&self) -> Option<&str> {
        self.responder_cn.as_deref()
    }

    pub fn responder_cert_serial(&self) -> Option<&str> {
        self.responder_cert_serial.as_deref()
    }

    pub fn produced_at(&self) -> Option<DateTime<Utc>> {
        self.produced_at
    }

    pub fn cert_status(&self) -> Option<&CertStatus> {
        self.cert_status.as_ref()
    }

    pub(crate) fn record_verification(
        &mut self,
        responder_cn: &str,
        responder_serial: &str,
        produced_at: DateTime<Utc>,
        status: CertStatus,
    ) {
        self.responder_cn = Some(responder_cn.to_owned());
        self.responder_cert_serial = Some(responder_serial.to_owned());
        self.produced_at = Some(produced_at);
        self.cert_status = Some(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_for_signature() {
        assert_eq!(Notary::id_for_signature("S0"), "N0");
        assert_eq!(Notary::id_for_signature("S12"), "N12");
        assert_eq!(Notary::id_for_signature("sig"), "Nsig");
    }

    #[test]
    fn test_new_is_unverified() {
        let notary = Notary::new("N0", vec![0x30, 0x00]);
        assert_eq!(notary.id(), "N0");
        assert_eq!(notary.ocsp_response(), &[0x30, 0x00]);
        assert!(notary.responder_cn().is_none());
        assert!(notary.cert_status().is_none());
    }
}
