#![forbid(unsafe_code)]

//! Parsed X.509 certificates, reduced to what OCSP processing needs.

use chrono::{DateTime, Utc};
use ddoc_core::algorithm::oid;
use ddoc_core::Error;
use der::{Decode, Encode};
use std::path::Path;
use x509_cert::Certificate;

const PEM_LABEL: &str = "CERTIFICATE";
const PEM_END: &str = "-----END CERTIFICATE-----";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509Cert {
    der: Vec<u8>,
    common_name: Option<String>,
    serial: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    subject_der: Vec<u8>,
    issuer_der: Vec<u8>,
    spki_der: Vec<u8>,
    public_key_bits: Vec<u8>,
}

impl X509Cert {
    /// Parse a DER encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let cert = Certificate::from_der(der)
            .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))?;
        let tbs = &cert.tbs_certificate;
        let encode_err = |what: &str, e: der::Error| Error::Certificate(format!("failed to encode {what}: {e}"));

        Ok(Self {
            der: der.to_vec(),
            common_name: common_name(&tbs.subject),
            serial: normalize_serial(&hex::encode_upper(tbs.serial_number.as_bytes())),
            not_before: to_utc(&tbs.validity.not_before),
            not_after: to_utc(&tbs.validity.not_after),
            subject_der: tbs.subject.to_der().map_err(|e| encode_err("subject", e))?,
            issuer_der: tbs.issuer.to_der().map_err(|e| encode_err("issuer", e))?,
            spki_der: tbs
                .subject_public_key_info
                .to_der()
                .map_err(|e| encode_err("SPKI", e))?,
            public_key_bits: tbs.subject_public_key_info.subject_public_key.raw_bytes().to_vec(),
        })
    }

    /// Parse a single PEM encoded certificate.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, Error> {
        let pem_str = std::str::from_utf8(pem_data)
            .map_err(|e| Error::Certificate(format!("invalid PEM encoding: {e}")))?;
        let (label, der_bytes) = pem_rfc7468::decode_vec(pem_str.trim().as_bytes())
            .map_err(|e| Error::Certificate(format!("failed to decode certificate PEM: {e}")))?;
        if label != PEM_LABEL {
            return Err(Error::Certificate(format!(
                "expected CERTIFICATE PEM label, got: {label}"
            )));
        }
        Self::from_der(&der_bytes)
    }

    /// Parse every certificate in a PEM bundle.
    pub fn from_pem_bundle(pem_data: &[u8]) -> Result<Vec<Self>, Error> {
        let pem_str = std::str::from_utf8(pem_data)
            .map_err(|e| Error::Certificate(format!("invalid PEM encoding: {e}")))?;
        let mut certs = Vec::new();
        for block in pem_str.split_inclusive(PEM_END) {
            if block.contains(PEM_END) {
                certs.push(Self::from_pem(block.as_bytes())?);
            }
        }
        if certs.is_empty() {
            return Err(Error::Certificate("no certificate found in PEM data".into()));
        }
        Ok(certs)
    }

    /// Load certificates from a PEM bundle or a single DER file.
    pub fn load_file(path: &Path) -> Result<Vec<Self>, Error> {
        let data = std::fs::read(path)?;
        if data.starts_with(b"-----") || data.windows(11).any(|w| w == b"-----BEGIN ") {
            Self::from_pem_bundle(&data)
        } else {
            Ok(vec![Self::from_der(&data)?])
        }
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    /// Serial number as upper-case hex without leading zero bytes.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    pub fn subject_der(&self) -> &[u8] {
        &self.subject_der
    }

    pub fn issuer_der(&self) -> &[u8] {
        &self.issuer_der
    }

    pub fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }

    /// SHA-1 of the subject public key bits, as used in OCSP key hashes.
    pub fn key_hash(&self) -> [u8; 20] {
        ddoc_crypto::sha1(&self.public_key_bits)
    }

    pub fn is_issued_by(&self, issuer: &X509Cert) -> bool {
        self.issuer_der == issuer.subject_der
    }

    /// Whether `serial` (hex, any case, leading zeros allowed) is this
    /// certificate's serial number.
    pub fn has_serial(&self, serial: &str) -> bool {
        normalize_serial(&serial.trim().to_ascii_uppercase()) == self.serial
    }
}

fn common_name(name: &x509_cert::name::Name) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|atv| atv.oid.to_string() == oid::COMMON_NAME)
        .and_then(|atv| std::str::from_utf8(atv.value.value()).ok())
        .map(str::to_owned)
}

/// Common name of a DER encoded `Name`.
pub(crate) fn name_common_name(name_der: &[u8]) -> Option<String> {
    let name = x509_cert::name::Name::from_der(name_der).ok()?;
    common_name(&name)
}

fn to_utc(t: &x509_cert::time::Time) -> DateTime<Utc> {
    let secs = t.to_unix_duration().as_secs();
    DateTime::from_timestamp(secs as i64, 0).unwrap_or_default()
}

fn normalize_serial(hex: &str) -> String {
    let trimmed = hex.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNER_PEM: &[u8] = include_bytes!("../testdata/signer.pem");
    const SIGNER_DER: &[u8] = include_bytes!("../testdata/signer.der");
    const CA_PEM: &[u8] = include_bytes!("../testdata/ca.pem");

    #[test]
    fn test_parse_signer() {
        let cert = X509Cert::from_pem(SIGNER_PEM).unwrap();
        assert_eq!(cert.common_name(), Some("TESTNUMBER,SEITSMES,51001091072"));
        assert_eq!(cert.serial(), "4C5A6B7D8E9F0011");
        assert!(cert.has_serial("004c5a6b7d8e9f0011"));
        assert!(!cert.has_serial("2020"));
        assert_eq!(cert.der(), SIGNER_DER);
        assert_eq!(cert.not_before().format("%Y-%m-%d").to_string(), "2020-06-01");
    }

    #[test]
    fn test_issuer_link() {
        let signer = X509Cert::from_der(SIGNER_DER).unwrap();
        let ca = X509Cert::from_pem(CA_PEM).unwrap();
        assert!(signer.is_issued_by(&ca));
        assert!(ca.is_issued_by(&ca));
        assert!(!ca.is_issued_by(&signer));
    }

    #[test]
    fn test_pem_bundle() {
        let mut bundle = SIGNER_PEM.to_vec();
        bundle.extend_from_slice(CA_PEM);
        let certs = X509Cert::from_pem_bundle(&bundle).unwrap();
        assert_eq!(certs.len(), 2);
        assert_eq!(certs[1].common_name(), Some("TEST of ESTEID-SK 2015"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            X509Cert::from_der(b"not a certificate"),
            Err(Error::Certificate(_))
        ));
        assert!(X509Cert::from_pem_bundle(b"nothing here").is_err());
    }
}
