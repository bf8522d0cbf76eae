#![forbid(unsafe_code)]

//! Pinned responder and CA certificates.

use crate::cert::X509Cert;
use ddoc_core::{Error, RevocationError};
use std::path::Path;

/// Certificates the notary service is allowed to rely on.
#[derive(Debug, Default, Clone)]
pub struct CertStore {
    responders: Vec<X509Cert>,
    cas: Vec<X509Cert>,
}

impl CertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an OCSP responder certificate.
    pub fn add_responder(&mut self, cert: X509Cert) {
        self.responders.push(cert);
    }

    /// Add a CA certificate that issues signer certificates.
    pub fn add_ca(&mut self, cert: X509Cert) {
        self.cas.push(cert);
    }

    /// Load every responder certificate from a PEM or DER file.
    pub fn load_responders(&mut self, path: &Path) -> Result<usize, Error> {
        let certs = X509Cert::load_file(path)?;
        let n = certs.len();
        self.responders.extend(certs);
        Ok(n)
    }

    /// Load every CA certificate from a PEM or DER file.
    pub fn load_cas(&mut self, path: &Path) -> Result<usize, Error> {
        let certs = X509Cert::load_file(path)?;
        let n = certs.len();
        self.cas.extend(certs);
        Ok(n)
    }

    pub fn responders(&self) -> &[X509Cert] {
        &self.responders
    }

    pub fn cas(&self) -> &[X509Cert] {
        &self.cas
    }

    /// CA certificate whose subject is the issuer of `cert`.
    pub fn find_issuer(&self, cert: &X509Cert) -> Option<&X509Cert> {
        self.cas.iter().find(|ca| cert.is_issued_by(ca))
    }

    /// Responder certificates with this DER encoded subject name.
    pub fn responders_by_name(&self, subject_der: &[u8]) -> Vec<&X509Cert> {
        self.responders
            .iter()
            .filter(|c| c.subject_der() == subject_der)
            .collect()
    }

    /// Responder certificates whose public key hashes to `key_hash`.
    pub fn responders_by_key_hash(&self, key_hash: &[u8]) -> Vec<&X509Cert> {
        self.responders
            .iter()
            .filter(|c| c.key_hash().as_slice() == key_hash)
            .collect()
    }

    /// Responder certificate by common name.
    ///
    /// With a serial number the exact certificate is returned; without one
    /// the most recently issued certificate for the name wins.
    pub fn get_notary_cert(&self, cn: &str, serial: Option<&str>) -> Result<&X509Cert, Error> {
        let mut candidates = self
            .responders
            .iter()
            .filter(|c| c.common_name() == Some(cn));

        let found = match serial.filter(|s| !s.is_empty()) {
            Some(serial) => candidates.find(|c| c.has_serial(serial)),
            None => candidates.max_by_key(|c| c.not_before()),
        };

        found.ok_or_else(|| {
            let what = match serial {
                Some(s) if !s.is_empty() => format!("{cn} (serial {s})"),
                _ => cn.to_owned(),
            };
            RevocationError::UnknownResponder(what).into()
        })
    }
}
