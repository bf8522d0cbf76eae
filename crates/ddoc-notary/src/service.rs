#![forbid(unsafe_code)]

//! The notary service contract and its OCSP implementation.

use crate::cert::X509Cert;
use crate::config::NotaryConfig;
use crate::notary::{CertStatus, Notary};
use crate::ocsp::{self, Expectation, VerifiedResponse};
use crate::store::CertStore;
use crate::transport::{HttpTransport, OcspTransport};
use ddoc_core::{Error, RevocationError};

/// The signature side of a notary confirmation.
///
/// Implemented by whatever holds a signature in the caller's model; the
/// service reads from it and only ever writes by attaching a [`Notary`].
pub trait NotarySubject {
    /// Signature id, e.g. `S0`.
    fn signature_id(&self) -> &str;

    /// Raw RSA signature value the confirmation is bound to.
    fn signature_value(&self) -> &[u8];

    fn attach_notary(&mut self, notary: Notary);
}

/// Revocation confirmation for signer certificates.
///
/// Implementations must be safe to share between verification flows.
pub trait NotaryService: Send + Sync {
    /// Whether `cn` names a trusted OCSP responder. No network I/O.
    fn is_known_ocsp_cert(&self, cn: &str) -> bool;

    /// Whether `cn` names a trusted time-stamping authority. No network I/O.
    fn is_known_tsa_cert(&self, cn: &str) -> bool;

    /// Fetch and verify an OCSP confirmation for `signer` issued by `ca`,
    /// attach it to `signature` and return a copy.
    ///
    /// Fails unless the responder reports the certificate as good.
    fn get_confirmation(
        &self,
        signature: &mut dyn NotarySubject,
        signer: &X509Cert,
        ca: &X509Cert,
    ) -> Result<Notary, Error>;

    /// Verify a stored confirmation for `signature` and fill in its parsed
    /// details. No network I/O.
    fn parse_and_verify_response(
        &self,
        signature: &dyn NotarySubject,
        signer: &X509Cert,
        ca: &X509Cert,
        notary: Notary,
    ) -> Result<Notary, Error>;

    /// Responder certificate by common name and optional serial number.
    fn get_notary_cert(&self, cn: &str, serial: Option<&str>) -> Result<&X509Cert, Error>;

    /// Stand-alone revocation check of `cert` outside a signature.
    fn check_certificate(&self, cert: &X509Cert) -> Result<Notary, Error>;
}

/// A minimal [`NotarySubject`]: a signature id, value and its confirmation.
#[derive(Debug, Clone, Default)]
pub struct SignatureRef {
    pub id: String,
    pub value: Vec<u8>,
    pub notary: Option<Notary>,
}

impl SignatureRef {
    pub fn new(id: &str, value: &[u8]) -> Self {
        Self {
            id: id.to_owned(),
            value: value.to_vec(),
            notary: None,
        }
    }
}

impl NotarySubject for SignatureRef {
    fn signature_id(&self) -> &str {
        &self.id
    }

    fn signature_value(&self) -> &[u8] {
        &self.value
    }

    fn attach_notary(&mut self, notary: Notary) {
        self.notary = Some(notary);
    }
}

// ── OCSP implementation ──────────────────────────────────────────────

/// [`NotaryService`] backed by an OCSP responder.
pub struct OcspNotaryService<T: OcspTransport = HttpTransport> {
    config: NotaryConfig,
    store: CertStore,
    transport: T,
}

impl OcspNotaryService<HttpTransport> {
    /// Service talking HTTP to `config.responder_url`.
    pub fn new(config: NotaryConfig, store: CertStore) -> Self {
        let transport = HttpTransport::new(config.timeout);
        Self::with_transport(config, store, transport)
    }
}

impl<T: OcspTransport> OcspNotaryService<T> {
    pub fn with_transport(config: NotaryConfig, store: CertStore, transport: T) -> Self {
        Self {
            config,
            store,
            transport,
        }
    }

    pub fn config(&self) -> &NotaryConfig {
        &self.config
    }

    pub fn store(&self) -> &CertStore {
        &self.store
    }

    fn nonce_for(&self, data: &[u8]) -> Option<[u8; 20]> {
        self.config.use_nonce.then(|| ddoc_crypto::sha1(data))
    }

    /// Post a request and verify the answer, returning a verified notary.
    fn round_trip(
        &self,
        id: &str,
        cert: &X509Cert,
        issuer: &X509Cert,
        nonce_source: &[u8],
    ) -> Result<Notary, Error> {
        let nonce = self.nonce_for(nonce_source);
        let request = ocsp::build_request(cert, issuer, nonce.as_ref().map(|n| n.as_slice()))?;
        let response = self.transport.post(&self.config.responder_url, &request)?;
        self.verify(Notary::new(id, response), cert, issuer, nonce.as_ref())
    }

    fn verify(
        &self,
        mut notary: Notary,
        cert: &X509Cert,
        issuer: &X509Cert,
        nonce: Option<&[u8; 20]>,
    ) -> Result<Notary, Error> {
        let expected = Expectation {
            cert,
            issuer,
            nonce: nonce.map(|n| n.as_slice()),
        };
        let is_trusted = |cn: &str| self.is_known_ocsp_cert(cn);
        let VerifiedResponse {
            responder_cn,
            responder_serial,
            produced_at,
            status,
        } = ocsp::verify_response(notary.ocsp_response(), &self.store, &is_trusted, &expected)?;

        match status {
            CertStatus::Good => {
                notary.record_verification(
                    &responder_cn,
                    &responder_serial,
                    produced_at,
                    CertStatus::Good,
                );
                Ok(notary)
            }
            CertStatus::Revoked { at, reason } => {
                log::warn!("certificate {} revoked at {at}", cert.serial());
                Err(RevocationError::Revoked { at, reason }.into())
            }
            CertStatus::Unknown => Err(RevocationError::StatusUnknown.into()),
        }
    }
}

impl<T: OcspTransport> NotaryService for OcspNotaryService<T> {
    fn is_known_ocsp_cert(&self, cn: &str) -> bool {
        self.config.known_ocsp_cns.iter().any(|known| known == cn)
    }

    fn is_known_tsa_cert(&self, cn: &str) -> bool {
        self.config.known_tsa_cns.iter().any(|known| known == cn)
    }

    fn get_confirmation(
        &self,
        signature: &mut dyn NotarySubject,
        signer: &X509Cert,
        ca: &X509Cert,
    ) -> Result<Notary, Error> {
        let id = Notary::id_for_signature(signature.signature_id());
        log::debug!(
            "requesting OCSP confirmation {id} for {}",
            signer.common_name().unwrap_or(signer.serial())
        );
        let notary = self.round_trip(&id, signer, ca, signature.signature_value())?;
        signature.attach_notary(notary.clone());
        Ok(notary)
    }

    fn parse_and_verify_response(
        &self,
        signature: &dyn NotarySubject,
        signer: &X509Cert,
        ca: &X509Cert,
        notary: Notary,
    ) -> Result<Notary, Error> {
        let nonce = self.nonce_for(signature.signature_value());
        self.verify(notary, signer, ca, nonce.as_ref())
    }

    fn get_notary_cert(&self, cn: &str, serial: Option<&str>) -> Result<&X509Cert, Error> {
        self.store.get_notary_cert(cn, serial)
    }

    fn check_certificate(&self, cert: &X509Cert) -> Result<Notary, Error> {
        let issuer = self.store.find_issuer(cert).ok_or_else(|| {
            RevocationError::MissingIssuer(cert.common_name().unwrap_or(cert.serial()).to_owned())
        })?;
        let id = format!("N-{}", cert.serial());
        self.round_trip(&id, cert, issuer, cert.der())
    }
}
