#![forbid(unsafe_code)]

//! Notary (OCSP) confirmations for DigiDoc/BDOC signatures.
//!
//! A signature is only accepted together with an OCSP response saying the
//! signer's certificate was good when the signature was made. The
//! [`NotaryService`] trait is the contract the verification flow relies on;
//! [`OcspNotaryService`] implements it over HTTP with a pinned set of
//! responder certificates.

pub mod cert;
pub mod config;
pub mod notary;
pub mod ocsp;
pub mod service;
pub mod store;
pub mod transport;

pub use cert::X509Cert;
pub use config::NotaryConfig;
pub use notary::{CertStatus, Notary};
pub use service::{NotaryService, NotarySubject, OcspNotaryService, SignatureRef};
pub use store::CertStore;
pub use transport::{HttpTransport, OcspTransport};
