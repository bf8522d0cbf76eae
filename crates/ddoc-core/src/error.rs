#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};

/// Errors produced by the ddoc toolkit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("revocation check failed: {0}")]
    Revocation(#[from] RevocationError),

    #[error("timestamp token error: {0}")]
    Token(#[from] TokenError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A single violated field or structural invariant.
///
/// Constructors and mutators return the first one they hit wrapped in
/// [`Error::Validation`]; `validate()` methods return every one found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("reference URI cannot be empty")]
    ReferenceUri,

    #[error("unsupported digest algorithm {0:?}, only SHA1 is supported")]
    DigestAlgorithm(String),

    #[error("digest value must be {expected} bytes, got {actual}")]
    DigestLength { expected: usize, actual: usize },

    #[error("unsupported transform algorithm {0:?}")]
    TransformAlgorithm(String),

    #[error("unsupported signature method {0:?}, only RSA-SHA1 is supported")]
    SignatureMethod(String),

    #[error("unsupported canonicalization method {0:?}, only Canonical XML 1.0 is supported")]
    CanonicalizationMethod(String),

    #[error("at least 2 references are required, found {count}")]
    TooFewReferences { count: usize },

    #[error("timestamp Id attribute cannot be empty")]
    TimestampId,

    #[error("invalid timestamp type {0}")]
    TimestampType(i32),

    #[error("timestamp token cannot be empty")]
    TimestampToken,

    #[error("include URI cannot be empty")]
    IncludeUri,
}

/// Failures of an OCSP confirmation. Always fatal to the flow that asked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RevocationError {
    #[error("certificate was revoked at {at}{}", reason_suffix(.reason))]
    Revoked {
        at: DateTime<Utc>,
        reason: Option<String>,
    },

    #[error("responder does not know the certificate")]
    StatusUnknown,

    #[error("no responder certificate found for {0}")]
    UnknownResponder(String),

    #[error("responder {0} is not a known OCSP responder")]
    UntrustedResponder(String),

    #[error("invalid responder signature: {0}")]
    InvalidResponderSignature(String),

    #[error("nonce in response does not match the request")]
    NonceMismatch,

    #[error("response is not about the requested certificate")]
    CertIdMismatch,

    #[error("responder returned status {0}")]
    ResponseStatus(String),

    #[error("malformed OCSP response: {0}")]
    MalformedResponse(String),

    #[error("OCSP transport failed: {0}")]
    Transport(String),

    #[error("no issuer certificate found for {0}")]
    MissingIssuer(String),
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(" ({r})"))
        .unwrap_or_default()
}

/// Failures of timestamp token verification. Fatal to the timestamp only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("no timestamp token attached")]
    Missing,

    #[error("covered data hash has not been computed")]
    HashNotComputed,

    #[error("message imprint does not match the covered data")]
    ImprintMismatch,

    #[error("token hash algorithm {actual} does not match {expected}")]
    AlgorithmMismatch { expected: String, actual: String },
}
