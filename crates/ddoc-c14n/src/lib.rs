#![forbid(unsafe_code)]

//! XML canonicalization for the ddoc toolkit.
//!
//! Signature code never calls a canonicalizer directly. It is handed a
//! [`CanonicalizationService`] and names the method it wants, so callers can
//! plug in a different implementation (or a recording fake in tests).
//! [`InclusiveC14n`] is the default: Canonical XML 1.0, the only method the
//! legacy DigiDoc profile accepts.

pub mod escape;
pub mod inclusive;

use ddoc_core::{algorithm, Error};

/// Turns serialized XML into its canonical byte form.
pub trait CanonicalizationService: Send + Sync {
    /// Canonicalize `data` with the method identified by `method` (an
    /// algorithm URI). Unknown methods are an error.
    fn canonicalize(&self, data: &[u8], method: &str) -> Result<Vec<u8>, Error>;
}

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Canonical XML 1.0
    Inclusive,
    /// Canonical XML 1.0 with comments
    InclusiveWithComments,
}

impl C14nMode {
    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Inclusive => algorithm::C14N,
            Self::InclusiveWithComments => algorithm::C14N_WITH_COMMENTS,
        }
    }

    /// Parse a C14N mode from an algorithm URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::C14N => Some(Self::Inclusive),
            algorithm::C14N_WITH_COMMENTS => Some(Self::InclusiveWithComments),
            _ => None,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::InclusiveWithComments)
    }
}

/// Canonical XML 1.0 over `roxmltree`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InclusiveC14n;

impl CanonicalizationService for InclusiveC14n {
    fn canonicalize(&self, data: &[u8], method: &str) -> Result<Vec<u8>, Error> {
        let mode = C14nMode::from_uri(method)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("canonicalization: {method}")))?;
        let xml = std::str::from_utf8(data)
            .map_err(|e| Error::Canonicalization(format!("input is not UTF-8: {e}")))?;
        canonicalize(xml, mode)
    }
}

/// Canonicalize an XML document given as text.
pub fn canonicalize(xml: &str, mode: C14nMode) -> Result<Vec<u8>, Error> {
    let doc = roxmltree::Document::parse_with_options(
        xml,
        roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        },
    )
    .map_err(|e| Error::XmlParse(e.to_string()))?;
    let out = inclusive::canonicalize(&doc, mode.with_comments());
    log::debug!("canonicalized {} bytes into {} bytes", xml.len(), out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_dispatch() {
        let svc = InclusiveC14n;
        let out = svc
            .canonicalize(b"<a   y=\"2\" x=\"1\"/>", algorithm::C14N)
            .unwrap();
        assert_eq!(out, b"<a x=\"1\" y=\"2\"></a>");
    }

    #[test]
    fn test_unknown_method() {
        let err = InclusiveC14n
            .canonicalize(b"<a/>", "http://www.w3.org/2001/10/xml-exc-c14n#")
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn test_malformed_input() {
        let err = InclusiveC14n
            .canonicalize(b"<a><b></a>", algorithm::C14N)
            .unwrap_err();
        assert!(matches!(err, Error::XmlParse(_)));
    }

    #[test]
    fn test_mode_uri_roundtrip() {
        for mode in [C14nMode::Inclusive, C14nMode::InclusiveWithComments] {
            assert_eq!(C14nMode::from_uri(mode.uri()), Some(mode));
        }
    }
}
