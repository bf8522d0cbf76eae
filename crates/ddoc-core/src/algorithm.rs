#![forbid(unsafe_code)]

//! Algorithm URI and OID constants.
//!
//! The legacy DigiDoc profile accepts exactly one identifier for each slot:
//! SHA-1 digests, RSA-SHA1 signatures, Canonical XML 1.0 and the DigiDoc
//! detached-document transform. Anything else is rejected at validation time.

// ── Canonicalization ─────────────────────────────────────────────────

pub const C14N: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";
pub const C14N_WITH_COMMENTS: &str =
    "http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments";

// ── Digest algorithms ────────────────────────────────────────────────

pub const SHA1: &str = "http://www.w3.org/2000/09/xmldsig#sha1";
pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

/// Output length of SHA-1 in bytes.
pub const SHA1_DIGEST_LEN: usize = 20;

// ── Signature algorithms ─────────────────────────────────────────────

pub const RSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#rsa-sha1";

// ── Transforms ───────────────────────────────────────────────────────

/// DigiDoc detached-document transform (the misspelling is part of the URI).
pub const DIGIDOC_DETACHED_TRANSFORM: &str =
    "http://www.sk.ee/2002/10/digidoc#detatched-document-signature";

// ── Reference types ──────────────────────────────────────────────────

/// Type written on SignedProperties references in DIGIDOC-XML 1.2 and 1.3.
pub const SIGNED_PROPERTIES_TYPE_V111: &str =
    "http://uri.etsi.org/01903/v1.1.1#SignedProperties";

/// Type written on SignedProperties references in BDOC.
pub const SIGNED_PROPERTIES_TYPE: &str = "http://uri.etsi.org/01903#SignedProperties";

// ── ASN.1 object identifiers ─────────────────────────────────────────

pub mod oid {
    /// id-sha1
    pub const SHA1: &str = "1.3.14.3.2.26";
    /// id-sha256
    pub const SHA256: &str = "2.16.840.1.101.3.4.2.1";
    /// sha1WithRSAEncryption
    pub const SHA1_RSA: &str = "1.2.840.113549.1.1.5";
    /// sha256WithRSAEncryption
    pub const SHA256_RSA: &str = "1.2.840.113549.1.1.11";
    /// id-pkix-ocsp-basic
    pub const OCSP_BASIC: &str = "1.3.6.1.5.5.7.48.1.1";
    /// id-pkix-ocsp-nonce
    pub const OCSP_NONCE: &str = "1.3.6.1.5.5.7.48.1.2";
    /// id-at-commonName
    pub const COMMON_NAME: &str = "2.5.4.3";

    /// Split a dotted OID string into its arcs.
    pub fn arcs(oid: &str) -> Option<Vec<u32>> {
        oid.split('.').map(|a| a.parse().ok()).collect()
    }

}
