#![forbid(unsafe_code)]

//! Cryptographic helpers for the ddoc toolkit.
//!
//! Digests selected by algorithm URI, base64 in the line layout DigiDoc
//! documents use, and RSA PKCS#1 v1.5 verification for OCSP responses.

pub mod digest;
pub mod encoding;
pub mod verify;

pub use crate::digest::{sha1, DigestAlgorithm};
