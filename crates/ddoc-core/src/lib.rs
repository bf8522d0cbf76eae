#![forbid(unsafe_code)]

//! Core types for the ddoc DigiDoc/XAdES toolkit.
//!
//! Holds the algorithm identifiers accepted by the legacy signature profile,
//! element and attribute names, the document profile (format + version) and
//! the error taxonomy shared by every other crate in the workspace.

pub mod algorithm;
pub mod error;
pub mod ns;
pub mod profile;

pub use error::{Error, Result, RevocationError, TokenError, ValidationError};
pub use profile::{DocFormat, DocProfile, DocVersion};
