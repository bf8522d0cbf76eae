#![forbid(unsafe_code)]

//! XML-DSig building blocks of a DigiDoc/BDOC signature.
//!
//! A [`Reference`] binds one signed item (a data file or the signature's
//! SignedProperties) to its digest. A [`SignedInfo`] holds the ordered
//! references plus the signature and canonicalization methods, and its
//! canonical digest is what the signer's RSA key signs.

pub mod data_file;
pub mod reference;
pub mod signed_info;
mod xml;

pub use data_file::{ContentType, DataFile, SignedProperties, SignedPropertiesXml};
pub use reference::Reference;
pub use signed_info::SignedInfo;
