#![forbid(unsafe_code)]

pub use ddoc_c14n as c14n;
pub use ddoc_core as core;
pub use ddoc_crypto as crypto;
pub use ddoc_dsig as dsig;
pub use ddoc_notary as notary;
pub use ddoc_xades as xades;
