#![forbid(unsafe_code)]

//! XAdES timestamp elements.
//!
//! [`TimestampInfo`] models one of the six XAdES timestamp properties,
//! wrapping an RFC 3161 token issued by a time-stamping authority. Token
//! decoding happens elsewhere; this crate only sees the accessor surface
//! described by [`TimeStampToken`].

pub mod include;
pub mod timestamp;
pub mod token;

pub use include::IncludeInfo;
pub use timestamp::{TimestampInfo, TimestampType};
pub use token::{TimeStampToken, TimeStampTokenDecoder, TimeStampTokenInfo};
