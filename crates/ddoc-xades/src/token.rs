#![forbid(unsafe_code)]

//! The timestamp token as seen by a [`TimestampInfo`](crate::TimestampInfo).

use chrono::{DateTime, Utc};
use ddoc_core::Error;
use std::fmt;

/// An RFC 3161 timestamp token, already decoded by the caller.
pub trait TimeStampToken: fmt::Debug + Send + Sync {
    /// OID of the hash algorithm used for the message imprint.
    fn algorithm_oid(&self) -> &str;
    /// TSA policy OID.
    fn policy(&self) -> Option<&str>;
    fn gen_time(&self) -> DateTime<Utc>;
    /// Hash of the timestamped data as declared by the TSA.
    fn message_imprint(&self) -> &[u8];
    fn nonce(&self) -> Option<&[u8]>;
    /// Serial number, big-endian.
    fn serial_number(&self) -> &[u8];
    fn is_ordered(&self) -> bool;
    /// DER encoding of the whole token.
    fn encoded(&self) -> &[u8];
}

/// Turns an encapsulated token back into a [`TimeStampToken`].
pub trait TimeStampTokenDecoder {
    fn decode(&self, der: &[u8]) -> Result<Box<dyn TimeStampToken>, Error>;
}

/// Plain holder for decoded token fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeStampTokenInfo {
    pub algorithm_oid: String,
    pub policy: Option<String>,
    pub gen_time: DateTime<Utc>,
    pub message_imprint: Vec<u8>,
    pub nonce: Option<Vec<u8>>,
    pub serial_number: Vec<u8>,
    pub ordered: bool,
    pub encoded: Vec<u8>,
}

impl TimeStampToken for TimeStampTokenInfo {
    fn algorithm_oid(&self) -> &str {
        &self.algorithm_oid
    }

    fn policy(&self) -> Option<&str> {
        self.policy.as_deref()
    }

    fn gen_time(&self) -> DateTime<Utc> {
        self.gen_time
    }

    fn message_imprint(&self) -> &[u8] {
        &self.message_imprint
    }

    fn nonce(&self) -> Option<&[u8]> {
        self.nonce.as_deref()
    }

    fn serial_number(&self) -> &[u8] {
        &self.serial_number
    }

    fn is_ordered(&self) -> bool {
        self.ordered
    }

    fn encoded(&self) -> &[u8] {
        &self.encoded
    }
}
