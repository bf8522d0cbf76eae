#![forbid(unsafe_code)]

//! Base64 in the layouts used by DigiDoc documents.
//!
//! Digest values are written on a single line; encapsulated timestamp
//! tokens and OCSP responses are wrapped at 64 columns.

use base64::Engine;
use ddoc_core::Error;

/// Line length used for wrapped base64 content.
pub const WRAP_COLUMNS: usize = 64;

/// Encode on a single line.
pub fn encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Encode and break the output into `columns`-wide lines joined by `\n`.
///
/// No newline is written after the last line. `columns == 0` disables wrapping.
pub fn encode_wrapped(data: &[u8], columns: usize) -> String {
    let flat = encode(data);
    if columns == 0 || flat.len() <= columns {
        return flat;
    }
    let mut out = String::with_capacity(flat.len() + flat.len() / columns);
    for (i, chunk) in flat.as_bytes().chunks(columns).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        // base64 output is ASCII, so byte chunks are valid UTF-8
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
    }
    out
}

/// Decode, ignoring any whitespace (line breaks from wrapped content).
pub fn decode(text: &str) -> Result<Vec<u8>, Error> {
    let clean: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(clean)
        .map_err(|e| Error::Base64(e.to_string()))
}
