#![forbid(unsafe_code)]

//! Digest (hash) algorithm implementations.

use ::digest::Digest;
use ddoc_core::{algorithm, Error};

/// Trait for digest algorithms.
pub trait DigestAlgorithm: Send {
    /// Feed data into the hash.
    fn update(&mut self, data: &[u8]);
    /// Finalize and return the hash value.
    fn finalize(self: Box<Self>) -> Vec<u8>;
    /// Algorithm URI.
    fn uri(&self) -> &'static str;
    /// Output length in bytes.
    fn output_len(&self) -> usize;
}

/// Create a digest algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn DigestAlgorithm>, Error> {
    match uri {
        algorithm::SHA1 => Ok(Box::new(Sha1Digest::new())),
        algorithm::SHA256 => Ok(Box::new(Sha256Digest::new())),
        _ => Err(Error::UnsupportedAlgorithm(format!(
            "digest algorithm: {uri}"
        ))),
    }
}

/// Compute a digest in one shot.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut hasher = from_uri(uri)?;
    log::debug!("digest {} over {} bytes", hasher.uri(), data.len());
    hasher.update(data);
    Ok(hasher.finalize())
}

/// SHA-1 of `data`. The legacy profile digests everything with it.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    let mut out = [0u8; 20];
    out.copy_from_slice(&::sha1::Sha1::digest(data));
    out
}

// ── Concrete implementations ─────────────────────────────────────────

macro_rules! impl_digest {
    ($name:ident, $hasher:ty, $uri:expr) => {
        struct $name {
            inner: $hasher,
        }

        impl $name {
            fn new() -> Self {
                Self {
                    inner: <$hasher>::new(),
                }
            }
        }

        impl DigestAlgorithm for $name {
            fn update(&mut self, data: &[u8]) {
                Digest::update(&mut self.inner, data);
            }

            fn finalize(self: Box<Self>) -> Vec<u8> {
                Digest::finalize(self.inner).to_vec()
            }

            fn uri(&self) -> &'static str {
                $uri
            }

            fn output_len(&self) -> usize {
                <$hasher as Digest>::output_size()
            }
        }
    };
}

impl_digest!(Sha1Digest, ::sha1::Sha1, algorithm::SHA1);
impl_digest!(Sha256Digest, sha2::Sha256, algorithm::SHA256);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1() {
        let result = digest(algorithm::SHA1, b"hello").unwrap();
        assert_eq!(result.len(), algorithm::SHA1_DIGEST_LEN);
        assert_eq!(
            hex::encode(&result),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
        assert_eq!(sha1(b"hello").as_slice(), result.as_slice());
    }

    #[test]
    fn test_sha256() {
        let result = digest(algorithm::SHA256, b"hello").unwrap();
        assert_eq!(
            hex::encode(result),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_output_len() {
        assert_eq!(from_uri(algorithm::SHA1).unwrap().output_len(), 20);
        assert_eq!(from_uri(algorithm::SHA256).unwrap().output_len(), 32);
    }

    #[test]
    fn test_unknown_uri() {
        assert!(matches!(
            from_uri("http://example.com/md4"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }
}
