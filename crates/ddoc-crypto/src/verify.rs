#![forbid(unsafe_code)]

//! RSA PKCS#1 v1.5 signature verification keyed by signature algorithm OID.

use ddoc_core::algorithm::oid;
use ddoc_core::Error;

/// Verify `signature` over `data` with the RSA key in `spki_der`.
///
/// `sig_alg_oid` is the dotted signature algorithm OID as found in the
/// signed structure (sha1WithRSAEncryption or sha256WithRSAEncryption).
pub fn verify_rsa(
    spki_der: &[u8],
    sig_alg_oid: &str,
    data: &[u8],
    signature: &[u8],
) -> Result<(), Error> {
    log::debug!("verifying RSA signature {sig_alg_oid} over {} bytes", data.len());
    match sig_alg_oid {
        oid::SHA1_RSA => verify_rsa_signature::<sha1::Sha1>(spki_der, data, signature),
        oid::SHA256_RSA => verify_rsa_signature::<sha2::Sha256>(spki_der, data, signature),
        _ => Err(Error::UnsupportedAlgorithm(format!(
            "signature algorithm: {sig_alg_oid}"
        ))),
    }
}

fn verify_rsa_signature<D>(spki_der: &[u8], data: &[u8], signature: &[u8]) -> Result<(), Error>
where
    D: ::digest::Digest + ::digest::const_oid::AssociatedOid,
    rsa::pkcs1v15::VerifyingKey<D>: signature::Verifier<rsa::pkcs1v15::Signature>,
{
    use spki::DecodePublicKey;

    let public_key = rsa::RsaPublicKey::from_public_key_der(spki_der)
        .map_err(|e| Error::Crypto(format!("invalid RSA public key: {e}")))?;
    let verifying_key = rsa::pkcs1v15::VerifyingKey::<D>::new(public_key);
    let sig = rsa::pkcs1v15::Signature::try_from(signature)
        .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;

    use signature::Verifier;
    verifying_key
        .verify(data, &sig)
        .map_err(|e| Error::Crypto(format!("signature verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::EncodePublicKey;
    use signature::{SignatureEncoding, Signer};

    fn keypair() -> (rsa::RsaPrivateKey, Vec<u8>) {
        let mut rng = rand::thread_rng();
        let key = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let spki = key.to_public_key().to_public_key_der().unwrap();
        (key, spki.as_bytes().to_vec())
    }

    #[test]
    fn test_verify_sha256_rsa() {
        let (key, spki) = keypair();
        let signer = rsa::pkcs1v15::SigningKey::<sha2::Sha256>::new(key);
        let sig = signer.sign(b"tbs response data").to_vec();
        verify_rsa(&spki, oid::SHA256_RSA, b"tbs response data", &sig).unwrap();
        assert!(verify_rsa(&spki, oid::SHA256_RSA, b"tampered", &sig).is_err());
        assert!(verify_rsa(&spki, oid::SHA1_RSA, b"tbs response data", &sig).is_err());
    }

    #[test]
    fn test_unsupported_oid() {
        assert!(matches!(
            verify_rsa(&[], "1.2.840.10045.4.3.2", b"", b""),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }
}
