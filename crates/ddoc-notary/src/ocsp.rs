#![forbid(unsafe_code)]

//! OCSP request encoding and response verification (RFC 6960).
//!
//! Requests carry a single `CertID` hashed with SHA-1 and, optionally, a
//! nonce extension. Responses are checked against the pinned responder
//! certificates of a [`CertStore`]: the responder must be known and trusted,
//! its signature must verify, the nonce must echo the request and the
//! single response must be about the requested certificate.

use crate::cert::X509Cert;
use crate::notary::CertStatus;
use crate::store::CertStore;
use chrono::{DateTime, Utc};
use ddoc_core::algorithm::oid;
use ddoc_core::{Error, RevocationError};
use rasn::types::{Any, ObjectIdentifier, OctetString};
use rasn_ocsp::{BasicOcspResponse, OcspResponseStatus, ResponderId};

/// Outcome of a successfully verified OCSP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedResponse {
    pub responder_cn: String,
    pub responder_serial: String,
    pub produced_at: DateTime<Utc>,
    pub status: CertStatus,
}

/// What a response is expected to be about.
#[derive(Debug, Clone, Copy)]
pub struct Expectation<'a> {
    pub cert: &'a X509Cert,
    pub issuer: &'a X509Cert,
    /// Nonce sent with the request; `None` skips the nonce check.
    pub nonce: Option<&'a [u8]>,
}

// ── Request ──────────────────────────────────────────────────────────

/// Encode an unsigned OCSP request for `cert` issued by `issuer`.
pub fn build_request(
    cert: &X509Cert,
    issuer: &X509Cert,
    nonce: Option<&[u8]>,
) -> Result<Vec<u8>, Error> {
    let req_cert = make_cert_id(cert, issuer)?;
    let request_extensions = match nonce {
        Some(nonce) => Some(rasn_pkix::Extensions::from(vec![nonce_extension(nonce)?])),
        None => None,
    };

    let ocsp_request = rasn_ocsp::OcspRequest {
        tbs_request: rasn_ocsp::TbsRequest {
            version: rasn_ocsp::Version::from(0u8),
            requestor_name: None,
            request_list: vec![rasn_ocsp::Request {
                req_cert,
                single_request_extensions: None,
            }],
            request_extensions,
        },
        optional_signature: None,
    };

    let der = rasn::der::encode(&ocsp_request)
        .map_err(|e| Error::Other(format!("failed to encode OCSP request: {e}")))?;
    log::debug!(
        "built OCSP request for serial {} ({} bytes, nonce: {})",
        cert.serial(),
        der.len(),
        nonce.is_some()
    );
    Ok(der)
}

fn make_cert_id(cert: &X509Cert, issuer: &X509Cert) -> Result<rasn_ocsp::CertId, Error> {
    let subject: rasn_pkix::Certificate = rasn::der::decode(cert.der())
        .map_err(|e| Error::Certificate(format!("failed to decode certificate: {e}")))?;
    let null = rasn::der::encode(&())
        .map_err(|e| Error::Other(format!("failed to encode NULL: {e}")))?;

    Ok(rasn_ocsp::CertId {
        hash_algorithm: rasn_pkix::AlgorithmIdentifier {
            algorithm: object_identifier(oid::SHA1)?,
            // Many responders expect NULL parameters rather than none.
            parameters: Some(Any::new(null)),
        },
        issuer_name_hash: OctetString::from(ddoc_crypto::sha1(issuer.subject_der()).to_vec()),
        issuer_key_hash: OctetString::from(issuer.key_hash().to_vec()),
        serial_number: subject.tbs_certificate.serial_number,
    })
}

fn nonce_extension(nonce: &[u8]) -> Result<rasn_pkix::Extension, Error> {
    let value = rasn::der::encode(&OctetString::from(nonce.to_vec()))
        .map_err(|e| Error::Other(format!("failed to encode OCSP nonce: {e}")))?;
    Ok(rasn_pkix::Extension {
        extn_id: object_identifier(oid::OCSP_NONCE)?,
        critical: false,
        extn_value: OctetString::from(value),
    })
}

fn object_identifier(dotted: &str) -> Result<ObjectIdentifier, Error> {
    oid::arcs(dotted)
        .and_then(ObjectIdentifier::new)
        .ok_or_else(|| Error::Other(format!("invalid object identifier {dotted}")))
}

// ── Response ─────────────────────────────────────────────────────────

/// Verify a DER encoded OCSP response.
///
/// `is_trusted` decides whether a responder common name may confirm
/// certificates. A revoked or unknown status is not an error here; it is
/// reported in [`VerifiedResponse::status`].
pub fn verify_response(
    der: &[u8],
    store: &CertStore,
    is_trusted: &dyn Fn(&str) -> bool,
    expected: &Expectation<'_>,
) -> Result<VerifiedResponse, Error> {
    let response = rasn::der::decode::<rasn_ocsp::OcspResponse>(der).map_err(malformed)?;
    if response.status != OcspResponseStatus::Successful {
        return Err(RevocationError::ResponseStatus(format!("{:?}", response.status)).into());
    }
    let bytes = response
        .bytes
        .ok_or_else(|| RevocationError::MalformedResponse("no response bytes".into()))?;
    let basic = rasn::der::decode::<BasicOcspResponse>(&bytes.response).map_err(malformed)?;
    let data = &basic.tbs_response_data;

    let responder = find_signing_responder(&basic, &bytes.response, store, is_trusted)?;

    if let Some(nonce) = expected.nonce {
        let extensions = data
            .response_extensions
            .as_ref()
            .map(|e| e.as_slice())
            .unwrap_or_default();
        check_nonce(extensions, nonce)?;
    }

    let cert_id = make_cert_id(expected.cert, expected.issuer)?;
    let single = data
        .responses
        .iter()
        .find(|r| same_cert(&r.cert_id, &cert_id))
        .ok_or(RevocationError::CertIdMismatch)?;

    let status = match &single.cert_status {
        rasn_ocsp::CertStatus::Good => CertStatus::Good,
        rasn_ocsp::CertStatus::Revoked(info) => CertStatus::Revoked {
            at: info.revocation_time.with_timezone(&Utc),
            reason: info.revocation_reason.as_ref().map(|r| format!("{r:?}")),
        },
        rasn_ocsp::CertStatus::Unknown(_) => CertStatus::Unknown,
    };

    let verified = VerifiedResponse {
        responder_cn: responder.common_name().unwrap_or_default().to_owned(),
        responder_serial: responder.serial().to_owned(),
        produced_at: data.produced_at.with_timezone(&Utc),
        status,
    };
    log::debug!(
        "OCSP response from {} (serial {}) produced at {}: {}",
        verified.responder_cn,
        verified.responder_serial,
        verified.produced_at,
        verified.status
    );
    Ok(verified)
}

fn malformed(e: impl std::fmt::Display) -> Error {
    RevocationError::MalformedResponse(e.to_string()).into()
}

/// Pick the pinned, trusted responder certificate whose key signed the response.
fn find_signing_responder<'s>(
    basic: &BasicOcspResponse,
    basic_der: &[u8],
    store: &'s CertStore,
    is_trusted: &dyn Fn(&str) -> bool,
) -> Result<&'s X509Cert, Error> {
    let (candidates, responder): (Vec<&X509Cert>, String) =
        match &basic.tbs_response_data.responder_id {
            ResponderId::ByName(name) => {
                let name_der = rasn::der::encode(name).map_err(malformed)?;
                let label = crate::cert::name_common_name(&name_der)
                    .unwrap_or_else(|| hex::encode(&name_der));
                (store.responders_by_name(&name_der), label)
            }
            ResponderId::ByKey(key_hash) => (
                store.responders_by_key_hash(key_hash.as_ref()),
                format!("key hash {}", hex::encode(key_hash.as_ref())),
            ),
        };

    if candidates.is_empty() {
        if basic.certs.as_ref().is_some_and(|c| !c.is_empty()) {
            log::warn!("OCSP response embeds a certificate for {responder} that is not pinned");
        }
        return Err(RevocationError::UnknownResponder(responder).into());
    }

    let trusted: Vec<&X509Cert> = candidates
        .iter()
        .copied()
        .filter(|c| c.common_name().is_some_and(|cn| is_trusted(cn)))
        .collect();
    if trusted.is_empty() {
        let cn = candidates[0].common_name().unwrap_or(&responder).to_owned();
        return Err(RevocationError::UntrustedResponder(cn).into());
    }

    let tbs = tbs_response_bytes(basic_der)?;
    let sig_alg = basic.signature_algorithm.algorithm.to_string();
    let signature = basic.signature.as_raw_slice();

    let mut last_err = String::new();
    for cert in trusted {
        match ddoc_crypto::verify::verify_rsa(cert.spki_der(), &sig_alg, &tbs, signature) {
            Ok(()) => return Ok(cert),
            Err(e) => {
                log::debug!("responder certificate {} did not verify: {e}", cert.serial());
                last_err = e.to_string();
            }
        }
    }
    Err(RevocationError::InvalidResponderSignature(last_err).into())
}

/// The DER bytes of `tbsResponseData` exactly as signed.
fn tbs_response_bytes(basic_der: &[u8]) -> Result<Vec<u8>, Error> {
    use der::{Decode, Encode};

    let outer = der::asn1::AnyRef::from_der(basic_der).map_err(malformed)?;
    let mut reader = der::SliceReader::new(outer.value()).map_err(malformed)?;
    let tbs = der::asn1::AnyRef::decode(&mut reader).map_err(malformed)?;
    tbs.to_der().map_err(malformed)
}

fn check_nonce(extensions: &[rasn_pkix::Extension], expected: &[u8]) -> Result<(), Error> {
    let nonce_oid = object_identifier(oid::OCSP_NONCE)?;
    let ext = extensions
        .iter()
        .find(|ext| ext.extn_id == nonce_oid)
        .ok_or(RevocationError::NonceMismatch)?;

    // Responders differ on whether the value is wrapped in an OCTET STRING.
    let matches = match rasn::der::decode::<OctetString>(&ext.extn_value) {
        Ok(inner) => inner.as_ref() == expected,
        Err(_) => false,
    } || ext.extn_value.as_ref() == expected;

    if matches {
        Ok(())
    } else {
        Err(RevocationError::NonceMismatch.into())
    }
}

fn same_cert(got: &rasn_ocsp::CertId, want: &rasn_ocsp::CertId) -> bool {
    got.hash_algorithm.algorithm.to_string() == oid::SHA1
        && got.issuer_name_hash == want.issuer_name_hash
        && got.issuer_key_hash == want.issuer_key_hash
        && got.serial_number == want.serial_number
}
