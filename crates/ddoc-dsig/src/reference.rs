#![forbid(unsafe_code)]

//! A `<Reference>` inside `<SignedInfo>`.
//!
//! References are built through constructors that check every field and
//! stop at the first violation, in the order URI, digest algorithm, digest
//! value, transform. References read from an existing document are taken
//! as found and checked afterwards with [`Reference::validate`].

use crate::data_file::{DataFile, SignedProperties};
use crate::signed_info::SignedInfo;
use crate::xml;
use ddoc_c14n::escape::escape_attr;
use ddoc_c14n::CanonicalizationService;
use ddoc_core::ns::{attr, node};
use ddoc_core::{algorithm, DocProfile, Error, ValidationError};
use ddoc_crypto::encoding;
use std::fmt;

const SIGNED_PROPERTIES_MARKER: &str = "SignedProperties";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    profile: DocProfile,
    uri: String,
    type_hint: Option<String>,
    digest_algorithm: String,
    digest_value: Vec<u8>,
    transform_algorithm: Option<String>,
    data_file_id: Option<String>,
}

impl Reference {
    /// Create a reference for `signed_info`, rejecting the first invalid field.
    pub fn new(
        signed_info: &SignedInfo,
        uri: impl Into<String>,
        digest_algorithm: impl Into<String>,
        digest_value: Vec<u8>,
        transform_algorithm: Option<String>,
    ) -> Result<Self, Error> {
        Self::checked(
            signed_info.profile(),
            uri.into(),
            digest_algorithm.into(),
            digest_value,
            transform_algorithm,
        )
    }

    /// Reference to a data file.
    ///
    /// BDOC references the file by its container name, DIGIDOC-XML by
    /// `#` + id. The detached-document transform is set only for detached
    /// content.
    pub fn from_data_file(signed_info: &SignedInfo, data_file: &DataFile) -> Result<Self, Error> {
        let profile = signed_info.profile();
        let uri = if profile.uses_direct_references() {
            data_file.container_name()
        } else {
            format!("#{}", data_file.id)
        };
        let transform = data_file
            .is_detached()
            .then(|| algorithm::DIGIDOC_DETACHED_TRANSFORM.to_owned());
        let mut reference = Self::checked(
            profile,
            uri,
            algorithm::SHA1.to_owned(),
            data_file.digest.clone(),
            transform,
        )?;
        reference.data_file_id = Some(data_file.id.clone());
        Ok(reference)
    }

    /// Reference to the signature's SignedProperties block, digesting its
    /// canonical form.
    pub fn from_signed_properties(
        signed_info: &SignedInfo,
        signed_properties: &dyn SignedProperties,
        c14n: &dyn CanonicalizationService,
    ) -> Result<Self, Error> {
        let uri = format!("{}-{SIGNED_PROPERTIES_MARKER}", signed_properties.target());
        let digest = signed_properties.calculate_digest(c14n)?;
        log::debug!("SignedProperties {uri} digest: {}", encoding::encode(&digest));
        Self::checked(
            signed_info.profile(),
            uri,
            algorithm::SHA1.to_owned(),
            digest,
            None,
        )
    }

    fn checked(
        profile: DocProfile,
        uri: String,
        digest_algorithm: String,
        digest_value: Vec<u8>,
        transform_algorithm: Option<String>,
    ) -> Result<Self, Error> {
        check_uri(&uri)?;
        check_digest_algorithm(&digest_algorithm)?;
        check_digest_length(&digest_value)?;
        check_transform(transform_algorithm.as_deref())?;
        Ok(Self {
            profile,
            uri,
            type_hint: None,
            digest_algorithm,
            digest_value,
            transform_algorithm,
            data_file_id: None,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// `Type` attribute as read from a document, if any.
    pub fn type_hint(&self) -> Option<&str> {
        self.type_hint.as_deref()
    }

    pub fn digest_algorithm(&self) -> &str {
        &self.digest_algorithm
    }

    pub fn digest_value(&self) -> &[u8] {
        &self.digest_value
    }

    pub fn transform_algorithm(&self) -> Option<&str> {
        self.transform_algorithm.as_deref()
    }

    /// Id of the data file this reference was built from.
    pub fn data_file_id(&self) -> Option<&str> {
        self.data_file_id.as_deref()
    }

    pub fn profile(&self) -> DocProfile {
        self.profile
    }

    pub fn is_signed_properties(&self) -> bool {
        self.uri.contains(SIGNED_PROPERTIES_MARKER)
    }

    /// Replace the digest value, e.g. after the referenced content changed.
    pub fn set_digest_value(&mut self, digest_value: Vec<u8>) -> Result<(), Error> {
        check_digest_length(&digest_value)?;
        self.digest_value = digest_value;
        Ok(())
    }

    /// Every violated field, in field order.
    pub fn validate(&self) -> Vec<ValidationError> {
        [
            check_uri(&self.uri),
            check_digest_algorithm(&self.digest_algorithm),
            check_digest_length(&self.digest_value),
            check_transform(self.transform_algorithm.as_deref()),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect()
    }

    // ── XML ──────────────────────────────────────────────────────────

    /// Serialize in the exact layout that is canonicalized and signed.
    pub fn to_xml(&self) -> String {
        let signed_properties = self.is_signed_properties();
        let mut out = String::from("<Reference");
        if self.profile.writes_v111_signed_properties_type() && signed_properties {
            out.push_str(&format!(
                " Type=\"{}\"",
                algorithm::SIGNED_PROPERTIES_TYPE_V111
            ));
        }
        out.push_str(" URI=\"");
        if self.profile.uses_direct_references() {
            if !signed_properties {
                out.push('/');
            }
            out.push_str(&escape_attr(&self.uri));
            out.push('"');
            if signed_properties {
                out.push_str(&format!(" Type=\"{}\" ", algorithm::SIGNED_PROPERTIES_TYPE));
            }
            out.push_str(">\n");
        } else {
            out.push_str(&escape_attr(&self.uri));
            out.push_str("\">\n");
        }

        if let Some(transform) = &self.transform_algorithm {
            out.push_str("<Transforms><Transform Algorithm=\"");
            out.push_str(&escape_attr(transform));
            out.push_str("\"></Transform></Transforms>\n");
        }

        out.push_str("<DigestMethod Algorithm=\"");
        out.push_str(&escape_attr(&self.digest_algorithm));
        out.push_str("\">\n</DigestMethod>\n");
        out.push_str("<DigestValue>");
        out.push_str(&encoding::encode(&self.digest_value));
        out.push_str("</DigestValue>\n");
        out.push_str("</Reference>");
        out
    }

    /// Read a standalone `<Reference>` element.
    pub fn from_xml(xml: &str, profile: DocProfile) -> Result<Self, Error> {
        let doc = xml::parse(xml)?;
        let node = xml::find_element(&doc, node::REFERENCE)?;
        Self::from_node(node, profile)
    }

    /// Read a parsed `<Reference>` element without validating it.
    ///
    /// The leading `/` that BDOC writes in front of data file URIs is
    /// removed again.
    pub fn from_node(element: roxmltree::Node<'_, '_>, profile: DocProfile) -> Result<Self, Error> {
        let mut uri = element.attribute(attr::URI).unwrap_or("").to_owned();
        if profile.uses_direct_references() && !uri.contains(SIGNED_PROPERTIES_MARKER) {
            if let Some(stripped) = uri.strip_prefix('/') {
                uri = stripped.to_owned();
            }
        }

        let transform_algorithm = xml::find_child(element, node::TRANSFORMS)
            .and_then(|t| xml::find_child(t, node::TRANSFORM))
            .and_then(|t| t.attribute(attr::ALGORITHM))
            .map(str::to_owned);

        let digest_algorithm = xml::find_child(element, node::DIGEST_METHOD)
            .and_then(|m| m.attribute(attr::ALGORITHM))
            .unwrap_or("")
            .to_owned();

        let digest_value = match xml::find_child(element, node::DIGEST_VALUE) {
            Some(v) => encoding::decode(v.text().unwrap_or(""))?,
            None => Vec::new(),
        };

        Ok(Self {
            profile,
            uri,
            type_hint: element.attribute(attr::TYPE).map(str::to_owned),
            digest_algorithm,
            digest_value,
            transform_algorithm,
            data_file_id: None,
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

// ── Field checks ─────────────────────────────────────────────────────

fn check_uri(uri: &str) -> Result<(), ValidationError> {
    if uri.is_empty() {
        return Err(ValidationError::ReferenceUri);
    }
    Ok(())
}

fn check_digest_algorithm(uri: &str) -> Result<(), ValidationError> {
    if uri != algorithm::SHA1 {
        return Err(ValidationError::DigestAlgorithm(uri.to_owned()));
    }
    Ok(())
}

fn check_digest_length(digest: &[u8]) -> Result<(), ValidationError> {
    if digest.len() != algorithm::SHA1_DIGEST_LEN {
        return Err(ValidationError::DigestLength {
            expected: algorithm::SHA1_DIGEST_LEN,
            actual: digest.len(),
        });
    }
    Ok(())
}

fn check_transform(transform: Option<&str>) -> Result<(), ValidationError> {
    match transform {
        None | Some(algorithm::DIGIDOC_DETACHED_TRANSFORM) => Ok(()),
        Some(other) => Err(ValidationError::TransformAlgorithm(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_file::{ContentType, SignedPropertiesXml};
    use ddoc_c14n::InclusiveC14n;
    use ddoc_core::DocVersion;

    fn digidoc() -> SignedInfo {
        SignedInfo::legacy(DocProfile::digidoc(DocVersion::V1_3))
    }

    fn bdoc() -> SignedInfo {
        SignedInfo::legacy(DocProfile::bdoc())
    }

    fn sha1_hello() -> Vec<u8> {
        ddoc_crypto::sha1(b"hello").to_vec()
    }

    #[test]
    fn test_digest_length_rejected() {
        let si = digidoc();
        for len in [0usize, 1, 19, 21, 32] {
            let err = Reference::new(&si, "#D0", algorithm::SHA1, vec![0u8; len], None).unwrap_err();
            assert!(
                matches!(
                    err,
                    Error::Validation(ValidationError::DigestLength { expected: 20, actual }) if actual == len
                ),
                "length {len}: {err}"
            );
        }
        assert!(Reference::new(&si, "#D0", algorithm::SHA1, vec![0u8; 20], None).is_ok());
    }

    #[test]
    fn test_transform_whitelist() {
        let si = digidoc();
        let ok = [None, Some(algorithm::DIGIDOC_DETACHED_TRANSFORM.to_owned())];
        for transform in ok {
            assert!(Reference::new(&si, "#D0", algorithm::SHA1, sha1_hello(), transform).is_ok());
        }
        let bad = [
            "http://www.w3.org/2000/09/xmldsig#enveloped-signature",
            algorithm::C14N,
            "",
        ];
        for transform in bad {
            let err = Reference::new(
                &si,
                "#D0",
                algorithm::SHA1,
                sha1_hello(),
                Some(transform.to_owned()),
            )
            .unwrap_err();
            assert!(matches!(
                err,
                Error::Validation(ValidationError::TransformAlgorithm(_))
            ));
        }
    }

    #[test]
    fn test_first_violation_wins() {
        let si = digidoc();
        let err = Reference::new(&si, "", "md5", vec![], Some("x".into())).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::ReferenceUri)));
        let err = Reference::new(&si, "#D0", "md5", vec![], Some("x".into())).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::DigestAlgorithm(_))
        ));
        let err = Reference::new(&si, "#D0", algorithm::SHA1, vec![], Some("x".into())).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::DigestLength { .. })
        ));
    }

    #[test]
    fn test_validate_collects_all() {
        let xml = r#"<Reference URI=""><Transforms><Transform Algorithm="urn:x"/></Transforms><DigestMethod Algorithm="urn:md5"/><DigestValue>AAAA</DigestValue></Reference>"#;
        let r = Reference::from_xml(xml, DocProfile::default()).unwrap();
        assert_eq!(
            r.validate(),
            vec![
                ValidationError::ReferenceUri,
                ValidationError::DigestAlgorithm("urn:md5".into()),
                ValidationError::DigestLength {
                    expected: 20,
                    actual: 3
                },
                ValidationError::TransformAlgorithm("urn:x".into()),
            ]
        );
    }

    #[test]
    fn test_from_data_file_fragment_profile() {
        let df = DataFile::new("D0", "doc.pdf", ContentType::Embedded, sha1_hello())
            .with_full_name("doc.pdf");
        let r = Reference::from_data_file(&digidoc(), &df).unwrap();
        assert_eq!(r.uri(), "#D0");
        assert_eq!(r.digest_algorithm(), algorithm::SHA1);
        assert_eq!(r.transform_algorithm(), None);
        assert_eq!(r.digest_value(), sha1_hello().as_slice());
        assert_eq!(r.data_file_id(), Some("D0"));
    }

    #[test]
    fn test_from_data_file_direct_profile() {
        let df = DataFile::new("D0", "/home/user/doc.pdf", ContentType::Embedded, sha1_hello());
        let r = Reference::from_data_file(&bdoc(), &df).unwrap();
        assert_eq!(r.uri(), "doc.pdf");

        let df = df.with_full_name("content/doc.pdf");
        let r = Reference::from_data_file(&bdoc(), &df).unwrap();
        assert_eq!(r.uri(), "content/doc.pdf");
    }

    #[test]
    fn test_from_data_file_detached() {
        let df = DataFile::new("D1", "big.iso", ContentType::Detached, sha1_hello());
        let r = Reference::from_data_file(&digidoc(), &df).unwrap();
        assert_eq!(
            r.transform_algorithm(),
            Some(algorithm::DIGIDOC_DETACHED_TRANSFORM)
        );
    }

    #[test]
    fn test_from_signed_properties() {
        let sp = SignedPropertiesXml::new(
            "S0-SignedProperties",
            "#S0",
            "<SignedProperties Id=\"S0-SignedProperties\"></SignedProperties>",
        );
        let r = Reference::from_signed_properties(&digidoc(), &sp, &InclusiveC14n).unwrap();
        assert_eq!(r.uri(), "#S0-SignedProperties");
        assert!(r.is_signed_properties());
        assert_eq!(
            r.digest_value(),
            ddoc_crypto::sha1(sp.xml().as_bytes()).as_slice()
        );
    }

    #[test]
    fn test_to_xml_fragment_profile() {
        let r = Reference::new(&digidoc(), "#D0", algorithm::SHA1, sha1_hello(), None).unwrap();
        assert_eq!(
            r.to_xml(),
            "<Reference URI=\"#D0\">\n\
             <DigestMethod Algorithm=\"http://www.w3.org/2000/09/xmldsig#sha1\">\n\
             </DigestMethod>\n\
             <DigestValue>qvTGHdzF6KLavt4PO0gs2a6pQ00=</DigestValue>\n\
             </Reference>"
        );
    }

    #[test]
    fn test_to_xml_signed_properties_type_v13() {
        let r = Reference::new(
            &digidoc(),
            "#S0-SignedProperties",
            algorithm::SHA1,
            sha1_hello(),
            None,
        )
        .unwrap();
        assert!(r.to_xml().starts_with(
            "<Reference Type=\"http://uri.etsi.org/01903/v1.1.1#SignedProperties\" URI=\"#S0-SignedProperties\">\n"
        ));

        let v14 = SignedInfo::legacy(DocProfile::digidoc(DocVersion::V1_4));
        let r = Reference::new(&v14, "#S0-SignedProperties", algorithm::SHA1, sha1_hello(), None)
            .unwrap();
        assert!(r.to_xml().starts_with("<Reference URI=\"#S0-SignedProperties\">\n"));
    }

    #[test]
    fn test_to_xml_direct_profile() {
        let detached = Some(algorithm::DIGIDOC_DETACHED_TRANSFORM.to_owned());
        let r = Reference::new(&bdoc(), "doc.pdf", algorithm::SHA1, sha1_hello(), detached).unwrap();
        assert_eq!(
            r.to_xml(),
            "<Reference URI=\"/doc.pdf\">\n\
             <Transforms><Transform Algorithm=\"http://www.sk.ee/2002/10/digidoc#detatched-document-signature\"></Transform></Transforms>\n\
             <DigestMethod Algorithm=\"http://www.w3.org/2000/09/xmldsig#sha1\">\n\
             </DigestMethod>\n\
             <DigestValue>qvTGHdzF6KLavt4PO0gs2a6pQ00=</DigestValue>\n\
             </Reference>"
        );

        let r = Reference::new(&bdoc(), "#S0-SignedProperties", algorithm::SHA1, sha1_hello(), None)
            .unwrap();
        assert!(r.to_xml().starts_with(
            "<Reference URI=\"#S0-SignedProperties\" Type=\"http://uri.etsi.org/01903#SignedProperties\" >\n"
        ));
    }

    #[test]
    fn test_xml_roundtrip() {
        let detached = Some(algorithm::DIGIDOC_DETACHED_TRANSFORM.to_owned());
        for si in [digidoc(), bdoc()] {
            for uri in ["#D0", "doc.pdf", "#S0-SignedProperties"] {
                let r = Reference::new(&si, uri, algorithm::SHA1, sha1_hello(), detached.clone())
                    .unwrap();
                let back = Reference::from_xml(&r.to_xml(), si.profile()).unwrap();
                assert_eq!(back.uri(), r.uri());
                assert_eq!(back.digest_algorithm(), r.digest_algorithm());
                assert_eq!(back.digest_value(), r.digest_value());
                assert_eq!(back.transform_algorithm(), r.transform_algorithm());
                assert!(back.validate().is_empty());
            }
        }
    }

    #[test]
    fn test_bad_digest_value_base64() {
        let xml = r##"<Reference URI="#D0"><DigestValue>***</DigestValue></Reference>"##;
        assert!(matches!(
            Reference::from_xml(xml, DocProfile::default()),
            Err(Error::Base64(_))
        ));
    }
}
