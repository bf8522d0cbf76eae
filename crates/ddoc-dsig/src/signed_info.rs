#![forbid(unsafe_code)]

//! `<SignedInfo>`: the block whose canonical digest gets signed.

use crate::data_file::{DataFile, SignedProperties};
use crate::reference::Reference;
use crate::xml;
use ddoc_c14n::escape::escape_attr;
use ddoc_c14n::CanonicalizationService;
use ddoc_core::ns::{attr, node};
use ddoc_core::{algorithm, ns, DocProfile, Error, ValidationError};
use ddoc_crypto::encoding;
use std::fmt;

/// Minimum number of references: one data file plus SignedProperties.
pub const MIN_REFERENCES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInfo {
    profile: DocProfile,
    signature_id: Option<String>,
    signature_method: String,
    canonicalization_method: String,
    references: Vec<Reference>,
    orig_digest: Option<Vec<u8>>,
}

impl SignedInfo {
    /// Create an empty block, rejecting unsupported method identifiers.
    pub fn new(
        profile: DocProfile,
        signature_method: impl Into<String>,
        canonicalization_method: impl Into<String>,
    ) -> Result<Self, Error> {
        let signature_method = signature_method.into();
        let canonicalization_method = canonicalization_method.into();
        check_signature_method(&signature_method)?;
        check_canonicalization_method(&canonicalization_method)?;
        Ok(Self {
            profile,
            signature_id: None,
            signature_method,
            canonicalization_method,
            references: Vec::new(),
            orig_digest: None,
        })
    }

    /// Empty block with RSA-SHA1 and Canonical XML 1.0.
    pub fn legacy(profile: DocProfile) -> Self {
        Self {
            profile,
            signature_id: None,
            signature_method: algorithm::RSA_SHA1.to_owned(),
            canonicalization_method: algorithm::C14N.to_owned(),
            references: Vec::new(),
            orig_digest: None,
        }
    }

    pub fn profile(&self) -> DocProfile {
        self.profile
    }

    /// Id of the owning signature.
    pub fn signature_id(&self) -> Option<&str> {
        self.signature_id.as_deref()
    }

    pub fn set_signature_id(&mut self, id: impl Into<String>) {
        self.signature_id = Some(id.into());
    }

    pub fn signature_method(&self) -> &str {
        &self.signature_method
    }

    pub fn canonicalization_method(&self) -> &str {
        &self.canonicalization_method
    }

    // ── References ───────────────────────────────────────────────────

    /// Append a reference. Duplicate URIs are not detected here.
    pub fn add_reference(&mut self, reference: Reference) {
        self.references.push(reference);
    }

    pub fn count_references(&self) -> usize {
        self.references.len()
    }

    pub fn reference(&self, idx: usize) -> Option<&Reference> {
        self.references.get(idx)
    }

    pub fn last_reference(&self) -> Option<&Reference> {
        self.references.last()
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// First reference pointing at `data_file`, by `#` + id or, for BDOC,
    /// by container name.
    pub fn reference_for_data_file(&self, data_file: &DataFile) -> Option<&Reference> {
        let fragment = format!("#{}", data_file.id);
        let direct = self
            .profile
            .uses_direct_references()
            .then(|| data_file.container_name());
        self.references
            .iter()
            .find(|r| r.uri() == fragment || direct.as_deref() == Some(r.uri()))
    }

    /// First reference pointing at `signed_properties`.
    pub fn reference_for_signed_properties(
        &self,
        signed_properties: &dyn SignedProperties,
    ) -> Option<&Reference> {
        let fragment = format!("#{}", signed_properties.id());
        let target_form = format!("{}-SignedProperties", signed_properties.target());
        self.references
            .iter()
            .find(|r| r.uri() == fragment || r.uri() == target_form)
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Structural check on the reference list plus every reference's own
    /// field errors.
    pub fn validate_references(&self) -> Vec<ValidationError> {
        if self.references.len() < MIN_REFERENCES {
            return vec![ValidationError::TooFewReferences {
                count: self.references.len(),
            }];
        }
        self.references.iter().flat_map(Reference::validate).collect()
    }

    /// Every problem found in the methods and references.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errs: Vec<ValidationError> = [
            check_signature_method(&self.signature_method),
            check_canonicalization_method(&self.canonicalization_method),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();
        errs.extend(self.validate_references());
        errs
    }

    // ── Digest ───────────────────────────────────────────────────────

    /// Digest as captured when this block was read from a document.
    pub fn orig_digest(&self) -> Option<&[u8]> {
        self.orig_digest.as_deref()
    }

    pub fn set_orig_digest(&mut self, digest: Option<Vec<u8>>) {
        self.orig_digest = digest;
    }

    /// SHA-1 over the canonical form of this block.
    ///
    /// A block read from a document returns the digest of the bytes it was
    /// read from, never a recomputation.
    pub fn calculate_digest(&self, c14n: &dyn CanonicalizationService) -> Result<Vec<u8>, Error> {
        if let Some(digest) = &self.orig_digest {
            return Ok(digest.clone());
        }
        let canonical = c14n.canonicalize(self.to_xml().as_bytes(), algorithm::C14N)?;
        let digest = ddoc_crypto::digest::digest(algorithm::SHA1, &canonical)?;
        log::debug!(
            "SignedInfo digest over {} canonical bytes: {}",
            canonical.len(),
            encoding::encode(&digest)
        );
        Ok(digest)
    }

    // ── XML ──────────────────────────────────────────────────────────

    pub fn to_xml(&self) -> String {
        let mut out = format!("<SignedInfo xmlns=\"{}\">\n", ns::DSIG);
        out.push_str("<CanonicalizationMethod Algorithm=\"");
        out.push_str(&escape_attr(&self.canonicalization_method));
        out.push_str("\">\n</CanonicalizationMethod>\n");
        out.push_str("<SignatureMethod Algorithm=\"");
        out.push_str(&escape_attr(&self.signature_method));
        out.push_str("\">\n</SignatureMethod>\n");
        for reference in &self.references {
            out.push_str(&reference.to_xml());
            out.push('\n');
        }
        out.push_str("</SignedInfo>");
        out
    }

    /// Read the first `<SignedInfo>` in `xml`.
    ///
    /// Methods and references are taken as found; call
    /// [`validate`](Self::validate) to check them. The digest of the block
    /// as it appears in `xml` is kept as the original digest.
    pub fn from_xml(
        xml: &str,
        profile: DocProfile,
        c14n: &dyn CanonicalizationService,
    ) -> Result<Self, Error> {
        let doc = xml::parse(xml)?;
        let element = xml::find_element(&doc, node::SIGNED_INFO)?;
        Self::from_node(element, xml, profile, c14n)
    }

    /// Read a parsed `<SignedInfo>` element; `source` is the text it was
    /// parsed from.
    pub fn from_node(
        element: roxmltree::Node<'_, '_>,
        source: &str,
        profile: DocProfile,
        c14n: &dyn CanonicalizationService,
    ) -> Result<Self, Error> {
        let method = |name: &str| {
            xml::find_child(element, name)
                .and_then(|n| n.attribute(attr::ALGORITHM))
                .unwrap_or("")
                .to_owned()
        };
        let canonicalization_method = method(node::CANONICALIZATION_METHOD);
        let signature_method = method(node::SIGNATURE_METHOD);

        let references = xml::find_children(element, node::REFERENCE)
            .into_iter()
            .map(|r| Reference::from_node(r, profile))
            .collect::<Result<Vec<_>, Error>>()?;

        let fragment = xml::standalone_fragment(element, source);
        let canonical = c14n.canonicalize(fragment.as_bytes(), algorithm::C14N)?;
        let orig_digest = ddoc_crypto::sha1(&canonical).to_vec();
        log::debug!(
            "read SignedInfo with {} references, original digest {}",
            references.len(),
            encoding::encode(&orig_digest)
        );

        let signature_id = element
            .parent()
            .filter(|p| p.is_element())
            .and_then(|p| p.attribute(attr::ID))
            .map(str::to_owned);

        Ok(Self {
            profile,
            signature_id,
            signature_method,
            canonicalization_method,
            references,
            orig_digest: Some(orig_digest),
        })
    }
}

impl fmt::Display for SignedInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

fn check_signature_method(uri: &str) -> Result<(), ValidationError> {
    if uri != algorithm::RSA_SHA1 {
        return Err(ValidationError::SignatureMethod(uri.to_owned()));
    }
    Ok(())
}

fn check_canonicalization_method(uri: &str) -> Result<(), ValidationError> {
    if uri != algorithm::C14N {
        return Err(ValidationError::CanonicalizationMethod(uri.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_file::{ContentType, SignedPropertiesXml};
    use ddoc_c14n::InclusiveC14n;
    use ddoc_core::DocVersion;

    fn profile() -> DocProfile {
        DocProfile::digidoc(DocVersion::V1_3)
    }

    fn data_ref(si: &SignedInfo, id: &str, content: &[u8]) -> Reference {
        let df = DataFile::from_content(id, format!("{id}.txt"), ContentType::Embedded, content);
        Reference::from_data_file(si, &df).unwrap()
    }

    fn two_refs() -> SignedInfo {
        let mut si = SignedInfo::legacy(profile());
        let a = data_ref(&si, "D0", b"first");
        let b = data_ref(&si, "D1", b"second");
        si.add_reference(a);
        si.add_reference(b);
        si
    }

    #[test]
    fn test_new_rejects_methods() {
        let err = SignedInfo::new(profile(), algorithm::RSA_SHA1, "http://www.w3.org/2006/12/xml-c14n11")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::CanonicalizationMethod(_))
        ));
        let err = SignedInfo::new(profile(), "urn:dsa", "urn:bad").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::SignatureMethod(_))
        ));
        assert!(SignedInfo::new(profile(), algorithm::RSA_SHA1, algorithm::C14N).is_ok());
    }

    #[test]
    fn test_reference_count_rule() {
        let mut si = SignedInfo::legacy(profile());
        assert_eq!(
            si.validate_references(),
            vec![ValidationError::TooFewReferences { count: 0 }]
        );
        let r = data_ref(&si, "D0", b"x");
        si.add_reference(r);
        assert_eq!(
            si.validate_references(),
            vec![ValidationError::TooFewReferences { count: 1 }]
        );
        let r = data_ref(&si, "D1", b"y");
        si.add_reference(r);
        assert!(si.validate_references().is_empty());
        let r = data_ref(&si, "D2", b"z");
        si.add_reference(r);
        assert!(si.validate_references().is_empty());
    }

    #[test]
    fn test_validate_aggregates_reference_errors() {
        let xml = r##"<SignedInfo xmlns="http://www.w3.org/2000/09/xmldsig#"><CanonicalizationMethod Algorithm="urn:c14n"/><SignatureMethod Algorithm="http://www.w3.org/2000/09/xmldsig#rsa-sha1"/><Reference URI="#D0"><DigestMethod Algorithm="http://www.w3.org/2000/09/xmldsig#sha1"/><DigestValue>AAAA</DigestValue></Reference><Reference URI=""><DigestMethod Algorithm="http://www.w3.org/2000/09/xmldsig#sha1"/><DigestValue>qvTGHdzF6KLavt4PO0gs2a6pQ00=</DigestValue></Reference></SignedInfo>"##;
        let si = SignedInfo::from_xml(xml, profile(), &InclusiveC14n).unwrap();
        assert_eq!(si.count_references(), 2);
        assert_eq!(
            si.validate(),
            vec![
                ValidationError::CanonicalizationMethod("urn:c14n".into()),
                ValidationError::DigestLength {
                    expected: 20,
                    actual: 3
                },
                ValidationError::ReferenceUri,
            ]
        );
    }

    #[test]
    fn test_bad_c14n_reported_even_with_good_references() {
        let mut si = two_refs();
        si.canonicalization_method = "http://www.w3.org/2001/10/xml-exc-c14n#".into();
        let errs = si.validate();
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], ValidationError::CanonicalizationMethod(_)));
    }

    #[test]
    fn test_lookup() {
        let mut si = two_refs();
        let sp = SignedPropertiesXml::new("S0-SignedProperties", "#S0", "<SignedProperties/>");
        let r = Reference::from_signed_properties(&si, &sp, &InclusiveC14n).unwrap();
        si.add_reference(r);

        let d1 = DataFile::new("D1", "D1.txt", ContentType::Embedded, vec![]);
        assert_eq!(si.reference_for_data_file(&d1).map(Reference::uri), Some("#D1"));
        let d9 = DataFile::new("D9", "D9.txt", ContentType::Embedded, vec![]);
        assert!(si.reference_for_data_file(&d9).is_none());
        assert_eq!(
            si.reference_for_signed_properties(&sp).map(Reference::uri),
            Some("#S0-SignedProperties")
        );
        assert_eq!(si.last_reference().map(Reference::uri), Some("#S0-SignedProperties"));
        assert_eq!(si.reference(0).map(Reference::uri), Some("#D0"));
        assert!(si.reference(3).is_none());
    }

    #[test]
    fn test_lookup_direct_profile() {
        let mut si = SignedInfo::legacy(DocProfile::bdoc());
        let df = DataFile::from_content("D0", "dir/doc.pdf", ContentType::Embedded, b"hello");
        let r = Reference::from_data_file(&si, &df).unwrap();
        si.add_reference(r);
        assert_eq!(si.reference_for_data_file(&df).map(Reference::uri), Some("doc.pdf"));
    }

    #[test]
    fn test_file_name_with_markup_characters() {
        let mut si = SignedInfo::legacy(DocProfile::bdoc());
        for (id, name) in [("D0", "R&D.pdf"), ("D1", "b.pdf")] {
            let df = DataFile::from_content(id, name, ContentType::Embedded, b"data");
            let r = Reference::from_data_file(&si, &df).unwrap();
            si.add_reference(r);
        }
        assert!(si.validate().is_empty());

        let xml = si.to_xml();
        assert!(xml.contains("<Reference URI=\"/R&amp;D.pdf\">"));
        let digest = si.calculate_digest(&InclusiveC14n).unwrap();

        let parsed = SignedInfo::from_xml(&xml, DocProfile::bdoc(), &InclusiveC14n).unwrap();
        assert_eq!(parsed.references()[0].uri(), "R&D.pdf");
        assert_eq!(parsed.orig_digest(), Some(digest.as_slice()));
    }

    #[test]
    fn test_to_xml_layout() {
        let si = two_refs();
        let xml = si.to_xml();
        assert!(xml.starts_with(
            "<SignedInfo xmlns=\"http://www.w3.org/2000/09/xmldsig#\">\n\
             <CanonicalizationMethod Algorithm=\"http://www.w3.org/TR/2001/REC-xml-c14n-20010315\">\n\
             </CanonicalizationMethod>\n\
             <SignatureMethod Algorithm=\"http://www.w3.org/2000/09/xmldsig#rsa-sha1\">\n\
             </SignatureMethod>\n\
             <Reference URI=\"#D0\">\n"
        ));
        assert!(xml.ends_with("</Reference>\n</SignedInfo>"));
        assert_eq!(xml.matches("<Reference ").count(), 2);
    }

    #[test]
    fn test_digest_idempotent() {
        let si = two_refs();
        let first = si.calculate_digest(&InclusiveC14n).unwrap();
        let second = si.calculate_digest(&InclusiveC14n).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 20);
    }

    #[test]
    fn test_digest_matches_canonical_form() {
        let si = two_refs();
        let canonical = InclusiveC14n
            .canonicalize(si.to_xml().as_bytes(), algorithm::C14N)
            .unwrap();
        assert_eq!(
            si.calculate_digest(&InclusiveC14n).unwrap(),
            ddoc_crypto::sha1(&canonical).to_vec()
        );
    }

    #[test]
    fn test_digest_order_sensitive() {
        let si = two_refs();
        let mut swapped = SignedInfo::legacy(profile());
        swapped.add_reference(si.references()[1].clone());
        swapped.add_reference(si.references()[0].clone());
        assert_ne!(
            si.calculate_digest(&InclusiveC14n).unwrap(),
            swapped.calculate_digest(&InclusiveC14n).unwrap()
        );
    }

    #[test]
    fn test_orig_digest_preferred() {
        let mut si = two_refs();
        si.set_orig_digest(Some(vec![7u8; 20]));
        assert_eq!(si.calculate_digest(&InclusiveC14n).unwrap(), vec![7u8; 20]);
        assert_eq!(si.calculate_digest(&InclusiveC14n).unwrap(), vec![7u8; 20]);
        si.set_orig_digest(None);
        assert_ne!(si.calculate_digest(&InclusiveC14n).unwrap(), vec![7u8; 20]);
    }

    #[test]
    fn test_parsed_block_keeps_original_digest() {
        let si = two_refs();
        let xml = si.to_xml();
        let parsed = SignedInfo::from_xml(&xml, profile(), &InclusiveC14n).unwrap();
        assert_eq!(parsed.count_references(), si.count_references());
        for (read, built) in parsed.references().iter().zip(si.references()) {
            assert_eq!(read.uri(), built.uri());
            assert_eq!(read.digest_value(), built.digest_value());
            assert_eq!(read.to_xml(), built.to_xml());
        }
        let fresh = si.calculate_digest(&InclusiveC14n).unwrap();
        assert_eq!(parsed.orig_digest(), Some(fresh.as_slice()));
        assert_eq!(parsed.calculate_digest(&InclusiveC14n).unwrap(), fresh);
        assert!(parsed.validate().is_empty());
    }

    #[test]
    fn test_parsed_block_with_inherited_namespace() {
        let inner = two_refs().to_xml().replace(
            "<SignedInfo xmlns=\"http://www.w3.org/2000/09/xmldsig#\">",
            "<SignedInfo>",
        );
        let doc = format!(
            "<Signature xmlns=\"http://www.w3.org/2000/09/xmldsig#\" Id=\"S0\">{inner}</Signature>"
        );
        let parsed = SignedInfo::from_xml(&doc, profile(), &InclusiveC14n).unwrap();
        assert_eq!(parsed.signature_id(), Some("S0"));
        assert_eq!(
            parsed.orig_digest(),
            Some(two_refs().calculate_digest(&InclusiveC14n).unwrap().as_slice())
        );
    }

    #[test]
    fn test_missing_signed_info() {
        assert!(matches!(
            SignedInfo::from_xml("<Signature/>", profile(), &InclusiveC14n),
            Err(Error::MissingElement(_))
        ));
    }
}
