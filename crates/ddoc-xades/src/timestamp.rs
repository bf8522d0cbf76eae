#![forbid(unsafe_code)]

//! XAdES timestamp properties.
//!
//! A [`TimestampInfo`] is created with an id and a type, then gets its token
//! attached and optionally a list of [`IncludeInfo`]s. The element name it
//! serializes to and the data its token attests to both follow from the
//! [`TimestampType`].

use crate::include::IncludeInfo;
use crate::token::{TimeStampToken, TimeStampTokenDecoder};
use chrono::{DateTime, Utc};
use ddoc_c14n::escape::escape_attr;
use ddoc_c14n::CanonicalizationService;
use ddoc_core::algorithm::{self, oid};
use ddoc_core::ns::{attr, node};
use ddoc_core::{Error, TokenError, ValidationError};
use ddoc_crypto::encoding;
use std::fmt;

/// The six XAdES timestamp properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampType {
    /// Over all signed data objects.
    AllDataObjects = 0,
    /// Over selected data objects, listed as `<Include>`s.
    IndividualDataObjects,
    /// Over the signature value.
    Signature,
    /// Over the signature value and the validation references.
    SigAndRefs,
    /// Over the validation references only.
    RefsOnly,
    /// Over everything, for long-term archival.
    Archive,
}

/// Numeric code and element name of every type, in declaration order.
const TYPES: [(TimestampType, i32, &str); 6] = [
    (TimestampType::AllDataObjects, 1, "AllDataObjectsTimeStamp"),
    (TimestampType::IndividualDataObjects, 2, "IndividualDataObjectsTimeStamp"),
    (TimestampType::Signature, 3, "SignatureTimeStamp"),
    (TimestampType::SigAndRefs, 4, "SigAndRefsTimeStamp"),
    (TimestampType::RefsOnly, 5, "RefsOnlyTimeStamp"),
    (TimestampType::Archive, 6, "ArchiveTimeStamp"),
];

impl TimestampType {
    pub const ALL: [TimestampType; 6] = [
        Self::AllDataObjects,
        Self::IndividualDataObjects,
        Self::Signature,
        Self::SigAndRefs,
        Self::RefsOnly,
        Self::Archive,
    ];

    fn entry(&self) -> (TimestampType, i32, &'static str) {
        TYPES[*self as usize]
    }

    /// Numeric code, 1 through 6.
    pub fn code(&self) -> i32 {
        self.entry().1
    }

    /// Element name this type serializes to.
    pub fn tag(&self) -> &'static str {
        self.entry().2
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        TYPES.iter().find(|(_, _, t)| *t == tag).map(|(ty, _, _)| *ty)
    }

    /// Whether the timestamp lists the objects it covers with `<Include>`s.
    pub fn uses_includes(&self) -> bool {
        matches!(self, Self::IndividualDataObjects)
    }
}

impl TryFrom<i32> for TimestampType {
    type Error = ValidationError;

    fn try_from(code: i32) -> Result<Self, ValidationError> {
        TYPES
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(ty, _, _)| *ty)
            .ok_or(ValidationError::TimestampType(code))
    }
}

impl fmt::Display for TimestampType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug)]
pub struct TimestampInfo {
    id: String,
    kind: TimestampType,
    signature_id: Option<String>,
    includes: Vec<IncludeInfo>,
    token: Option<Box<dyn TimeStampToken>>,
    hash: Option<Vec<u8>>,
}

impl TimestampInfo {
    /// Create a timestamp with the given id and numeric type code.
    pub fn new(id: impl Into<String>, type_code: i32) -> Result<Self, Error> {
        let id = id.into();
        check_id(&id)?;
        let kind = TimestampType::try_from(type_code)?;
        Ok(Self::unchecked(id, kind))
    }

    /// Create a timestamp of a known type.
    pub fn of_type(id: impl Into<String>, kind: TimestampType) -> Result<Self, Error> {
        let id = id.into();
        check_id(&id)?;
        Ok(Self::unchecked(id, kind))
    }

    fn unchecked(id: String, kind: TimestampType) -> Self {
        Self {
            id,
            kind,
            signature_id: None,
            includes: Vec::new(),
            token: None,
            hash: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp_type(&self) -> TimestampType {
        self.kind
    }

    /// Id of the signature this timestamp belongs to.
    pub fn signature_id(&self) -> Option<&str> {
        self.signature_id.as_deref()
    }

    pub fn set_signature_id(&mut self, id: impl Into<String>) {
        self.signature_id = Some(id.into());
    }

    // ── Includes ─────────────────────────────────────────────────────

    pub fn add_include_info(&mut self, include: IncludeInfo) {
        self.includes.push(include);
    }

    pub fn count_include_infos(&self) -> usize {
        self.includes.len()
    }

    pub fn include_info(&self, idx: usize) -> Option<&IncludeInfo> {
        self.includes.get(idx)
    }

    pub fn last_include_info(&self) -> Option<&IncludeInfo> {
        self.includes.last()
    }

    pub fn include_infos(&self) -> &[IncludeInfo] {
        &self.includes
    }

    // ── Token ────────────────────────────────────────────────────────

    /// Attach the TSA's token. A token without an encoding is rejected.
    pub fn attach_token(&mut self, token: Box<dyn TimeStampToken>) -> Result<(), Error> {
        if token.encoded().is_empty() {
            return Err(ValidationError::TimestampToken.into());
        }
        if self.token.is_some() {
            log::warn!("replacing the token of timestamp {}", self.id);
        }
        self.token = Some(token);
        Ok(())
    }

    pub fn token(&self) -> Option<&dyn TimeStampToken> {
        self.token.as_deref()
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.token.as_ref().map(|t| t.gen_time())
    }

    pub fn nonce(&self) -> Option<&[u8]> {
        self.token.as_ref().and_then(|t| t.nonce())
    }

    pub fn serial_number(&self) -> Option<&[u8]> {
        self.token.as_ref().map(|t| t.serial_number())
    }

    pub fn policy(&self) -> Option<&str> {
        self.token.as_ref().and_then(|t| t.policy())
    }

    /// `false` when no token is attached.
    pub fn is_ordered(&self) -> bool {
        self.token.as_ref().is_some_and(|t| t.is_ordered())
    }

    pub fn message_imprint(&self) -> Option<&[u8]> {
        self.token.as_ref().map(|t| t.message_imprint())
    }

    pub fn algorithm_oid(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.algorithm_oid())
    }

    // ── Covered data hash ────────────────────────────────────────────

    pub fn hash(&self) -> Option<&[u8]> {
        self.hash.as_deref()
    }

    pub fn set_hash(&mut self, hash: Vec<u8>) {
        self.hash = Some(hash);
    }

    /// SHA-1 over the canonical form of the XML this timestamp covers,
    /// stored as the hash to check the token against.
    pub fn calculate_hash(
        &mut self,
        covered_xml: &[u8],
        c14n: &dyn CanonicalizationService,
    ) -> Result<&[u8], Error> {
        let canonical = c14n.canonicalize(covered_xml, algorithm::C14N)?;
        let hash = ddoc_crypto::sha1(&canonical).to_vec();
        log::debug!(
            "{} {} covers {} canonical bytes",
            self.kind,
            self.id,
            canonical.len()
        );
        let stored = self.hash.insert(hash);
        Ok(stored.as_slice())
    }

    /// Compare the computed hash with the token's message imprint.
    pub fn verify_token(&self) -> Result<(), TokenError> {
        let token = self.token.as_ref().ok_or(TokenError::Missing)?;
        let hash = self.hash.as_ref().ok_or(TokenError::HashNotComputed)?;
        if token.algorithm_oid() != oid::SHA1 {
            return Err(TokenError::AlgorithmMismatch {
                expected: oid::SHA1.to_owned(),
                actual: token.algorithm_oid().to_owned(),
            });
        }
        if token.message_imprint() != hash.as_slice() {
            return Err(TokenError::ImprintMismatch);
        }
        Ok(())
    }

    /// Field errors of the timestamp and its includes. The token itself is
    /// checked by [`verify_token`](Self::verify_token).
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errs: Vec<ValidationError> = check_id(&self.id).err().into_iter().collect();
        errs.extend(self.includes.iter().flat_map(IncludeInfo::validate));
        errs
    }

    // ── XML ──────────────────────────────────────────────────────────

    /// Serialize. Without a token `EncapsulatedTimeStamp` is empty, which
    /// readers treat as no timestamp at all.
    pub fn to_xml(&self) -> String {
        let tag = self.kind.tag();
        let mut out = format!("<{tag} Id=\"{}\">", escape_attr(&self.id));
        for include in &self.includes {
            out.push_str(&include.to_xml());
        }
        out.push_str("<EncapsulatedTimeStamp>");
        if let Some(token) = &self.token {
            out.push_str(&encoding::encode_wrapped(
                token.encoded(),
                encoding::WRAP_COLUMNS,
            ));
        }
        out.push_str("</EncapsulatedTimeStamp>");
        out.push_str(&format!("</{tag}>"));
        out
    }

    /// Read the first timestamp element in `xml`, handing the encapsulated
    /// token to `decoder`.
    pub fn from_xml(xml: &str, decoder: &dyn TimeStampTokenDecoder) -> Result<Self, Error> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e: roxmltree::Error| Error::XmlParse(e.to_string()))?;
        let element = doc
            .descendants()
            .find(|n| n.is_element() && TimestampType::from_tag(n.tag_name().name()).is_some())
            .ok_or_else(|| Error::MissingElement("timestamp element".into()))?;
        Self::from_node(element, decoder)
    }

    /// Read a parsed timestamp element. The id is taken as found.
    pub fn from_node(
        element: roxmltree::Node<'_, '_>,
        decoder: &dyn TimeStampTokenDecoder,
    ) -> Result<Self, Error> {
        let tag = element.tag_name().name();
        let kind = TimestampType::from_tag(tag)
            .ok_or_else(|| Error::XmlStructure(format!("not a timestamp element: {tag}")))?;
        let mut ts = Self::unchecked(
            element.attribute(attr::ID).unwrap_or("").to_owned(),
            kind,
        );

        for child in element.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                node::INCLUDE => ts.add_include_info(IncludeInfo::unchecked(
                    child.attribute(attr::URI).unwrap_or("").to_owned(),
                    child.attribute(attr::REFERENCED_DATA) == Some("true"),
                )),
                node::ENCAPSULATED_TIMESTAMP => {
                    let der = encoding::decode(child.text().unwrap_or(""))?;
                    if !der.is_empty() {
                        ts.attach_token(decoder.decode(&der)?)?;
                    }
                }
                _ => {}
            }
        }
        Ok(ts)
    }
}

impl fmt::Display for TimestampInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

fn check_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::TimestampId);
    }
    Ok(())
}
