#![forbid(unsafe_code)]

//! The signed items a [`Reference`](crate::Reference) can point at.

use ddoc_c14n::CanonicalizationService;
use ddoc_core::{algorithm, Error};
use std::path::Path;

/// How a data file's content is carried by the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// Content lives outside the document; only its digest is signed.
    Detached,
    /// Content is embedded as XML.
    Embedded,
    /// Content is embedded base64 encoded.
    EmbeddedBase64,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detached => "DETATCHED",
            Self::Embedded => "EMBEDDED",
            Self::EmbeddedBase64 => "EMBEDDED_BASE64",
        }
    }
}

/// A signed content item and its precomputed digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    pub id: String,
    /// File name as given by the caller, possibly with directories.
    pub file_name: String,
    /// Path inside a BDOC container, when known.
    pub full_name: Option<String>,
    pub content_type: ContentType,
    /// SHA-1 digest of the content.
    pub digest: Vec<u8>,
}

impl DataFile {
    pub fn new(
        id: impl Into<String>,
        file_name: impl Into<String>,
        content_type: ContentType,
        digest: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            full_name: None,
            content_type,
            digest,
        }
    }

    /// Build a data file from its content, digesting it with SHA-1.
    pub fn from_content(
        id: impl Into<String>,
        file_name: impl Into<String>,
        content_type: ContentType,
        content: &[u8],
    ) -> Self {
        Self::new(id, file_name, content_type, ddoc_crypto::sha1(content).to_vec())
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Name under which a BDOC container references this file: the full
    /// name if set, otherwise the last path component of the file name.
    pub fn container_name(&self) -> String {
        match &self.full_name {
            Some(full) if !full.is_empty() => full.clone(),
            _ => Path::new(&self.file_name)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.file_name.clone()),
        }
    }

    pub fn is_detached(&self) -> bool {
        self.content_type == ContentType::Detached
    }
}

/// The SignedProperties block of a signature, as seen by its reference.
pub trait SignedProperties {
    /// Value of the block's `Id` attribute.
    fn id(&self) -> &str;
    /// Fragment identifying the owning signature, e.g. `#S0`.
    fn target(&self) -> &str;
    /// SHA-1 over the canonical form of the block.
    fn calculate_digest(&self, c14n: &dyn CanonicalizationService) -> Result<Vec<u8>, Error>;
}

/// A SignedProperties block kept as its serialized XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPropertiesXml {
    id: String,
    target: String,
    xml: String,
}

impl SignedPropertiesXml {
    pub fn new(id: impl Into<String>, target: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            xml: xml.into(),
        }
    }

    /// Extract the first `SignedProperties` element from `xml`.
    ///
    /// `Target` is taken from the element itself or, as in XAdES, from the
    /// enclosing `QualifyingProperties`.
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let doc = crate::xml::parse(xml)?;
        let node = doc
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "SignedProperties")
            .ok_or_else(|| Error::MissingElement("SignedProperties".into()))?;
        let id = node
            .attribute("Id")
            .ok_or_else(|| Error::MissingAttribute("SignedProperties/@Id".into()))?;
        let target = node
            .attribute("Target")
            .or_else(|| node.parent().and_then(|p| p.attribute("Target")))
            .ok_or_else(|| Error::MissingAttribute("Target".into()))?;
        Ok(Self::new(
            id,
            target,
            crate::xml::standalone_fragment(node, xml),
        ))
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }
}

impl SignedProperties for SignedPropertiesXml {
    fn id(&self) -> &str {
        &self.id
    }

    fn target(&self) -> &str {
        &self.target
    }

    fn calculate_digest(&self, c14n: &dyn CanonicalizationService) -> Result<Vec<u8>, Error> {
        let canonical = c14n.canonicalize(self.xml.as_bytes(), algorithm::C14N)?;
        ddoc_crypto::digest::digest(algorithm::SHA1, &canonical)
    }
}
