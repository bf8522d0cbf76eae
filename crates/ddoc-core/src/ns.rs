#![forbid(unsafe_code)]

//! XML namespace, element and attribute name constants.

/// XML Digital Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// ETSI XAdES 1.1.1 namespace (DIGIDOC-XML 1.2/1.3)
pub const XADES_111: &str = "http://uri.etsi.org/01903/v1.1.1#";

/// ETSI XAdES 1.3.2 namespace (DIGIDOC-XML 1.4, BDOC)
pub const XADES_132: &str = "http://uri.etsi.org/01903/v1.3.2#";

/// XML namespace
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// Element local names.
pub mod node {
    pub const SIGNED_INFO: &str = "SignedInfo";
    pub const CANONICALIZATION_METHOD: &str = "CanonicalizationMethod";
    pub const SIGNATURE_METHOD: &str = "SignatureMethod";
    pub const REFERENCE: &str = "Reference";
    pub const TRANSFORMS: &str = "Transforms";
    pub const TRANSFORM: &str = "Transform";
    pub const DIGEST_METHOD: &str = "DigestMethod";
    pub const DIGEST_VALUE: &str = "DigestValue";

    pub const INCLUDE: &str = "Include";
    pub const ENCAPSULATED_TIMESTAMP: &str = "EncapsulatedTimeStamp";
}

/// Attribute names.
pub mod attr {
    pub const ID: &str = "Id";
    pub const URI: &str = "URI";
    pub const TYPE: &str = "Type";
    pub const ALGORITHM: &str = "Algorithm";
    pub const REFERENCED_DATA: &str = "referencedData";
}
