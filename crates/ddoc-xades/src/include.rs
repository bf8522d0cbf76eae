#![forbid(unsafe_code)]

//! `<Include>`: one data object covered by a timestamp.

use ddoc_c14n::escape::escape_attr;
use ddoc_core::{Error, ValidationError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeInfo {
    uri: String,
    referenced_data: bool,
}

impl IncludeInfo {
    pub fn new(uri: impl Into<String>) -> Result<Self, Error> {
        let uri = uri.into();
        if uri.is_empty() {
            return Err(ValidationError::IncludeUri.into());
        }
        Ok(Self {
            uri,
            referenced_data: false,
        })
    }

    /// Mark the include as covering the referenced data rather than the
    /// reference element.
    pub fn with_referenced_data(mut self, referenced_data: bool) -> Self {
        self.referenced_data = referenced_data;
        self
    }

    pub(crate) fn unchecked(uri: String, referenced_data: bool) -> Self {
        Self {
            uri,
            referenced_data,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn referenced_data(&self) -> bool {
        self.referenced_data
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        if self.uri.is_empty() {
            vec![ValidationError::IncludeUri]
        } else {
            Vec::new()
        }
    }

    pub fn to_xml(&self) -> String {
        let mut out = format!("<Include URI=\"{}\"", escape_attr(&self.uri));
        if self.referenced_data {
            out.push_str(" referencedData=\"true\"");
        }
        out.push_str("></Include>");
        out
    }
}

impl fmt::Display for IncludeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_xml() {
        let inc = IncludeInfo::new("#D0").unwrap();
        assert_eq!(inc.to_xml(), "<Include URI=\"#D0\"></Include>");
        let inc = inc.with_referenced_data(true);
        assert_eq!(
            inc.to_string(),
            "<Include URI=\"#D0\" referencedData=\"true\"></Include>"
        );
    }

    #[test]
    fn test_uri_is_escaped() {
        let inc = IncludeInfo::new("#R&D\"1\"").unwrap();
        assert_eq!(
            inc.to_xml(),
            "<Include URI=\"#R&amp;D&quot;1&quot;\"></Include>"
        );
    }

    #[test]
    fn test_empty_uri() {
        assert!(matches!(
            IncludeInfo::new(""),
            Err(Error::Validation(ValidationError::IncludeUri))
        ));
        assert_eq!(
            IncludeInfo::unchecked(String::new(), false).validate(),
            vec![ValidationError::IncludeUri]
        );
    }
}
