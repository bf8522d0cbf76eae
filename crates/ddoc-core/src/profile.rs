#![forbid(unsafe_code)]

//! Document profile: container format plus format version.
//!
//! A handful of serialization rules depend on the profile of the document a
//! signature belongs to. The profile is a small `Copy` value, so entities
//! keep their own copy instead of pointing back at the owning document.

use crate::Error;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocFormat {
    /// DIGIDOC-XML: data files are embedded or detached and referenced by `#Id`.
    DigiDocXml,
    /// BDOC: data files live in a container and are referenced by path.
    Bdoc,
}

impl DocFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DigiDocXml => "DIGIDOC-XML",
            Self::Bdoc => "BDOC",
        }
    }
}

impl fmt::Display for DocFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DocFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_uppercase().as_str() {
            "DIGIDOC-XML" | "DIGIDOC" | "SK-XML" => Ok(Self::DigiDocXml),
            "BDOC" => Ok(Self::Bdoc),
            _ => Err(Error::Other(format!("unknown document format: {s}"))),
        }
    }
}

/// Format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocVersion {
    V1_0,
    V1_1,
    V1_2,
    V1_3,
    V1_4,
}

impl DocVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1_0 => "1.0",
            Self::V1_1 => "1.1",
            Self::V1_2 => "1.2",
            Self::V1_3 => "1.3",
            Self::V1_4 => "1.4",
        }
    }
}

impl fmt::Display for DocVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "1.0" => Ok(Self::V1_0),
            "1.1" => Ok(Self::V1_1),
            "1.2" => Ok(Self::V1_2),
            "1.3" => Ok(Self::V1_3),
            "1.4" => Ok(Self::V1_4),
            _ => Err(Error::Other(format!("unknown document version: {s}"))),
        }
    }
}

const DATE_FORMAT_LEGACY: &str = "%Y.%m.%dT%H:%M:%SZ";
const DATE_FORMAT_XADES: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format and version of the document that owns a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocProfile {
    pub format: DocFormat,
    pub version: DocVersion,
}

impl DocProfile {
    pub fn new(format: DocFormat, version: DocVersion) -> Self {
        Self { format, version }
    }

    pub fn digidoc(version: DocVersion) -> Self {
        Self::new(DocFormat::DigiDocXml, version)
    }

    pub fn bdoc() -> Self {
        Self::new(DocFormat::Bdoc, DocVersion::V1_0)
    }

    /// References point at container paths rather than `#Id` fragments.
    pub fn uses_direct_references(&self) -> bool {
        self.format == DocFormat::Bdoc
    }

    /// SignedProperties references carry the XAdES 1.1.1 `Type` attribute.
    pub fn writes_v111_signed_properties_type(&self) -> bool {
        matches!(self.version, DocVersion::V1_2 | DocVersion::V1_3)
    }

    fn date_format(&self) -> &'static str {
        if self.format == DocFormat::Bdoc
            || matches!(self.version, DocVersion::V1_3 | DocVersion::V1_4)
        {
            DATE_FORMAT_XADES
        } else {
            DATE_FORMAT_LEGACY
        }
    }

    /// Render a UTC time the way documents of this profile store it.
    pub fn format_date(&self, t: &DateTime<Utc>) -> String {
        t.format(self.date_format()).to_string()
    }

    /// Parse a time string written by [`format_date`](Self::format_date).
    pub fn parse_date(&self, s: &str) -> Result<DateTime<Utc>, Error> {
        NaiveDateTime::parse_from_str(s.trim(), self.date_format())
            .map(|n| n.and_utc())
            .map_err(|e| Error::Other(format!("invalid date {s:?}: {e}")))
    }
}

impl Default for DocProfile {
    fn default() -> Self {
        Self::digidoc(DocVersion::V1_3)
    }
}

impl fmt::Display for DocProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.format, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_and_version() {
        assert_eq!("bdoc".parse::<DocFormat>().unwrap(), DocFormat::Bdoc);
        assert_eq!(
            "DIGIDOC-XML".parse::<DocFormat>().unwrap(),
            DocFormat::DigiDocXml
        );
        assert!("pdf".parse::<DocFormat>().is_err());
        assert_eq!("1.3".parse::<DocVersion>().unwrap(), DocVersion::V1_3);
        assert!("2.0".parse::<DocVersion>().is_err());
    }

    #[test]
    fn test_signed_properties_type_versions() {
        assert!(DocProfile::digidoc(DocVersion::V1_2).writes_v111_signed_properties_type());
        assert!(DocProfile::digidoc(DocVersion::V1_3).writes_v111_signed_properties_type());
        assert!(!DocProfile::digidoc(DocVersion::V1_4).writes_v111_signed_properties_type());
        assert!(!DocProfile::bdoc().writes_v111_signed_properties_type());
    }

    #[test]
    fn test_date_formats() {
        let t = DateTime::from_timestamp(1_200_000_000, 0).unwrap();
        let legacy = DocProfile::digidoc(DocVersion::V1_1);
        let xades = DocProfile::bdoc();
        assert_eq!(legacy.format_date(&t), "2008.01.10T21:20:00Z");
        assert_eq!(xades.format_date(&t), "2008-01-10T21:20:00Z");
        assert_eq!(xades.parse_date("2008-01-10T21:20:00Z").unwrap(), t);
        assert!(legacy.parse_date("2008-01-10T21:20:00Z").is_err());
    }
}
