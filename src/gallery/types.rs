// value types shared by the gallery core and its callers

use base64::prelude::*;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::error::GalleryError;
use crate::utils::media::MediaKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid dimensions: {0:?}")]
pub struct InvalidDimensions(pub String);

/// requested thumbnail bounding box, written `WIDTHxHEIGHT` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThumbnailSpec {
    pub width: u32,
    pub height: u32,
}

impl FromStr for ThumbnailSpec {
    type Err = InvalidDimensions;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDimensions(s.to_string());

        let (width, height) = s.split_once('x').ok_or_else(invalid)?;
        let width = parse_dimension(width).ok_or_else(invalid)?;
        let height = parse_dimension(height).ok_or_else(invalid)?;

        Ok(Self { width, height })
    }
}

// digits only: no sign, no whitespace, no fraction, no zero
fn parse_dimension(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok().filter(|v| *v > 0)
}

impl fmt::Display for ThumbnailSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// parsed `num_results` argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// absent, empty or zero: keep everything
    All,
    Take(usize),
    /// present but not an exact non-negative integer: keep nothing
    Invalid,
}

impl Limit {
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = match raw {
            None | Some("") => return Limit::All,
            Some(raw) => raw,
        };

        let (negative, digits) = match raw.strip_prefix('-') {
            Some(digits) => (true, digits),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Limit::Invalid;
        }

        // digits only, so overflow is the one way parsing can fail
        let count = digits.parse::<usize>().unwrap_or(usize::MAX);
        match (negative, count) {
            (_, 0) => Limit::All,
            (true, _) => Limit::Invalid,
            (false, count) => Limit::Take(count),
        }
    }
}

/// encoded bytes plus the content type to serve them with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBuffer {
    pub bytes: Bytes,
    pub content_type: String,
}

impl MediaBuffer {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            BASE64_STANDARD.encode(&self.bytes)
        )
    }
}

/// per-file metadata reported by the codec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub kind: MediaKind,
    pub content_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumEntry {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailTag {
    pub base64tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

/// caller-facing result: `{"result": ...}` or `{"error": {"code", "message"}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope<T> {
    Result(T),
    Error(ErrorBody),
}

impl<T> Envelope<T> {
    pub fn from_error(err: &GalleryError) -> Self {
        Envelope::Error(ErrorBody {
            code: err.status_code().as_u16(),
            message: err.to_string(),
        })
    }
}

impl<T> From<Result<T, GalleryError>> for Envelope<T> {
    fn from(result: Result<T, GalleryError>) -> Self {
        match result {
            Ok(value) => Envelope::Result(value),
            Err(err) => Envelope::from_error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_spec_parsing() {
        let spec: ThumbnailSpec = "200x150".parse().unwrap();
        assert_eq!(spec, ThumbnailSpec { width: 200, height: 150 });
        assert_eq!(spec.to_string(), "200x150");

        for bad in [
            "", "200", "300x", "x150", "200xabc", "abcxdef", "200.5x150", "-200x150", "+200x150",
            " 200x150", "200x150 ", "0x150", "200x0", "200x150x10", "99999999999x1",
        ] {
            assert!(bad.parse::<ThumbnailSpec>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_limit_parsing() {
        assert_eq!(Limit::parse(None), Limit::All);
        assert_eq!(Limit::parse(Some("")), Limit::All);
        assert_eq!(Limit::parse(Some("0")), Limit::All);
        assert_eq!(Limit::parse(Some("10")), Limit::Take(10));
        assert_eq!(Limit::parse(Some("-1")), Limit::Invalid);
        assert_eq!(Limit::parse(Some("abc")), Limit::Invalid);
        assert_eq!(Limit::parse(Some("1.5")), Limit::Invalid);
        assert_eq!(Limit::parse(Some(" 3")), Limit::Invalid);
        assert_eq!(Limit::parse(Some("+5")), Limit::Take(5));
        assert_eq!(Limit::parse(Some("-0")), Limit::All);
        assert_eq!(Limit::parse(Some("+")), Limit::Invalid);
        assert_eq!(Limit::parse(Some("-+5")), Limit::Invalid);
    }

    #[test]
    fn test_huge_limit_saturates_instead_of_failing() {
        assert_eq!(
            Limit::parse(Some("99999999999999999999")),
            Limit::Take(usize::MAX)
        );
        assert_eq!(
            Limit::parse(Some("-99999999999999999999")),
            Limit::Invalid
        );
    }

    #[test]
    fn test_data_uri_encoding() {
        let buffer = MediaBuffer::new(&b"abc"[..], "image/jpeg");
        assert_eq!(buffer.to_data_uri(), "data:image/jpeg;base64,YWJj");
    }

    #[test]
    fn test_envelope_shape() {
        let ok: Envelope<u32> = Ok(7).into();
        assert_eq!(serde_json::to_value(&ok).unwrap(), serde_json::json!({"result": 7}));

        let err: Envelope<u32> = Err(GalleryError::NoFilesFound).into();
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"error": {"code": 500, "message": "no files processed"}})
        );
    }
}
