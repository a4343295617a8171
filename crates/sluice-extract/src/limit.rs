//! Body size limits.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default limit for JSON bodies (1 MB).
pub const DEFAULT_JSON_LIMIT: usize = 1024 * 1024;

/// Default limit for url-encoded bodies (56 KB).
pub const DEFAULT_FORM_LIMIT: usize = 56 * 1024;

/// Default limit for XML bodies (1 MB).
pub const DEFAULT_XML_LIMIT: usize = 1024 * 1024;

/// A byte count written as an integer or a human string.
///
/// Units are binary: `1kb` is 1024 bytes.
///
/// ```rust
/// use sluice_extract::ByteSize;
///
/// assert_eq!("64kb".parse::<ByteSize>().unwrap().bytes(), 64 * 1024);
/// assert_eq!("1.5mb".parse::<ByteSize>().unwrap().bytes(), 1536 * 1024);
/// assert_eq!("512".parse::<ByteSize>().unwrap().bytes(), 512);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ByteSize(usize);

impl ByteSize {
    /// Wraps a byte count.
    #[must_use]
    pub const fn new(bytes: usize) -> Self {
        Self(bytes)
    }

    /// The byte count.
    #[must_use]
    pub const fn bytes(&self) -> usize {
        self.0
    }
}

impl From<usize> for ByteSize {
    fn from(bytes: usize) -> Self {
        Self(bytes)
    }
}

/// A size string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseByteSizeError(String);

impl fmt::Display for ParseByteSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid byte size `{}`", self.0)
    }
}

impl std::error::Error for ParseByteSizeError {}

impl FromStr for ByteSize {
    type Err = ParseByteSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_lowercase();
        let split = input
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(input.len());
        let (number, unit) = input.split_at(split);

        let multiplier: u64 = match unit.trim() {
            "" | "b" => 1,
            "kb" => 1 << 10,
            "mb" => 1 << 20,
            "gb" => 1 << 30,
            "tb" => 1 << 40,
            _ => return Err(ParseByteSizeError(s.to_string())),
        };

        let number: f64 = number
            .parse()
            .map_err(|_| ParseByteSizeError(s.to_string()))?;
        if !number.is_finite() || number < 0.0 {
            return Err(ParseByteSizeError(s.to_string()));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bytes = (number * multiplier as f64).floor() as usize;
        Ok(Self(bytes))
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bytes(usize),
            Human(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bytes(bytes) => Ok(Self(bytes)),
            Raw::Human(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!("1kb".parse::<ByteSize>().unwrap().bytes(), 1024);
        assert_eq!("1MB".parse::<ByteSize>().unwrap().bytes(), 1024 * 1024);
        assert_eq!(" 2 gb ".parse::<ByteSize>().unwrap().bytes(), 2 << 30);
        assert_eq!("10b".parse::<ByteSize>().unwrap().bytes(), 10);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("ten".parse::<ByteSize>().is_err());
        assert!("5pb".parse::<ByteSize>().is_err());
        assert!("".parse::<ByteSize>().is_err());
    }

    #[test]
    fn test_deserialize_both_forms() {
        let n: ByteSize = serde_json::from_str("2048").unwrap();
        assert_eq!(n.bytes(), 2048);
        let s: ByteSize = serde_json::from_str("\"64kb\"").unwrap();
        assert_eq!(s.bytes(), 65536);
        assert!(serde_json::from_str::<ByteSize>("\"lots\"").is_err());
    }
}
