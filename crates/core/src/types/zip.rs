//! US ZIP code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ZipCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ZipCodeError {
    /// The input string is empty.
    #[error("ZIP code cannot be empty")]
    Empty,
    /// The input is not `12345` or `12345-6789`.
    #[error("ZIP code must be 5 digits or ZIP+4 (12345-6789)")]
    InvalidFormat,
}

/// A five-digit US ZIP code with an optional `+4` suffix.
///
/// ```
/// use glasshouse_core::ZipCode;
///
/// let zip = ZipCode::parse("11201-1234").unwrap();
/// assert_eq!(zip.five_digit(), "11201");
/// assert_eq!(zip.numeric(), 11201);
///
/// assert!(ZipCode::parse("1120").is_err());
/// assert!(ZipCode::parse("11201 1234").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZipCode(String);

impl ZipCode {
    /// Parse a ZIP code, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or does not match
    /// `^\d{5}(-\d{4})?$`.
    pub fn parse(s: &str) -> Result<Self, ZipCodeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ZipCodeError::Empty);
        }

        let (base, plus_four) = match s.split_once('-') {
            Some((base, ext)) => (base, Some(ext)),
            None => (s, None),
        };

        let all_digits = |part: &str, len: usize| {
            part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
        };

        if !all_digits(base, 5) || plus_four.is_some_and(|ext| !all_digits(ext, 4)) {
            return Err(ZipCodeError::InvalidFormat);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns true if `s` is a well-formed ZIP code.
    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// The leading five digits.
    #[must_use]
    pub fn five_digit(&self) -> &str {
        self.0.get(..5).unwrap_or(&self.0)
    }

    /// Numeric value of the five-digit part (`07030` is `7030`).
    #[must_use]
    pub fn numeric(&self) -> u32 {
        self.five_digit().parse().unwrap_or(0)
    }

    /// Returns the ZIP code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ZipCode {
    type Err = ZipCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ZipCode {
    type Error = ZipCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ZipCode> for String {
    fn from(zip: ZipCode) -> Self {
        zip.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_five_digit() {
        let zip = ZipCode::parse("10001").unwrap();
        assert_eq!(zip.five_digit(), "10001");
        assert_eq!(zip.numeric(), 10001);
    }

    #[test]
    fn test_parse_zip_plus_four() {
        let zip = ZipCode::parse(" 07030-5991 ").unwrap();
        assert_eq!(zip.as_str(), "07030-5991");
        assert_eq!(zip.five_digit(), "07030");
        assert_eq!(zip.numeric(), 7030);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(ZipCode::parse(""), Err(ZipCodeError::Empty));
        for bad in ["1234", "123456", "1234a", "12345-", "12345-123", "12345-12345", "abcde"] {
            assert_eq!(ZipCode::parse(bad), Err(ZipCodeError::InvalidFormat), "{bad}");
        }
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<ZipCode>("\"11201\"").is_ok());
        assert!(serde_json::from_str::<ZipCode>("\"nope\"").is_err());
    }
}
