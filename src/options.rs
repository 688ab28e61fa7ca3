//! Configuration options for loading and saving.
//!
//! This module provides the small enumerated policies a [`Loader`](crate::Loader)
//! is built with:
//!
//! - [`IntegerOverflow`]: what happens to integers wider than 64 bits
//! - [`Charset`]: how source and sink bytes are decoded and encoded
//! - [`HeaderMode`]: how the leading `#` comment block of a file is handled
//!
//! ## Examples
//!
//! ```rust
//! use toml_node::{Charset, HeaderMode, IntegerOverflow, Loader};
//!
//! let loader = Loader::builder()
//!     .charset(Charset::Utf8)
//!     .integer_overflow(IntegerOverflow::Promote)
//!     .header_mode(HeaderMode::Preset)
//!     .header("Generated file, do not edit")
//!     .build();
//! assert_eq!(loader.config().integer_overflow, IntegerOverflow::Promote);
//! ```

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Policy for integers outside the 64-bit signed range.
///
/// TOML integers are 64-bit, and node integers are `i64`. A document produced by
/// another engine may still carry wider literals, and a node tree may hold
/// [`Scalar::BigInteger`](crate::Scalar::BigInteger) values.
///
/// | Policy | Load (document → node) | Save (node → document) |
/// |---|---|---|
/// | `Fail` | `RangeOverflow` error | `UnrepresentableValue` error |
/// | `Promote` | kept as a big integer scalar | `UnrepresentableValue` error |
/// | `Saturate` | clamped to `i64::MIN` / `i64::MAX` | clamped to `i64::MIN` / `i64::MAX` |
///
/// # Examples
///
/// ```rust
/// use toml_node::IntegerOverflow;
///
/// assert_eq!(IntegerOverflow::default(), IntegerOverflow::Fail);
/// assert!(IntegerOverflow::Fail.is_strict());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IntegerOverflow {
    #[default]
    Fail,
    Promote,
    Saturate,
}

impl IntegerOverflow {
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        matches!(self, IntegerOverflow::Fail)
    }
}

/// Character set of the underlying source and sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Charset {
    /// UTF-8; a leading byte order mark is skipped on read.
    #[default]
    Utf8,
    /// ISO-8859-1; every byte is one code point.
    Latin1,
}

impl Charset {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Latin1 => "ISO-8859-1",
        }
    }

    /// Decodes raw bytes into text.
    ///
    /// # Errors
    ///
    /// Returns the byte offset of the first invalid sequence for UTF-8 input.
    pub fn decode(&self, bytes: Vec<u8>) -> std::result::Result<String, usize> {
        match self {
            Charset::Utf8 => {
                let bytes = if bytes.starts_with(UTF8_BOM) {
                    bytes[UTF8_BOM.len()..].to_vec()
                } else {
                    bytes
                };
                String::from_utf8(bytes).map_err(|e| e.utf8_error().valid_up_to())
            }
            Charset::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    /// Encodes text into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns the first character the charset cannot represent.
    pub fn encode(&self, text: &str) -> std::result::Result<Vec<u8>, char> {
        match self {
            Charset::Utf8 => Ok(text.as_bytes().to_vec()),
            Charset::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| c))
                .collect(),
        }
    }
}

/// Handling of the comment block at the top of a file.
///
/// # Examples
///
/// ```rust
/// use toml_node::HeaderMode;
///
/// assert_eq!(HeaderMode::default(), HeaderMode::Preserve);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// Read the header into the root comment; write the root comment back,
    /// falling back to the configured header.
    #[default]
    Preserve,
    /// Ignore the header on read; always write the configured header.
    Preset,
    /// Never read or write a header.
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_strips_bom() {
        let text = Charset::Utf8
            .decode(b"\xEF\xBB\xBFtitle = 1".to_vec())
            .unwrap();
        assert_eq!(text, "title = 1");
    }

    #[test]
    fn test_utf8_reports_invalid_offset() {
        assert_eq!(Charset::Utf8.decode(b"ab\xFF".to_vec()), Err(2));
    }

    #[test]
    fn test_latin1_roundtrip_and_unencodable() {
        let text = Charset::Latin1.decode(vec![0x63, 0x61, 0x66, 0xE9]).unwrap();
        assert_eq!(text, "café");
        assert_eq!(
            Charset::Latin1.encode("café").unwrap(),
            vec![0x63, 0x61, 0x66, 0xE9]
        );
        assert_eq!(Charset::Latin1.encode("中国"), Err('中'));
    }
}
