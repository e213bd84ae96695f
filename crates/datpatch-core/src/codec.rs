//! Fixed-width text codec for record fields.
//!
//! A field is stored as `char_length` characters of a fixed-width encoding:
//! either a single-byte character set (one byte per character) or UTF-16
//! (two bytes per character, big- or little-endian). Decoding is lossy: any
//! malformed sequence becomes U+FFFD so classification and logging always
//! have a string to work with.

use crate::error::{Error, Result};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use std::fmt;

/// A fixed-width character encoding used for field bytes
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FieldEncoding {
    encoding: &'static Encoding,
}

/// Result of decoding a field span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The decoded text, with U+FFFD in place of malformed sequences
    pub text: String,
    /// True if at least one malformed sequence was replaced
    pub malformed: bool,
}

impl FieldEncoding {
    /// Single-byte ASCII-compatible text (windows-1252 superset of ASCII)
    pub fn ascii() -> Self {
        Self {
            encoding: encoding_rs::WINDOWS_1252,
        }
    }

    /// Two bytes per character, most significant byte first
    pub fn utf16_be() -> Self {
        Self { encoding: UTF_16BE }
    }

    /// Two bytes per character, least significant byte first
    pub fn utf16_le() -> Self {
        Self { encoding: UTF_16LE }
    }

    /// Resolves an encoding label.
    ///
    /// Accepts every WHATWG label known to `encoding_rs` plus the aliases
    /// `BigEndianUnicode` and `Unicode`. Variable-width encodings such as
    /// UTF-8 or GBK are rejected because field spans are sized in characters.
    pub fn for_label(label: &str) -> Result<Self> {
        let trimmed = label.trim();

        let normalized = if trimmed.eq_ignore_ascii_case("BigEndianUnicode") {
            "UTF-16BE"
        } else if trimmed.eq_ignore_ascii_case("Unicode") {
            "UTF-16LE"
        } else {
            trimmed
        };

        let encoding = Encoding::for_label(normalized.as_bytes())
            .ok_or_else(|| Error::unsupported_encoding(trimmed, "unknown encoding label"))?;

        if encoding == UTF_16BE || encoding == UTF_16LE || encoding.is_single_byte() {
            Ok(Self { encoding })
        } else {
            Err(Error::unsupported_encoding(
                trimmed,
                "not a fixed-width encoding",
            ))
        }
    }

    /// Bytes consumed per character (1 or 2)
    pub fn width(&self) -> usize {
        if self.is_utf16() {
            2
        } else {
            1
        }
    }

    /// Canonical name of the underlying encoding
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    fn is_utf16(&self) -> bool {
        self.encoding == UTF_16BE || self.encoding == UTF_16LE
    }

    /// Decodes a field span, replacing malformed sequences.
    pub fn decode(&self, bytes: &[u8]) -> Decoded {
        let (text, malformed) = self.encoding.decode_without_bom_handling(bytes);
        Decoded {
            text: text.into_owned(),
            malformed,
        }
    }

    /// Encodes `text` into exactly `byte_length` bytes.
    ///
    /// Returns `None` when the text cannot be represented in exactly that
    /// many bytes: characters outside the single-byte repertoire, or
    /// characters needing a UTF-16 surrogate pair, or a plain length
    /// difference.
    pub fn encode(&self, text: &str, byte_length: usize) -> Option<Vec<u8>> {
        let bytes: Vec<u8> = if self.encoding == UTF_16BE {
            text.encode_utf16().flat_map(u16::to_be_bytes).collect()
        } else if self.encoding == UTF_16LE {
            text.encode_utf16().flat_map(u16::to_le_bytes).collect()
        } else {
            let (bytes, _, had_errors) = self.encoding.encode(text);
            if had_errors {
                return None;
            }
            bytes.into_owned()
        };

        (bytes.len() == byte_length).then_some(bytes)
    }
}

impl Default for FieldEncoding {
    fn default() -> Self {
        Self::ascii()
    }
}

impl fmt::Debug for FieldEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldEncoding").field(&self.name()).finish()
    }
}

impl fmt::Display for FieldEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_resolution() {
        assert_eq!(FieldEncoding::for_label("ascii").unwrap(), FieldEncoding::ascii());
        assert_eq!(FieldEncoding::for_label("utf-16be").unwrap(), FieldEncoding::utf16_be());
        assert_eq!(
            FieldEncoding::for_label("BigEndianUnicode").unwrap(),
            FieldEncoding::utf16_be()
        );
        assert_eq!(FieldEncoding::for_label(" unicode ").unwrap(), FieldEncoding::utf16_le());
        assert_eq!(FieldEncoding::for_label("latin1").unwrap().width(), 1);
    }

    #[test]
    fn test_rejects_variable_width() {
        assert!(FieldEncoding::for_label("utf-8").is_err());
        assert!(FieldEncoding::for_label("gbk").is_err());
        assert!(FieldEncoding::for_label("no-such-charset").is_err());
    }

    #[test]
    fn test_single_byte() {
        let enc = FieldEncoding::ascii();
        assert_eq!(enc.width(), 1);
        let decoded = enc.decode(b"1381234567");
        assert_eq!(decoded.text, "1381234567");
        assert!(!decoded.malformed);
        assert_eq!(enc.encode("1381112222", 10).unwrap(), b"1381112222");
    }

    #[test]
    fn test_utf16_be_width() {
        let enc = FieldEncoding::utf16_be();
        let bytes = enc.encode("1381234567", 20).unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[..4], &[0x00, b'1', 0x00, b'3']);
        assert_eq!(enc.decode(&bytes).text, "1381234567");
    }

    #[test]
    fn test_utf16_le_byte_order() {
        let bytes = FieldEncoding::utf16_le().encode("12", 4).unwrap();
        assert_eq!(bytes, vec![b'1', 0x00, b'2', 0x00]);
    }

    #[test]
    fn test_malformed_utf16_is_replaced() {
        // lone high surrogate followed by an ASCII digit
        let decoded = FieldEncoding::utf16_be().decode(&[0xD8, 0x00, 0x00, b'1']);
        assert!(decoded.malformed);
        assert_eq!(decoded.text, "\u{FFFD}1");
    }

    #[test]
    fn test_encode_rejects_wrong_width() {
        assert!(FieldEncoding::ascii().encode("123", 4).is_none());
        assert!(FieldEncoding::ascii().encode("12\u{4E2D}", 3).is_none());
        // U+1F4DE needs a surrogate pair: 4 bytes for one character
        assert!(FieldEncoding::utf16_be().encode("\u{1F4DE}", 2).is_none());
    }
}
