//! Field descriptors: where substitutable values live inside a record.

use crate::codec::FieldEncoding;
use crate::error::{Error, Result};
use std::ops::Range;

/// One named, fixed-width field inside a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Identifier used in the transcript
    pub name: String,
    /// 1-based byte offset where the field begins
    pub start_byte: usize,
    /// Number of characters the field holds
    pub char_length: usize,
    /// Encoding of the field's characters
    pub encoding: FieldEncoding,
}

impl FieldSpec {
    /// Creates a single-byte field
    pub fn new(name: impl Into<String>, start_byte: usize, char_length: usize) -> Self {
        Self {
            name: name.into(),
            start_byte,
            char_length,
            encoding: FieldEncoding::default(),
        }
    }

    /// Sets the field encoding
    pub fn encoding(mut self, encoding: FieldEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Bytes per character
    pub fn encoding_width(&self) -> usize {
        self.encoding.width()
    }

    /// Number of bytes the field occupies
    pub fn byte_length(&self) -> usize {
        self.char_length.saturating_mul(self.encoding_width())
    }

    /// 0-based byte range of the field inside a record
    pub fn span(&self) -> Range<usize> {
        let start = self.start_byte.saturating_sub(1);
        start..start.saturating_add(self.byte_length())
    }

    /// Like [`span`](Self::span), but `None` if the end offset overflows
    fn checked_span(&self) -> Option<Range<usize>> {
        let start = self.start_byte.checked_sub(1)?;
        let end = self
            .char_length
            .checked_mul(self.encoding_width())
            .and_then(|len| start.checked_add(len))?;
        Some(start..end)
    }

    fn validate(&self, record_size: usize) -> Result<()> {
        if self.start_byte < 2 {
            return Err(Error::invalid_field(
                &self.name,
                "start_byte must be at least 2 (byte 1 is the record marker)",
            ));
        }
        if self.char_length == 0 {
            return Err(Error::invalid_field(&self.name, "length must be positive"));
        }
        let span = self.checked_span().ok_or_else(|| {
            Error::invalid_field(
                &self.name,
                format!(
                    "{} characters starting at byte {} overflow the address space",
                    self.char_length, self.start_byte
                ),
            )
        })?;
        if span.end > record_size {
            return Err(Error::invalid_field(
                &self.name,
                format!(
                    "bytes {}..{} exceed the record size of {}",
                    span.start + 1,
                    span.end,
                    record_size
                ),
            ));
        }
        Ok(())
    }
}

/// Ordered, validated list of field descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<FieldSpec>,
}

impl FieldSet {
    /// Validates every field against the record size.
    ///
    /// Overlapping fields are allowed; they are applied in order.
    pub fn new(fields: Vec<FieldSpec>, record_size: usize) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::invalid_config("at least one field must be configured"));
        }
        for field in &fields {
            field.validate(record_size)?;
        }
        Ok(Self { fields })
    }

    /// The two phone fields of the classic layout: Phone-1 at byte 100 and
    /// Phone-2 at byte 200, ten characters each.
    pub fn phone_pair(encoding: FieldEncoding) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("Phone-1", 100, 10).encoding(encoding),
            FieldSpec::new("Phone-2", 200, 10).encoding(encoding),
        ]
    }

    /// Iterates fields in configured order
    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.fields.iter()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false for a validated set
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True if `offset` (0-based) falls inside any field span
    pub fn covers(&self, offset: usize) -> bool {
        self.fields.iter().any(|f| f.span().contains(&offset))
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_single_byte() {
        let field = FieldSpec::new("Phone-1", 100, 10);
        assert_eq!(field.span(), 99..109);
        assert_eq!(field.byte_length(), 10);
    }

    #[test]
    fn test_span_two_byte() {
        let field = FieldSpec::new("Phone-1", 100, 10).encoding(FieldEncoding::utf16_be());
        assert_eq!(field.encoding_width(), 2);
        assert_eq!(field.span(), 99..119);
    }

    #[test]
    fn test_field_set_validation() {
        assert!(FieldSet::new(vec![], 1300).is_err());
        assert!(FieldSet::new(vec![FieldSpec::new("marker", 1, 1)], 1300).is_err());
        assert!(FieldSet::new(vec![FieldSpec::new("empty", 10, 0)], 1300).is_err());
        assert!(FieldSet::new(vec![FieldSpec::new("tail", 1295, 10)], 1300).is_err());
        assert!(FieldSet::new(vec![FieldSpec::new("tail", 1291, 10)], 1300).is_ok());
    }

    #[test]
    fn test_oversized_length_is_rejected() {
        let huge =
            FieldSpec::new("Phone-1", 100, usize::MAX / 2).encoding(FieldEncoding::utf16_be());
        let err = FieldSet::new(vec![huge], 1300).unwrap_err();
        assert!(matches!(err, Error::InvalidField { .. }));

        let wide = FieldSpec::new("Phone-1", usize::MAX, 10);
        assert!(FieldSet::new(vec![wide], 1300).is_err());
    }

    #[test]
    fn test_covers() {
        let set = FieldSet::new(FieldSet::phone_pair(FieldEncoding::ascii()), 1300).unwrap();
        assert_eq!(set.len(), 2);
        assert!(!set.covers(0));
        assert!(set.covers(99));
        assert!(set.covers(108));
        assert!(!set.covers(109));
        assert!(set.covers(199));
    }
}
