//! Field substitution for a single data record.
//!
//! Each configured field is decoded, looked up in the [`MappingTable`], and
//! overwritten in place only when the replacement has exactly the field's
//! character length and encodes to exactly the field's byte length. Bytes
//! outside replaced spans are never touched.

use crate::layout::{FieldSet, FieldSpec};
use crate::mapping::MappingTable;
use tracing::{trace, warn};

/// What happened to one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldResult {
    /// Field bytes were overwritten with the replacement
    Replaced {
        /// The value written
        value: String,
    },
    /// Decoded value is not a mapping key
    NoMatch,
    /// Mapping exists but the replacement has the wrong character count
    LengthMismatch {
        /// Configured character length
        expected: usize,
        /// Character length of the replacement
        actual: usize,
        /// The rejected replacement
        value: String,
    },
    /// Replacement has the right length but cannot be encoded into the span
    Unencodable {
        /// The rejected replacement
        value: String,
    },
}

/// Per-field outcome of a substitution pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOutcome {
    /// Field name
    pub field: String,
    /// Value decoded from the record before substitution
    pub original: String,
    /// True if the field bytes contained malformed sequences
    pub malformed: bool,
    /// Decision taken
    pub result: FieldResult,
}

impl FieldOutcome {
    /// True if the field bytes changed
    pub fn is_replaced(&self) -> bool {
        matches!(self.result, FieldResult::Replaced { .. })
    }
}

/// Outcome of substituting every field of one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    /// Outcomes in field order
    pub fields: Vec<FieldOutcome>,
}

impl Substitution {
    /// Number of fields overwritten
    pub fn replaced_count(&self) -> usize {
        self.fields.iter().filter(|f| f.is_replaced()).count()
    }

    /// True if at least one field was overwritten
    pub fn is_modified(&self) -> bool {
        self.fields.iter().any(FieldOutcome::is_replaced)
    }
}

/// Applies a field set and a mapping table to data records
#[derive(Debug, Clone, Copy)]
pub struct Substituter<'a> {
    fields: &'a FieldSet,
    mapping: &'a MappingTable,
}

impl<'a> Substituter<'a> {
    /// Creates a substituter over shared, read-only inputs
    pub fn new(fields: &'a FieldSet, mapping: &'a MappingTable) -> Self {
        Self { fields, mapping }
    }

    /// Substitutes every field of `record` in place.
    ///
    /// `record` must be at least as long as the record size the field set
    /// was validated against.
    pub fn apply(&self, record: &mut [u8]) -> Substitution {
        let fields = self
            .fields
            .iter()
            .map(|field| self.apply_field(field, record))
            .collect();
        Substitution { fields }
    }

    fn apply_field(&self, field: &FieldSpec, record: &mut [u8]) -> FieldOutcome {
        let span = field.span();
        let decoded = field.encoding.decode(&record[span.clone()]);

        if decoded.malformed {
            warn!(
                "Field {} holds malformed {} bytes, decoded as [{}]",
                field.name, field.encoding, decoded.text
            );
        }

        let result = match self.mapping.get(&decoded.text) {
            None => FieldResult::NoMatch,
            Some(new) => {
                let actual = new.chars().count();
                if actual != field.char_length {
                    FieldResult::LengthMismatch {
                        expected: field.char_length,
                        actual,
                        value: new.to_string(),
                    }
                } else {
                    match field.encoding.encode(new, span.len()) {
                        Some(bytes) => {
                            record[span].copy_from_slice(&bytes);
                            FieldResult::Replaced {
                                value: new.to_string(),
                            }
                        }
                        None => FieldResult::Unencodable {
                            value: new.to_string(),
                        },
                    }
                }
            }
        };

        trace!("Field {} [{}]: {:?}", field.name, decoded.text, result);

        FieldOutcome {
            field: field.name.clone(),
            original: decoded.text,
            malformed: decoded.malformed,
            result,
        }
    }
}
