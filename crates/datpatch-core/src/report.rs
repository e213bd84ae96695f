//! Run report: counters and per-record decisions of one scan pass.
//!
//! A [`RunReport`] is created by the scan driver, filled while records are
//! processed, and handed back to the caller when the pass ends. It holds the
//! counted facts; [`RunReport::transcript`] renders them as the human-readable
//! processing log.

use crate::substitute::{FieldOutcome, FieldResult, Substitution};
use std::fmt::Write as FmtWrite;

/// A trailing chunk shorter than a full record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortRead {
    /// 1-based number the record would have had
    pub record: u64,
    /// Bytes actually present
    pub len: usize,
    /// Configured record size
    pub expected: usize,
}

/// Decision taken for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Header marker; passed through
    Header,
    /// Data marker; fields were processed
    Data(Substitution),
    /// Neither marker; passed through
    Unknown {
        /// The first byte of the record
        marker: u8,
    },
    /// Trailing partial record; copied through unchanged
    ShortRead(ShortRead),
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    /// 1-based record number
    pub record: u64,
    /// What happened
    pub outcome: RecordOutcome,
}

/// Counters and entries for one pass over one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Total bytes read from the input
    pub file_size: u64,
    /// Configured record size
    pub record_size: usize,
    /// Full-size records processed
    pub record_count: u64,
    /// Records classified as header
    pub header_count: u64,
    /// Records with an unrecognised marker
    pub unknown_count: u64,
    /// Data records with at least one replaced field
    pub modified_record_count: u64,
    /// Fields overwritten across all records
    pub replaced_field_count: u64,
    /// Trailing partial record, if the file size is not a multiple of the
    /// record size
    pub short_read: Option<ShortRead>,
    /// Per-record decisions in file order
    pub entries: Vec<RecordEntry>,
}

/// Context printed at the top of a transcript
#[derive(Debug, Clone, Default)]
pub struct TranscriptHeader {
    /// Wall-clock time the run started, preformatted
    pub started: String,
    /// Input file as displayed
    pub input: String,
    /// Output file as displayed
    pub output: String,
    /// Mapping file as displayed
    pub mapping: String,
    /// Number of mapping rules loaded
    pub rule_count: usize,
    /// Number of configured fields
    pub field_count: usize,
}

const RULE: &str = "────────────────────────────────────────────────────────────────";

impl RunReport {
    /// Creates an empty report for the given record size
    pub fn new(record_size: usize) -> Self {
        Self {
            record_size,
            ..Self::default()
        }
    }

    pub(crate) fn record_header(&mut self, record: u64) {
        self.record_count += 1;
        self.header_count += 1;
        self.entries.push(RecordEntry {
            record,
            outcome: RecordOutcome::Header,
        });
    }

    pub(crate) fn record_data(&mut self, record: u64, substitution: Substitution) {
        self.record_count += 1;
        self.replaced_field_count += substitution.replaced_count() as u64;
        if substitution.is_modified() {
            self.modified_record_count += 1;
        }
        self.entries.push(RecordEntry {
            record,
            outcome: RecordOutcome::Data(substitution),
        });
    }

    pub(crate) fn record_unknown(&mut self, record: u64, marker: u8) {
        self.record_count += 1;
        self.unknown_count += 1;
        self.entries.push(RecordEntry {
            record,
            outcome: RecordOutcome::Unknown { marker },
        });
    }

    pub(crate) fn record_short_read(&mut self, short: ShortRead) {
        self.short_read = Some(short);
        self.entries.push(RecordEntry {
            record: short.record,
            outcome: RecordOutcome::ShortRead(short),
        });
    }

    /// Data records processed
    pub fn data_count(&self) -> u64 {
        self.record_count - self.header_count - self.unknown_count
    }

    /// Iterates every field outcome across all data records
    pub fn field_outcomes(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.entries.iter().flat_map(|entry| match &entry.outcome {
            RecordOutcome::Data(sub) => sub.fields.as_slice(),
            _ => &[][..],
        })
    }

    /// Renders the processing transcript
    pub fn transcript(&self, header: &TranscriptHeader) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_transcript(&mut out, header);
        out
    }

    fn write_transcript(&self, out: &mut String, header: &TranscriptHeader) -> std::fmt::Result {
        writeln!(out, "DAT Phone Replacer")?;
        writeln!(out, "  Time:    {}", header.started)?;
        writeln!(out, "  Input:   {}", header.input)?;
        writeln!(out, "  Output:  {}", header.output)?;
        writeln!(out, "  Mapping: {}", header.mapping)?;
        writeln!(out)?;
        writeln!(out, "Loaded {} phone mapping rules", header.rule_count)?;
        writeln!(out)?;
        writeln!(out, "File size: {} bytes", self.file_size)?;
        writeln!(
            out,
            "Records: {} | Fields: {}",
            self.record_count, header.field_count
        )?;
        writeln!(out, "{RULE}")?;
        writeln!(out)?;

        for entry in &self.entries {
            let n = entry.record;
            match &entry.outcome {
                RecordOutcome::Header => writeln!(out, "[#{n:4}] HEADER - skipped")?,
                RecordOutcome::Unknown { marker } => {
                    writeln!(out, "[#{n:4}] UNKNOWN MARKER 0x{marker:02X} - passed through")?
                }
                RecordOutcome::ShortRead(short) => writeln!(
                    out,
                    "[#{n:4}] SHORT READ - {} / {} bytes, copied unchanged",
                    short.len, short.expected
                )?,
                RecordOutcome::Data(sub) => {
                    let verdict = if sub.is_modified() { "REPLACED" } else { "NO MATCH" };
                    writeln!(out, "[#{n:4}] {verdict}")?;
                    for field in &sub.fields {
                        write_field(out, field)?;
                    }
                }
            }
        }

        writeln!(out)?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "Summary:")?;
        writeln!(
            out,
            "  Modified records: {} / {}",
            self.modified_record_count, self.record_count
        )?;
        writeln!(out, "  Replaced numbers: {}", self.replaced_field_count)?;
        if let Some(short) = &self.short_read {
            writeln!(out, "  Trailing bytes:   {} (not a full record)", short.len)?;
        }
        writeln!(out, "{RULE}")
    }
}

fn write_field(out: &mut String, field: &FieldOutcome) -> std::fmt::Result {
    let name = &field.field;
    let original = &field.original;
    let note = if field.malformed { " (malformed bytes)" } else { "" };
    match &field.result {
        FieldResult::Replaced { value } => {
            writeln!(out, "  {name}: [{original}] -> [{value}]{note}")
        }
        FieldResult::NoMatch => writeln!(out, "  {name}: [{original}] no match{note}"),
        FieldResult::LengthMismatch {
            expected, actual, ..
        } => writeln!(
            out,
            "  {name}: length mismatch (expected {expected}, got {actual}){note}"
        ),
        FieldResult::Unencodable { value } => writeln!(
            out,
            "  {name}: [{value}] cannot be encoded into the field{note}"
        ),
    }
}
