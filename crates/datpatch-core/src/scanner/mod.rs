//! Record scanning: the driver that walks a file in fixed-size chunks.
//!
//! ## Algorithm Overview
//!
//! 1. Read exactly `record_size` bytes (looping over short OS reads)
//! 2. Classify the chunk by its first byte
//! 3. For data records, substitute every configured field in place
//! 4. Write the chunk to the output, preserving order
//! 5. Stop on end of input; a non-empty partial chunk is copied through
//!    unchanged and ends the pass
//!
//! Every pass owns its [`RunReport`]; nothing is shared between passes except
//! the read-only [`MappingTable`].

mod classify;

use crate::codec::FieldEncoding;
use crate::error::{Error, Result};
use crate::layout::{FieldSet, FieldSpec};
use crate::mapping::MappingTable;
use crate::report::{RunReport, ShortRead};
use crate::substitute::Substituter;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, trace, warn};

pub use classify::{Markers, RecordKind, UnknownMarkerPolicy};

/// Default record size in bytes
pub const DEFAULT_RECORD_SIZE: usize = 1300;

/// Configuration for the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Bytes per record
    pub record_size: usize,
    /// Header and data marker bytes
    pub markers: Markers,
    /// Handling of records with any other marker
    pub unknown_marker: UnknownMarkerPolicy,
    /// Field descriptors, applied in order
    pub fields: Vec<FieldSpec>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            record_size: DEFAULT_RECORD_SIZE,
            markers: Markers::default(),
            unknown_marker: UnknownMarkerPolicy::default(),
            fields: FieldSet::phone_pair(FieldEncoding::default()),
        }
    }
}

impl ScannerConfig {
    /// Creates a new scanner config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the record size
    pub fn record_size(mut self, size: usize) -> Self {
        self.record_size = size;
        self
    }

    /// Sets the marker bytes
    pub fn markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }

    /// Sets the unknown marker policy
    pub fn unknown_marker(mut self, policy: UnknownMarkerPolicy) -> Self {
        self.unknown_marker = policy;
        self
    }

    /// Replaces the field list
    pub fn fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.fields = fields;
        self
    }

    /// Re-encodes every field with `encoding`
    pub fn encoding(mut self, encoding: FieldEncoding) -> Self {
        for field in &mut self.fields {
            field.encoding = encoding;
        }
        self
    }
}

/// Scan driver bound to one validated configuration and mapping table
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    record_size: usize,
    markers: Markers,
    unknown_marker: UnknownMarkerPolicy,
    fields: FieldSet,
    mapping: &'a MappingTable,
}

impl<'a> Scanner<'a> {
    /// Validates `config` and binds it to `mapping`
    pub fn new(config: ScannerConfig, mapping: &'a MappingTable) -> Result<Self> {
        if config.record_size == 0 {
            return Err(Error::invalid_config("record_size must be positive"));
        }
        if config.markers.header == config.markers.data {
            return Err(Error::invalid_config(format!(
                "header and data markers are both 0x{:02X}",
                config.markers.header
            )));
        }
        let fields = FieldSet::new(config.fields, config.record_size)?;

        Ok(Self {
            record_size: config.record_size,
            markers: config.markers,
            unknown_marker: config.unknown_marker,
            fields,
            mapping,
        })
    }

    /// Bytes per record
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// The validated field set
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Runs one pass from `input` to `output`.
    ///
    /// Output length always equals input length. Only an I/O failure or the
    /// strict unknown-marker policy ends the pass with an error.
    pub fn run<R: Read, W: Write>(&self, mut input: R, mut output: W) -> Result<RunReport> {
        let substituter = Substituter::new(&self.fields, self.mapping);
        let mut report = RunReport::new(self.record_size);
        let mut buf = vec![0u8; self.record_size];
        let mut record: u64 = 0;

        loop {
            let filled = fill_record(&mut input, &mut buf)?;
            report.file_size += filled as u64;

            if filled == 0 {
                break;
            }
            record += 1;

            if filled < self.record_size {
                warn!(
                    "Record #{} is short: read {} of {} bytes, copying through",
                    record, filled, self.record_size
                );
                output.write_all(&buf[..filled])?;
                report.record_short_read(ShortRead {
                    record,
                    len: filled,
                    expected: self.record_size,
                });
                break;
            }

            match self.markers.classify(&buf) {
                RecordKind::Header => {
                    debug!("Record #{}: header, skipped", record);
                    report.record_header(record);
                }
                RecordKind::Data => {
                    let substitution = substituter.apply(&mut buf);
                    debug!(
                        "Record #{}: data, {} field(s) replaced",
                        record,
                        substitution.replaced_count()
                    );
                    report.record_data(record, substitution);
                }
                RecordKind::Unknown(marker) => match self.unknown_marker {
                    UnknownMarkerPolicy::PassThrough => {
                        debug!(
                            "Record #{}: unknown marker 0x{:02X}, passed through",
                            record, marker
                        );
                        report.record_unknown(record, marker);
                    }
                    UnknownMarkerPolicy::Reject => {
                        return Err(Error::UnknownMarker { record, marker });
                    }
                },
            }

            output.write_all(&buf)?;
        }

        output.flush()?;

        info!(
            "Pass complete: {} / {} records modified, {} fields replaced",
            report.modified_record_count, report.record_count, report.replaced_field_count
        );
        Ok(report)
    }

    /// Processes `input` into `output`.
    ///
    /// The input is checked before anything is created. Output is staged in
    /// a temporary file next to `output` and only moved into place once the
    /// pass succeeds, so a failed run leaves no partial file behind.
    pub fn process_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<RunReport> {
        let input = input.as_ref();
        let output = output.as_ref();

        if !input.is_file() {
            return Err(Error::configuration_missing("DAT file", input));
        }

        let size = input
            .metadata()
            .map_err(|e| Error::file_read(input, e))?
            .len();
        debug!(
            "{}: {} bytes, {} full record(s), {} trailing byte(s)",
            input.display(),
            size,
            size / self.record_size as u64,
            size % self.record_size as u64
        );

        let source = File::open(input).map_err(|e| Error::file_read(input, e))?;

        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| Error::directory_create(parent, e))?;

        let mut staged = NamedTempFile::new_in(parent).map_err(|e| Error::file_write(output, e))?;
        trace!("Staging output in {}", staged.path().display());

        let report = self.run(BufReader::new(source), BufWriter::new(staged.as_file_mut()))?;

        staged
            .persist(output)
            .map_err(|e| Error::file_write(output, e.error))?;

        Ok(report)
    }
}

/// Reads until `buf` is full or the input ends; returns bytes read.
fn fill_record<R: Read>(input: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
