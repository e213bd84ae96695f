//! # datpatch-core
//!
//! A library for rewriting fixed-width fields inside fixed-length binary
//! records, driven by an old-value to new-value mapping table.
//!
//! This crate provides the core functionality for:
//! - Splitting a flat file into fixed-size records
//! - Classifying records by their leading marker byte
//! - Decoding, looking up and re-encoding phone number fields in place
//! - Reporting every per-record and per-field decision
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`scanner`]: The scan driver and record classifier
//! - [`substitute`]: Per-record field substitution
//! - [`codec`]: Fixed-width text encodings
//! - [`layout`]: Field descriptors
//! - [`mapping`]: The mapping table and its CSV source
//! - [`report`]: Run counters and the processing transcript
//! - [`config`]: TOML configuration
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use datpatch_core::{MappingTable, Scanner, ScannerConfig};
//!
//! let mapping = MappingTable::load("mapping/mapping.csv")?;
//! let scanner = Scanner::new(ScannerConfig::new(), &mapping)?;
//! let report = scanner.process_file("in/data.dat", "out/data.dat")?;
//!
//! println!(
//!     "{} / {} records modified",
//!     report.modified_record_count, report.record_count
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod codec;
pub mod config;
pub mod error;
pub mod layout;
pub mod mapping;
pub mod report;
pub mod sample;
pub mod scanner;
pub mod substitute;

// Re-export primary types for convenience
pub use codec::FieldEncoding;
pub use config::RunConfig;
pub use error::{Error, Result};
pub use layout::{FieldSet, FieldSpec};
pub use mapping::MappingTable;
pub use report::{RecordEntry, RecordOutcome, RunReport, ShortRead, TranscriptHeader};
pub use scanner::{Markers, RecordKind, Scanner, ScannerConfig, UnknownMarkerPolicy};
pub use substitute::{FieldOutcome, FieldResult, Substituter, Substitution};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
