//! Error types for the datpatch-core library.
//!
//! Only run-level failures are represented here. Anomalies that concern a
//! single record or field (short trailing reads, length mismatches, malformed
//! field bytes) are recovered locally and reported through
//! [`RunReport`](crate::RunReport) instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for datpatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all datpatch operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A required input (data file, mapping table, config file) does not exist
    #[error("{what} '{path}' does not exist")]
    ConfigurationMissing {
        /// Human-readable name of the missing input
        what: &'static str,
        /// Path that was looked up
        path: PathBuf,
    },

    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to create output directory
    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreate {
        /// Path to the directory that failed to create
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or does not match the expected shape
    #[error("failed to parse config '{path}': {source}")]
    ConfigParse {
        /// Path to the config file
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// Config values are individually valid but inconsistent
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A field descriptor cannot be placed inside the record
    #[error("invalid field '{name}': {details}")]
    InvalidField {
        /// Field name as configured
        name: String,
        /// Detailed description of the issue
        details: String,
    },

    /// Encoding label is unknown or not fixed-width
    #[error("unsupported encoding '{label}': {details}")]
    UnsupportedEncoding {
        /// The label as given
        label: String,
        /// Why it was rejected
        details: &'static str,
    },

    /// The mapping table source is not well-formed CSV
    #[error("malformed mapping table '{path}'")]
    MappingParse {
        /// Path to the mapping file
        path: PathBuf,
        /// Underlying CSV error
        #[source]
        source: csv::Error,
    },

    /// A record carried a marker byte that is neither header nor data, and
    /// the strict marker policy is active
    #[error("record #{record} has unknown marker byte 0x{marker:02X}")]
    UnknownMarker {
        /// 1-based record number
        record: u64,
        /// The offending first byte
        marker: u8,
    },

    /// I/O error on a stream without an associated path
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a new missing-input error
    pub fn configuration_missing(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::ConfigurationMissing {
            what,
            path: path.into(),
        }
    }

    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new directory creation error
    pub fn directory_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreate {
            path: path.into(),
            source,
        }
    }

    /// Creates a new invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates a new invalid field error
    pub fn invalid_field(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidField {
            name: name.into(),
            details: details.into(),
        }
    }

    /// Creates a new unsupported encoding error
    pub fn unsupported_encoding(label: impl Into<String>, details: &'static str) -> Self {
        Self::UnsupportedEncoding {
            label: label.into(),
            details,
        }
    }

    /// Returns true if the run was aborted because a required input is absent
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigurationMissing { .. })
    }
}
