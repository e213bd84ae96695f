//! TOML run configuration.
//!
//! ```toml
//! record_size = 1300
//! encoding = "BigEndianUnicode"
//!
//! [markers]
//! base = 48        # ASCII '0'
//! header = 1
//! data = 2
//! unknown = "pass-through"
//!
//! [[fields]]
//! name = "Phone-1"
//! start_byte = 100
//! length = 10
//! ```
//!
//! Every key is optional. Marker bytes are derived here as `base + digit`;
//! the scanner only ever sees raw byte values.

use crate::codec::FieldEncoding;
use crate::error::{Error, Result};
use crate::layout::FieldSpec;
use crate::scanner::{Markers, ScannerConfig, UnknownMarkerPolicy, DEFAULT_RECORD_SIZE};
use serde::Deserialize;
use std::path::Path;

/// Top-level config file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Bytes per record
    pub record_size: usize,
    /// Default encoding label for every field
    pub encoding: String,
    /// Marker derivation and policy
    pub markers: MarkerConfig,
    /// Field descriptors in processing order
    pub fields: Vec<FieldConfig>,
}

/// `[markers]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerConfig {
    /// Byte value added to each digit
    pub base: u8,
    /// Header digit
    pub header: u8,
    /// Data digit
    pub data: u8,
    /// Policy for any other marker
    pub unknown: UnknownMarkerPolicy,
}

/// One `[[fields]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    /// Field name
    pub name: String,
    /// 1-based start byte
    pub start_byte: usize,
    /// Length in characters
    pub length: usize,
    /// Encoding override for this field
    #[serde(default)]
    pub encoding: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            record_size: DEFAULT_RECORD_SIZE,
            encoding: "ascii".to_string(),
            markers: MarkerConfig::default(),
            fields: vec![
                FieldConfig::new("Phone-1", 100, 10),
                FieldConfig::new("Phone-2", 200, 10),
            ],
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            base: b'0',
            header: 1,
            data: 2,
            unknown: UnknownMarkerPolicy::default(),
        }
    }
}

impl FieldConfig {
    /// Creates a field entry that inherits the run encoding
    pub fn new(name: impl Into<String>, start_byte: usize, length: usize) -> Self {
        Self {
            name: name.into(),
            start_byte,
            length,
            encoding: None,
        }
    }
}

impl MarkerConfig {
    /// Derives raw marker bytes from base and digits
    pub fn resolve(&self) -> Result<Markers> {
        let byte = |digit: u8, role: &str| {
            self.base.checked_add(digit).ok_or_else(|| {
                Error::invalid_config(format!(
                    "{} marker {} + {} overflows a byte",
                    role, self.base, digit
                ))
            })
        };
        Ok(Markers::new(byte(self.header, "header")?, byte(self.data, "data")?))
    }
}

impl RunConfig {
    /// Parses TOML text
    pub fn from_toml(text: &str, origin: impl AsRef<Path>) -> Result<Self> {
        toml::from_str(text).map_err(|source| Error::ConfigParse {
            path: origin.as_ref().to_path_buf(),
            source,
        })
    }

    /// Reads and parses a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::configuration_missing("config file", path));
        }
        let text = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::from_toml(&text, path)
    }

    /// Resolves labels and markers into a scanner configuration.
    ///
    /// Geometry is validated later by [`Scanner::new`](crate::Scanner::new).
    pub fn scanner_config(&self) -> Result<ScannerConfig> {
        let default_encoding = FieldEncoding::for_label(&self.encoding)?;

        let fields = self
            .fields
            .iter()
            .map(|f| -> Result<FieldSpec> {
                let encoding = match &f.encoding {
                    Some(label) => FieldEncoding::for_label(label)?,
                    None => default_encoding,
                };
                Ok(FieldSpec::new(&f.name, f.start_byte, f.length).encoding(encoding))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ScannerConfig::new()
            .record_size(self.record_size)
            .markers(self.markers.resolve()?)
            .unknown_marker(self.markers.unknown)
            .fields(fields))
    }
}
