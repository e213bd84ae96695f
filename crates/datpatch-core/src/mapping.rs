//! The old-value to new-value lookup table and its CSV source.
//!
//! The table is built once per run and shared read-only by every record.
//! Keys are compared exactly as decoded; no trimming or case folding happens
//! at lookup time.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace};

/// Immutable phone number mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    rules: HashMap<String, String>,
}

impl MappingTable {
    /// Builds a table from ordered pairs.
    ///
    /// Pairs are trimmed; pairs with an empty side are dropped and the last
    /// occurrence of a duplicate key wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut rules = HashMap::new();
        for (old, new) in pairs {
            let (old, new) = (old.as_ref().trim(), new.as_ref().trim());
            if old.is_empty() || new.is_empty() {
                continue;
            }
            rules.insert(old.to_string(), new.to_string());
        }
        Self { rules }
    }

    /// Parses two-column CSV text: `old,new` per row.
    ///
    /// There is no header row. Extra columns are ignored, rows with fewer
    /// than two columns are skipped, and a leading UTF-8 BOM is stripped.
    /// Quoted cells may contain commas, doubled quotes and line breaks.
    pub fn from_csv_reader<R: Read>(reader: R) -> std::result::Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut pairs = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row?;
            match (row.get(0), row.get(1)) {
                (Some(old), Some(new)) => {
                    let old = if index == 0 {
                        old.trim_start_matches('\u{FEFF}')
                    } else {
                        old
                    };
                    pairs.push((old.to_string(), new.to_string()));
                }
                _ => trace!("Skipping mapping row {}: fewer than two columns", index + 1),
            }
        }

        let table = Self::from_pairs(pairs);
        debug!("Loaded {} mapping rules", table.len());
        Ok(table)
    }

    /// Loads a CSV mapping file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::configuration_missing("mapping file", path));
        }
        let file = std::fs::File::open(path).map_err(|e| Error::file_read(path, e))?;
        Self::from_csv_reader(file).map_err(|source| Error::MappingParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Looks up the replacement for an exact value
    pub fn get(&self, old: &str) -> Option<&str> {
        self.rules.get(old).map(String::as_str)
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if the table holds no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates rules in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
