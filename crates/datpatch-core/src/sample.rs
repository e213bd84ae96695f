//! Sample data generator.
//!
//! Builds a small record file matching a scanner configuration: one header
//! record followed by three data records, every byte outside the phone
//! fields filled with spaces.

use crate::error::{Error, Result};
use crate::layout::{FieldSet, FieldSpec};
use crate::scanner::ScannerConfig;

/// Phone values per data record, cycled over the configured fields
const SAMPLE_ROWS: [[&str; 2]; 3] = [
    ["1381234567", "1391234567"],
    ["1382345678", "1392345678"],
    ["1383456789", "1393456789"],
];

/// A mapping that matches exactly one field of the sample file
pub const SAMPLE_MAPPING: &str = "1381234567,1381112222\n";

/// Builds the sample file bytes for `config`.
pub fn sample_file(config: &ScannerConfig) -> Result<Vec<u8>> {
    FieldSet::new(config.fields.clone(), config.record_size)?;
    let mut data = Vec::with_capacity(config.record_size * (SAMPLE_ROWS.len() + 1));

    let zeros: Vec<String> = config
        .fields
        .iter()
        .map(|f| "0".repeat(f.char_length))
        .collect();
    data.extend(sample_record(config, config.markers.header, &zeros)?);

    for row in SAMPLE_ROWS {
        let values: Vec<String> = config
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| fit(row[i % row.len()], f.char_length))
            .collect();
        data.extend(sample_record(config, config.markers.data, &values)?);
    }

    Ok(data)
}

fn sample_record(config: &ScannerConfig, marker: u8, values: &[String]) -> Result<Vec<u8>> {
    let mut record = vec![b' '; config.record_size];
    if let Some(first) = record.first_mut() {
        *first = marker;
    }
    for (field, value) in config.fields.iter().zip(values) {
        write_field(&mut record, field, value)?;
    }
    Ok(record)
}

fn write_field(record: &mut [u8], field: &FieldSpec, value: &str) -> Result<()> {
    let span = field.span();
    if span.end > record.len() {
        return Err(Error::invalid_field(&field.name, "does not fit the record"));
    }
    let bytes = field
        .encoding
        .encode(value, span.len())
        .ok_or_else(|| Error::invalid_field(&field.name, "sample value cannot be encoded"))?;
    record[span].copy_from_slice(&bytes);
    Ok(())
}

/// Truncates or zero-pads `value` to `len` characters
fn fit(value: &str, len: usize) -> String {
    value.chars().chain(std::iter::repeat('0')).take(len).collect()
}
