//! Record classification by leading marker byte.

use serde::Deserialize;

/// Kind of a record as decided by its first byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Header record, passed through unmodified
    Header,
    /// Data record, subject to substitution
    Data,
    /// Marker matches neither configured value
    Unknown(u8),
}

/// What to do with a record whose marker is neither header nor data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownMarkerPolicy {
    /// Write the record through unchanged and note it in the report
    #[default]
    PassThrough,
    /// Abort the run
    Reject,
}

/// Raw marker byte values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers {
    /// First byte of header records
    pub header: u8,
    /// First byte of data records
    pub data: u8,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            header: b'1',
            data: b'2',
        }
    }
}

impl Markers {
    /// Creates a marker pair from raw byte values
    pub fn new(header: u8, data: u8) -> Self {
        Self { header, data }
    }

    /// Classifies a record by its first byte. An empty slice is unknown.
    pub fn classify(&self, record: &[u8]) -> RecordKind {
        match record.first() {
            Some(&b) if b == self.header => RecordKind::Header,
            Some(&b) if b == self.data => RecordKind::Data,
            Some(&b) => RecordKind::Unknown(b),
            None => RecordKind::Unknown(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let markers = Markers::default();
        assert_eq!(markers.classify(b"1rest"), RecordKind::Header);
        assert_eq!(markers.classify(b"2rest"), RecordKind::Data);
        assert_eq!(markers.classify(b"9rest"), RecordKind::Unknown(b'9'));
    }

    #[test]
    fn test_classify_raw_bytes() {
        // compared as byte values, not characters
        let markers = Markers::new(0x01, 0x02);
        assert_eq!(markers.classify(&[0x01, b'x']), RecordKind::Header);
        assert_eq!(markers.classify(&[0x02]), RecordKind::Data);
        assert_eq!(markers.classify(b"1"), RecordKind::Unknown(b'1'));
    }
}
