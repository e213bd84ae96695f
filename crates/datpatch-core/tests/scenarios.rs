//! End-to-end passes over whole record files.

use datpatch_core::sample::sample_file;
use datpatch_core::{
    FieldEncoding, FieldResult, FieldSpec, MappingTable, RecordOutcome, RunReport, Scanner,
    ScannerConfig, TranscriptHeader,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const RECORD_SIZE: usize = 1300;

fn record(marker: u8, phone1: &str, phone2: &str, encoding: FieldEncoding) -> Vec<u8> {
    let width = encoding.width();
    let mut r = vec![b' '; RECORD_SIZE];
    r[0] = marker;
    r[99..99 + 10 * width].copy_from_slice(&encoding.encode(phone1, 10 * width).unwrap());
    r[199..199 + 10 * width].copy_from_slice(&encoding.encode(phone2, 10 * width).unwrap());
    r
}

/// One header record and three data records, as in the classic layout
fn classic_file(encoding: FieldEncoding) -> Vec<u8> {
    let mut data = record(b'1', "0000000000", "0000000000", encoding);
    data.extend(record(b'2', "1381234567", "1391234567", encoding));
    data.extend(record(b'2', "1382345678", "1392345678", encoding));
    data.extend(record(b'2', "1383456789", "1393456789", encoding));
    data
}

fn run(config: ScannerConfig, mapping: &MappingTable, input: &[u8]) -> (Vec<u8>, RunReport) {
    let scanner = Scanner::new(config, mapping).unwrap();
    let mut out = Vec::new();
    let report = scanner.run(input, &mut out).unwrap();
    (out, report)
}

fn differing_offsets(a: &[u8], b: &[u8]) -> Vec<usize> {
    a.iter()
        .zip(b)
        .enumerate()
        .filter(|(_, (x, y))| x != y)
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn single_byte_scenario() {
    let input = classic_file(FieldEncoding::ascii());
    let mapping = MappingTable::from_pairs([("1381234567", "1381112222")]);

    let (out, report) = run(ScannerConfig::new(), &mapping, &input);

    assert_eq!(out.len(), input.len());
    assert_eq!(report.record_count, 4);
    assert_eq!(report.header_count, 1);
    assert_eq!(report.modified_record_count, 1);
    assert_eq!(report.replaced_field_count, 1);
    assert_eq!(&out[1300 + 99..1300 + 109], b"1381112222");
    // only the bytes of record 2, Phone-1 that actually differ
    let changed = differing_offsets(&input, &out);
    assert!(changed.iter().all(|&i| (1399..1409).contains(&i)));
    assert!(!changed.is_empty());
}

#[test]
fn two_byte_scenario() {
    let input = classic_file(FieldEncoding::utf16_be());
    let mapping = MappingTable::from_pairs([("1381234567", "1381112222")]);
    let config = ScannerConfig::new().encoding(FieldEncoding::utf16_be());

    let (out, report) = run(config, &mapping, &input);

    assert_eq!(out.len(), input.len());
    assert_eq!(report.replaced_field_count, 1);
    let span = &out[1300 + 99..1300 + 119];
    assert_eq!(FieldEncoding::utf16_be().decode(span).text, "1381112222");
    let changed = differing_offsets(&input, &out);
    assert!(changed.iter().all(|&i| (1399..1419).contains(&i)));
}

#[test]
fn sample_file_matches_classic_layout() {
    let config = ScannerConfig::new().encoding(FieldEncoding::utf16_be());
    assert_eq!(
        sample_file(&config).unwrap(),
        classic_file(FieldEncoding::utf16_be())
    );
}

#[test]
fn short_trailing_read_is_copied_through() {
    let mut input = classic_file(FieldEncoding::ascii());
    input.extend_from_slice(b"2tail-bytes-1381234567");
    let mapping = MappingTable::from_pairs([("1381234567", "1381112222")]);

    let (out, report) = run(ScannerConfig::new(), &mapping, &input);

    assert_eq!(out.len(), input.len());
    assert_eq!(report.record_count, 4);
    assert_eq!(report.file_size, input.len() as u64);
    assert_eq!(&out[4 * RECORD_SIZE..], &input[4 * RECORD_SIZE..]);

    let short = report.short_read.expect("short read recorded");
    assert_eq!(short.record, 5);
    assert_eq!(short.len, 22);
    assert!(matches!(
        report.entries.last().map(|e| &e.outcome),
        Some(RecordOutcome::ShortRead(_))
    ));
}

#[test]
fn input_shorter_than_one_record_is_a_single_short_read() {
    let input = b"2 1381234567".to_vec();
    let mapping = MappingTable::from_pairs([("1381234567", "1381112222")]);

    let (out, report) = run(ScannerConfig::new(), &mapping, &input);

    assert_eq!(out, input);
    assert_eq!(report.record_count, 0);
    assert_eq!(report.replaced_field_count, 0);
    assert_eq!(report.entries.len(), 1);

    let short = report.short_read.expect("short read recorded");
    assert_eq!((short.record, short.len, short.expected), (1, 12, RECORD_SIZE));
}

#[test]
fn unknown_marker_is_listed_in_transcript() {
    let mut input = classic_file(FieldEncoding::ascii());
    input.extend(record(b'9', "1381234567", "0000000000", FieldEncoding::ascii()));
    let mapping = MappingTable::from_pairs([("1381234567", "1381112222")]);

    let (out, report) = run(ScannerConfig::new(), &mapping, &input);

    // the unknown record is copied unchanged even though its field matches
    assert_eq!(&out[4 * RECORD_SIZE..], &input[4 * RECORD_SIZE..]);
    assert_eq!(report.unknown_count, 1);
    assert!(matches!(
        report.entries.last().map(|e| &e.outcome),
        Some(RecordOutcome::Unknown { marker: b'9' })
    ));

    let transcript = report.transcript(&TranscriptHeader::default());
    assert!(transcript.contains("[#   5] UNKNOWN MARKER 0x39 - passed through"));
}

#[test]
fn header_records_are_never_modified() {
    let mut input = record(b'1', "1381234567", "1391234567", FieldEncoding::ascii());
    input.extend(record(b'1', "1381234567", "1381234567", FieldEncoding::ascii()));
    let mapping = MappingTable::from_pairs([
        ("1381234567", "1381112222"),
        ("1391234567", "1391112222"),
    ]);

    let (out, report) = run(ScannerConfig::new(), &mapping, &input);

    assert_eq!(out, input);
    assert_eq!(report.header_count, 2);
    assert_eq!(report.replaced_field_count, 0);
}

#[test]
fn length_mismatch_never_alters_bytes() {
    let input = classic_file(FieldEncoding::ascii());
    let mapping = MappingTable::from_pairs([
        ("1381234567", "138111222"),
        ("1392345678", "13922223333"),
    ]);

    let (out, report) = run(ScannerConfig::new(), &mapping, &input);

    assert_eq!(out, input);
    assert_eq!(report.modified_record_count, 0);
    let mismatches: Vec<_> = report
        .field_outcomes()
        .filter_map(|f| match &f.result {
            FieldResult::LengthMismatch {
                expected, actual, ..
            } => Some((f.field.as_str(), *expected, *actual)),
            _ => None,
        })
        .collect();
    assert_eq!(mismatches, vec![("Phone-1", 10, 9), ("Phone-2", 10, 11)]);
}

#[test]
fn second_pass_with_disjoint_mapping_is_noop() {
    let input = classic_file(FieldEncoding::ascii());
    let first = MappingTable::from_pairs([("1381234567", "1381112222")]);
    let (once, _) = run(ScannerConfig::new(), &first, &input);

    // none of these keys occur in the already-substituted output
    let disjoint = MappingTable::from_pairs([("1381234567", "1385555555"), ("9999999999", "1")]);
    let (twice, report) = run(ScannerConfig::new(), &disjoint, &once);

    assert_eq!(twice, once);
    assert_eq!(report.replaced_field_count, 0);
}

#[test]
fn configurable_field_count() {
    let fields = vec![
        FieldSpec::new("Phone-1", 100, 10),
        FieldSpec::new("Phone-2", 200, 10),
        FieldSpec::new("Phone-3", 300, 10),
    ];
    let mut input = record(b'2', "1381234567", "1381234567", FieldEncoding::ascii());
    input[299..309].copy_from_slice(b"1381234567");
    let mapping = MappingTable::from_pairs([("1381234567", "1381112222")]);

    let (out, report) = run(ScannerConfig::new().fields(fields), &mapping, &input);

    assert_eq!(report.modified_record_count, 1);
    assert_eq!(report.replaced_field_count, 3);
    assert_eq!(&out[299..309], b"1381112222");
}

#[test]
fn process_file_writes_output_and_preserves_length() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in").join("data.dat");
    let output = dir.path().join("out").join("data.dat");
    std::fs::create_dir_all(input.parent().unwrap()).unwrap();
    std::fs::write(&input, classic_file(FieldEncoding::ascii())).unwrap();

    let mapping = MappingTable::from_pairs([("1383456789", "1380000000")]);
    let scanner = Scanner::new(ScannerConfig::new(), &mapping).unwrap();
    let report = scanner.process_file(&input, &output).unwrap();

    let written = std::fs::read(&output).unwrap();
    assert_eq!(written.len(), 4 * RECORD_SIZE);
    assert_eq!(&written[3 * RECORD_SIZE + 99..3 * RECORD_SIZE + 109], b"1380000000");
    assert_eq!(report.modified_record_count, 1);
    // only the output file is left in the output directory
    assert_eq!(std::fs::read_dir(output.parent().unwrap()).unwrap().count(), 1);
}

#[test]
fn missing_input_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let output_dir = dir.path().join("out");
    let mapping = MappingTable::default();
    let scanner = Scanner::new(ScannerConfig::new(), &mapping).unwrap();

    let err = scanner
        .process_file(dir.path().join("missing.dat"), output_dir.join("missing.dat"))
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(!output_dir.exists());
}

#[test]
fn rejected_run_leaves_no_partial_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("data.dat");
    let output = dir.path().join("out").join("data.dat");
    let mut data = classic_file(FieldEncoding::ascii());
    data.extend(record(b'9', "0000000000", "0000000000", FieldEncoding::ascii()));
    std::fs::write(&input, data).unwrap();

    let mapping = MappingTable::default();
    let config = ScannerConfig::new().unknown_marker(datpatch_core::UnknownMarkerPolicy::Reject);
    let scanner = Scanner::new(config, &mapping).unwrap();

    assert!(scanner.process_file(&input, &output).is_err());
    assert!(!output.exists());
    assert_eq!(std::fs::read_dir(output.parent().unwrap()).unwrap().count(), 0);
}
