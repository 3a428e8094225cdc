mod common;

use std::fs;
use std::io::Cursor;

use common::*;
use resdata_reader::resdata::format::keyword::decode_next;
use resdata_reader::{DataType, Endianness, Keyword, ResFile, ResWriter, ResdataError, StreamFormat};

fn poro() -> Keyword {
    reals("PORO", &[0.1, 0.2, 0.3, 0.4])
}

fn mixed_keywords() -> Vec<Keyword> {
    vec![
        poro(),
        ints("ACTNUM", &(0..2500).map(|i| i % 3).collect::<Vec<_>>()),
        Keyword::from_values("PRESSURE", &[250.5f64, 251.25, 1.0e-3]).expect("DOUB keyword"),
        Keyword::from_values("FLAGS", &[true, false, true]).expect("LOGI keyword"),
        chars("WGNAMES", &["OP_1", "INJ", ":+:+:+:+"]),
        Keyword::from_strings_with_width("RESTART", 16, &["A_LONG_CASE_NAME"]).expect("C016 keyword"),
        Keyword::new("ENDSOL", DataType::Mess, 0).expect("MESS keyword"),
    ]
}

fn assert_round_trip(format: StreamFormat) {
    init_logger();
    let dir = temp_dir();
    let keywords = mixed_keywords();
    let path = write_keywords(dir.path(), "CASE.INIT", format, &keywords);

    let file = scan(&path);
    assert_eq!(file.format(), format, "probed format differs from the written one");
    assert_eq!(file.len(), keywords.len(), "keyword count mismatch");
    for (expected, loaded) in keywords.iter().zip(file.iter()) {
        let loaded = loaded.unwrap_or_else(|e| panic!("failed to load {}: {}", expected.name(), e));
        assert_eq!(&loaded, expected, "round trip changed keyword {}", expected.name());
    }
}

#[test]
fn poro_round_trips_through_a_stream() {
    let mut buffer = Vec::new();
    let mut writer = ResWriter::new(&mut buffer, StreamFormat::default());
    writer.write_keyword(&poro()).expect("write PORO");
    writer.finish().expect("flush");

    let mut reader = std::io::BufReader::new(Cursor::new(buffer));
    let decoded = decode_next(&mut reader, StreamFormat::default()).expect("decode PORO");
    assert_eq!(decoded, poro());
    assert_eq!(decoded.values::<f32>().expect("REAL values"), vec![0.1, 0.2, 0.3, 0.4]);

    match decode_next(&mut reader, StreamFormat::default()) {
        Err(ResdataError::EndOfStream) => {}
        other => panic!("expected EndOfStream after the last keyword, got {:?}", other),
    }
}

#[test]
fn big_endian_round_trip() {
    assert_round_trip(StreamFormat::unformatted(Endianness::Big));
}

#[test]
fn little_endian_round_trip() {
    assert_round_trip(StreamFormat::unformatted(Endianness::Little));
}

#[test]
fn formatted_round_trip() {
    assert_round_trip(StreamFormat::formatted());
}

#[test]
fn formatted_and_unformatted_streams_hold_the_same_keywords() {
    let dir = temp_dir();
    let keywords = mixed_keywords();
    let binary = scan(&write_keywords(dir.path(), "CASE.EGRID", StreamFormat::default(), &keywords));
    let text = scan(&write_keywords(dir.path(), "CASE.FEGRID", StreamFormat::formatted(), &keywords));

    let from_binary: Vec<Keyword> = binary.iter().map(|k| k.expect("binary keyword")).collect();
    let from_text: Vec<Keyword> = text.iter().map(|k| k.expect("text keyword")).collect();
    assert_eq!(from_binary, from_text);
}

#[test]
fn formatted_char_values_keep_embedded_quotes() {
    let dir = temp_dir();
    let names = chars("WGNAMES", &["O'NEIL", "'QUOTED'", "PLAIN"]);
    let path = write_keywords(dir.path(), "NAMES.FSMSPEC", StreamFormat::formatted(), &[names.clone()]);
    let loaded = scan(&path).load_named("WGNAMES", 0).expect("load WGNAMES");
    assert_eq!(loaded, names);
    assert_eq!(loaded.iget_string(0).expect("first name"), "O'NEIL");
    assert_eq!(loaded.iget_string(1).expect("second name"), "'QUOTED'");
}

#[test]
fn formatted_header_layout() {
    let dir = temp_dir();
    let path = write_keywords(dir.path(), "PORO.FINIT", StreamFormat::formatted(), &[poro()]);
    let text = fs::read_to_string(&path).expect("read formatted file");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(" 'PORO    '           4 'REAL'"));
    assert_eq!(
        lines.next(),
        Some("   0.100000000E+00   0.200000000E+00   0.300000000E+00   0.400000000E+00")
    );
    assert_eq!(lines.next(), None, "four REAL values fit on one line");
}

#[test]
fn big_endian_layout_on_disk() {
    let dir = temp_dir();
    let path = write_keywords(dir.path(), "ONE.X", StreamFormat::default(), &[ints("SEQNUM", &[7])]);
    let bytes = fs::read(&path).expect("read file");
    assert_eq!(&bytes[..4], &16i32.to_be_bytes(), "header record marker");
    assert_eq!(&bytes[4..12], b"SEQNUM  ");
    assert_eq!(&bytes[12..16], &1i32.to_be_bytes());
    assert_eq!(&bytes[16..20], b"INTE");
    assert_eq!(&bytes[20..24], &16i32.to_be_bytes());
    assert_eq!(&bytes[24..28], &4i32.to_be_bytes(), "data record marker");
    assert_eq!(&bytes[28..32], &7i32.to_be_bytes());
    assert_eq!(bytes.len(), 36);
}

#[test]
fn numeric_data_is_split_into_blocks_of_1000() {
    let dir = temp_dir();
    let values: Vec<f32> = (0..2500).map(|v| v as f32).collect();
    let path = write_keywords(dir.path(), "BIG.X", StreamFormat::default(), &[reals("SWAT", &values)]);
    let len = fs::metadata(&path).expect("stat").len();
    // header record + records of 1000, 1000 and 500 elements
    assert_eq!(len, 24 + 3 * 8 + 2500 * 4);

    let file = scan(&path);
    let entry = file.get("SWAT", 0).expect("SWAT entry");
    let slice = file.read_elements::<f32>(entry, 995..1005).expect("read across a record boundary");
    assert_eq!(slice, (995..1005).map(|v| v as f32).collect::<Vec<_>>());
    assert_eq!(file.read_element::<f32>(entry, 2499).expect("last element"), 2499.0);
}

#[test]
fn names_are_validated_and_padded() {
    assert!(matches!(
        Keyword::new("TOO_LONG_NAME", DataType::Int, 1),
        Err(ResdataError::Format(_))
    ));
    assert!(Keyword::new("        ", DataType::Int, 1).is_err(), "blank names are rejected");
    let keyword = Keyword::new("SGAS  ", DataType::Real, 2).expect("padded name");
    assert_eq!(keyword.name(), "SGAS");
}

#[test]
fn string_elements_ignore_trailing_blanks() {
    let keyword = chars("WGNAMES", &["OP_1", "INJ"]);
    assert!(keyword.string_eq(0, "OP_1").expect("CHAR"));
    assert!(keyword.string_eq(0, "OP_1    ").expect("CHAR"));
    assert!(!keyword.string_eq(1, "OP_1").expect("CHAR"));
    assert_eq!(keyword.iget_string(1).expect("CHAR"), "INJ");
    assert!(Keyword::from_strings("X", &["123456789"]).is_err(), "CHAR slots hold eight characters");
}

#[test]
fn real_widening_is_lossless_and_narrowing_is_explicit() {
    let keyword = reals("PORO", &[0.1, 0.25]);
    let widened = keyword.to_f64_vec().expect("widen REAL");
    assert_eq!(widened, vec![f64::from(0.1f32), 0.25]);
    assert!(matches!(keyword.values::<f64>(), Err(ResdataError::TypeMismatch { .. })));

    let double = Keyword::from_values("PRESSURE", &[1.0f64 / 3.0]).expect("DOUB keyword");
    assert_eq!(double.to_f32_lossy().expect("narrow DOUB"), vec![(1.0f64 / 3.0) as f32]);
}

#[test]
fn typed_access_checks_bounds_and_types() {
    let mut keyword = ints("NUMS", &[1, 2, 3]);
    keyword.iset(1, 20).expect("set element");
    assert_eq!(keyword.iget::<i32>(1).expect("get element"), 20);
    assert!(matches!(
        keyword.iget::<i32>(3),
        Err(ResdataError::IndexOutOfRange { index: 3, len: 3, .. })
    ));
    assert!(matches!(keyword.iget::<f32>(0), Err(ResdataError::TypeMismatch { .. })));
}

#[test]
fn logical_values_decode_any_nonzero_as_true() {
    let mut buffer = Vec::new();
    let mut writer = ResWriter::new(&mut buffer, StreamFormat::default());
    writer.write_keyword(&ints("LOGIHEAD", &[0, -1, 1])).expect("write");
    writer.finish().expect("flush");
    // Relabel the INTE header as LOGI; the payload is unchanged.
    let position = buffer.windows(4).position(|w| w == b"INTE").expect("type code");
    buffer[position..position + 4].copy_from_slice(b"LOGI");

    let mut reader = std::io::BufReader::new(Cursor::new(buffer));
    let keyword = decode_next(&mut reader, StreamFormat::default()).expect("decode LOGI");
    assert_eq!(keyword.values::<bool>().expect("LOGI values"), vec![false, true, true]);
}

#[test]
fn unknown_type_code_is_a_format_error() {
    let mut buffer = Vec::new();
    let mut writer = ResWriter::new(&mut buffer, StreamFormat::default());
    writer.write_keyword(&ints("SEQNUM", &[1])).expect("write");
    writer.finish().expect("flush");
    let position = buffer.windows(4).position(|w| w == b"INTE").expect("type code");
    buffer[position..position + 4].copy_from_slice(b"XXXX");

    let mut reader = std::io::BufReader::new(Cursor::new(buffer));
    let result = decode_next(&mut reader, StreamFormat::default());
    assert!(matches!(result, Err(ResdataError::Format(_))), "got {:?}", result);
}

#[test]
fn explicit_little_endian_open_matches_probe() {
    let dir = temp_dir();
    let format = StreamFormat::unformatted(Endianness::Little);
    let path = write_keywords(dir.path(), "LE.X", format, &[poro()]);
    let options = resdata_reader::OpenOptions::new().endian(resdata_reader::EndianMode::Little);
    let mut file = ResFile::open_with(&path, options).expect("open little endian");
    file.scan().expect("scan");
    assert_eq!(file.format(), format);
    assert_eq!(file.load_named("PORO", 0).expect("load PORO"), poro());
}
