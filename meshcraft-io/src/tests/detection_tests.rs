//! STL encoding detection and multi-solid reading

use std::io::{Cursor, Read};

use meshcraft_core::StlEncoding;

use crate::error::IoError;
use crate::stl::ascii::MAX_LINE_LENGTH;
use crate::stl::binary::{FacetRecord, HEADER_SIZE};
use crate::stl::{load_stl, looks_like_ascii, read_stl, read_stl_solids, read_stl_stream, StlMode};

const TRIANGLE: &str = "solid {name}\n\
    facet normal 0 0 1\n\
    outer loop\n\
    vertex 0 0 0\n\
    vertex 1 0 0\n\
    vertex 0 1 0\n\
    endloop\n\
    endfacet\n\
    endsolid {name}\n";

fn ascii_solid(name: &str) -> String {
    TRIANGLE.replace("{name}", name)
}

/// Binary STL with the given raw header text and `count` unit triangles.
fn binary_stl(header_text: &[u8], count: u32) -> Vec<u8> {
    let mut data = header_text.to_vec();
    data.resize(HEADER_SIZE, 0);
    data.extend_from_slice(&count.to_le_bytes());
    let record = FacetRecord::new(
        [0.0, 0.0, 1.0],
        [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        3,
    );
    for _ in 0..count {
        data.extend_from_slice(&record.encode());
    }
    data
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("meshcraft_io=trace")
        .try_init();
}

/// Reader handing out one byte per call.
struct Trickle<R>(R);

impl<R: Read> Read for Trickle<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let len = buf.len().min(1);
        self.0.read(&mut buf[..len])
    }
}

#[test]
fn test_plain_binary_header() {
    let data = binary_stl(b"exported by some tool", 2);
    let mesh = read_stl(&mut Cursor::new(data), StlMode::Auto).unwrap();
    assert_eq!(mesh.encoding(), StlEncoding::Binary);
    assert_eq!(mesh.len(), 2);
    assert_eq!(mesh.name(), "exported by some tool");
    assert_eq!(mesh.attributes(), &[3, 3]);
}

#[test]
fn test_binary_header_starting_with_solid() {
    let data = binary_stl(b"solid but actually binary", 3);
    let mesh = read_stl(&mut Cursor::new(data.clone()), StlMode::Auto).unwrap();
    assert_eq!(mesh.encoding(), StlEncoding::Binary);
    assert_eq!(mesh.len(), 3);

    // The failure happens inside the header, so a plain stream recovers too.
    let mesh = read_stl_stream(&mut Cursor::new(data), StlMode::Auto).unwrap();
    assert_eq!(mesh.len(), 3);
}

#[test]
fn test_binary_header_with_solid_line_needs_seek() {
    init_tracing();
    let data = binary_stl(b"solid part\n", 4);

    let mesh = read_stl(&mut Cursor::new(data.clone()), StlMode::Auto).unwrap();
    assert_eq!(mesh.encoding(), StlEncoding::Binary);
    assert_eq!(mesh.len(), 4);

    let err = read_stl_stream(&mut Cursor::new(data), StlMode::Auto).unwrap_err();
    assert!(matches!(err, IoError::AsciiParse { recoverable: false, .. }));
}

#[test]
fn test_uppercase_solid_is_ascii() {
    let text = ascii_solid("Loud").replace("solid Loud", "SOLID Loud");
    let mesh = read_stl(&mut Cursor::new(text), StlMode::Auto).unwrap();
    assert_eq!(mesh.encoding(), StlEncoding::Ascii);
    assert_eq!(mesh.name(), "Loud");
    assert_eq!(mesh.len(), 1);
}

#[test]
fn test_empty_input() {
    for input in ["", "   \n\t\n"] {
        let err = read_stl(&mut Cursor::new(input), StlMode::Auto).unwrap_err();
        assert!(matches!(err, IoError::FormatDetection { .. }), "{input:?}");
    }
}

#[test]
fn test_unreadable_either_way() {
    let err = read_stl(&mut Cursor::new("solid junk\nnothing here\n"), StlMode::Auto).unwrap_err();
    match err {
        IoError::FormatDetection { ascii, binary } => {
            assert!(ascii.contains("facet normal"));
            assert!(binary.contains("header"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_oversized_count() {
    let data = binary_stl(b"plain header", 0);
    let mut data = data[..HEADER_SIZE].to_vec();
    data.extend_from_slice(&2_000_000u32.to_le_bytes());
    let err = read_stl(&mut Cursor::new(data), StlMode::Auto).unwrap_err();
    assert!(matches!(err, IoError::OversizedCount { count: 2_000_000, .. }));

    // Behind a "solid" header the same count means neither encoding fits.
    let mut data = b"solid".to_vec();
    data.resize(HEADER_SIZE, b' ');
    data.extend_from_slice(&2_000_000u32.to_le_bytes());
    let err = read_stl(&mut Cursor::new(data), StlMode::Auto).unwrap_err();
    assert!(matches!(err, IoError::FormatDetection { .. }));
}

#[test]
fn test_forced_modes() {
    let data = binary_stl(b"solid but actually binary", 1);
    let err = read_stl(&mut Cursor::new(data.clone()), StlMode::Ascii).unwrap_err();
    assert!(matches!(err, IoError::AsciiParse { .. }));

    let mesh = read_stl(&mut Cursor::new(data), StlMode::Binary).unwrap();
    assert_eq!(mesh.len(), 1);
}

#[test]
fn test_long_solid_line_in_ascii_mode() {
    let name = "n".repeat(120);
    let mesh = read_stl(&mut Cursor::new(ascii_solid(&name)), StlMode::Ascii).unwrap();
    assert_eq!(mesh.name(), name);
    assert_eq!(mesh.len(), 1);
}

#[test]
fn test_long_solid_line_in_auto_mode() {
    let name = "n".repeat(120);
    let text = ascii_solid(&name);
    let mesh = read_stl(&mut Cursor::new(text.clone()), StlMode::Auto).unwrap();
    assert_eq!(mesh.encoding(), StlEncoding::Ascii);
    assert_eq!(mesh.name(), name);
    assert_eq!(mesh.len(), 1);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.stl");
    std::fs::write(&path, text).unwrap();
    let mesh = load_stl(&path, StlMode::Auto).unwrap();
    assert_eq!(mesh.name(), name);
}

#[test]
fn test_binary_without_line_breaks_stops_at_line_limit() {
    let mut data = b"solid".to_vec();
    data.resize(HEADER_SIZE, b'x');
    let count = (MAX_LINE_LENGTH / 40) as u32;
    data.extend_from_slice(&count.to_le_bytes());
    let record = FacetRecord::new([0.0, 0.0, 1.0], [[1.0; 3], [2.0; 3], [4.0; 3]], 0);
    for _ in 0..count {
        data.extend_from_slice(&record.encode());
    }
    let mesh = read_stl(&mut Cursor::new(data), StlMode::Auto).unwrap();
    assert_eq!(mesh.encoding(), StlEncoding::Binary);
    assert_eq!(mesh.len(), count as usize);
}

#[test]
fn test_leading_whitespace_before_solid_is_binary() {
    assert!(looks_like_ascii(b"SoLiD x"));
    assert!(!looks_like_ascii(b"  solid x"));
    assert!(!looks_like_ascii(b"sol"));

    let data = binary_stl(b"  solid but binary", 2);
    let mesh = read_stl(&mut Cursor::new(data), StlMode::Auto).unwrap();
    assert_eq!(mesh.encoding(), StlEncoding::Binary);
    assert_eq!(mesh.name(), "solid but binary");
    assert_eq!(mesh.len(), 2);
}

#[test]
fn test_stream_reads_byte_by_byte() {
    let text = ascii_solid("trickle");
    let mut reader = Trickle(Cursor::new(text));
    let mesh = read_stl_stream(&mut reader, StlMode::Auto).unwrap();
    assert_eq!(mesh.name(), "trickle");
    assert_eq!(mesh.len(), 1);
}

#[test]
fn test_reader_left_after_endsolid() {
    let first = ascii_solid("first");
    let text = format!("{first}{}", ascii_solid("second"));
    let mut cursor = Cursor::new(text);
    let mesh = read_stl(&mut cursor, StlMode::Auto).unwrap();
    assert_eq!(mesh.name(), "first");
    assert_eq!(cursor.position(), first.len() as u64);

    let mesh = read_stl(&mut cursor, StlMode::Auto).unwrap();
    assert_eq!(mesh.name(), "second");
}

#[test]
fn test_multiple_solids() {
    init_tracing();
    let text = format!(
        "{}{}\n{}\n\n",
        ascii_solid("a"),
        ascii_solid("b"),
        ascii_solid("c")
    );
    let solids = read_stl_solids(&mut Cursor::new(text)).unwrap();
    let names: Vec<&str> = solids.iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert!(solids.iter().all(|m| m.len() == 1));
}

#[test]
fn test_multiple_solids_after_long_blank_runs() {
    let text = format!(
        "{}{}{}{}",
        ascii_solid("a"),
        "\n".repeat(100),
        ascii_solid("b"),
        " \r\n\t".repeat(50)
    );
    let solids = read_stl_solids(&mut Cursor::new(text)).unwrap();
    let names: Vec<&str> = solids.iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_multiple_solids_of_binary_input() {
    let data = binary_stl(b"binary", 2);
    let solids = read_stl_solids(&mut Cursor::new(data)).unwrap();
    assert_eq!(solids.len(), 1);
    assert_eq!(solids[0].len(), 2);
}
