//! Binary STL records
//!
//! ```text
//! UINT8[80]    - Header
//! UINT32       - Number of triangles
//! foreach triangle
//!     REAL32[3] - Normal vector
//!     REAL32[3] - Vertex 1
//!     REAL32[3] - Vertex 2
//!     REAL32[3] - Vertex 3
//!     UINT16    - Attribute word
//! end
//! ```

use std::io::{ErrorKind, Read, Write};
use std::mem::{offset_of, size_of};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use meshcraft_core::{Mesh, StlEncoding, Triangle, Vector3f};

use crate::error::{IoError, IoResult};
use crate::stamp::Stamp;

/// STL binary header size in bytes.
pub const HEADER_SIZE: usize = 80;

/// Size of the little-endian triangle count following the header.
pub const COUNT_SIZE: usize = 4;

/// Size of one triangle record (normal + 3 vertices + attribute).
pub const RECORD_SIZE: usize = 50;

/// Counts above this are treated as a corrupt or misdetected header.
pub const MAX_COUNT: u32 = 1_000_000;

/// One binary STL triangle record, laid out exactly as on disk.
///
/// Fields of a packed struct must be copied out before use; never take
/// references to them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C, packed)]
pub struct FacetRecord {
    pub normal: [f32; 3],
    pub vertices: [[f32; 3]; 3],
    pub attribute: u16,
}

const _: () = assert!(size_of::<FacetRecord>() == RECORD_SIZE);
const _: () = assert!(offset_of!(FacetRecord, normal) == 0);
const _: () = assert!(offset_of!(FacetRecord, vertices) == 12);
const _: () = assert!(offset_of!(FacetRecord, attribute) == 48);

impl FacetRecord {
    pub fn new(normal: [f32; 3], vertices: [[f32; 3]; 3], attribute: u16) -> Self {
        Self { normal, vertices, attribute }
    }

    pub fn from_triangle(triangle: &Triangle, normal: &Vector3f, attribute: u16) -> Self {
        Self::new([normal.x, normal.y, normal.z], triangle.coords(), attribute)
    }

    /// Decode a little-endian record
    pub fn decode(bytes: &[u8; RECORD_SIZE]) -> Self {
        let mut floats = [0f32; 12];
        LittleEndian::read_f32_into(&bytes[..48], &mut floats);
        let attribute = LittleEndian::read_u16(&bytes[48..]);
        Self {
            normal: [floats[0], floats[1], floats[2]],
            vertices: [
                [floats[3], floats[4], floats[5]],
                [floats[6], floats[7], floats[8]],
                [floats[9], floats[10], floats[11]],
            ],
            attribute,
        }
    }

    /// Encode as a little-endian record
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let normal = self.normal;
        let vertices = self.vertices;
        let attribute = self.attribute;

        let mut floats = [0f32; 12];
        floats[..3].copy_from_slice(&normal);
        for (i, v) in vertices.iter().enumerate() {
            floats[3 + i * 3..6 + i * 3].copy_from_slice(v);
        }

        let mut bytes = [0u8; RECORD_SIZE];
        LittleEndian::write_f32_into(&floats, &mut bytes[..48]);
        LittleEndian::write_u16(&mut bytes[48..], attribute);
        bytes
    }

    pub fn normal_vector(&self) -> Vector3f {
        let [x, y, z] = self.normal;
        Vector3f::new(x, y, z)
    }

    pub fn triangle(&self) -> Triangle {
        Triangle::from_coords(self.vertices)
    }
}

/// Render the 80-byte header: `<tool> (<version>) <timestamp> <name>`,
/// truncated and space padded.
pub fn header_bytes(stamp: &Stamp, name: &str) -> [u8; HEADER_SIZE] {
    let text = format!(
        "{} ({}) {} {}",
        stamp.tool,
        stamp.version,
        stamp.timestamp_text(),
        name
    );
    let mut header = [b' '; HEADER_SIZE];
    let len = text.len().min(HEADER_SIZE);
    header[..len].copy_from_slice(&text.as_bytes()[..len]);
    header
}

/// Header text up to the first NUL byte, trimmed
fn header_name(header: &[u8]) -> String {
    let end = header.iter().position(|&b| b == 0).unwrap_or(header.len());
    String::from_utf8_lossy(&header[..end]).trim().to_string()
}

/// Read a binary STL body given the already consumed header.
///
/// The count is checked against [`MAX_COUNT`] before anything is allocated.
pub fn read_binary<R: Read>(header: &[u8], reader: &mut R) -> IoResult<Mesh> {
    if header.len() < HEADER_SIZE {
        return Err(IoError::InvalidHeader {
            expected: HEADER_SIZE + COUNT_SIZE,
            got: header.len(),
        });
    }

    let count = reader.read_u32::<LittleEndian>().map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            IoError::InvalidHeader {
                expected: HEADER_SIZE + COUNT_SIZE,
                got: HEADER_SIZE,
            }
        } else {
            IoError::Io(e)
        }
    })?;

    if count > MAX_COUNT {
        return Err(IoError::OversizedCount {
            count: u64::from(count),
            max: u64::from(MAX_COUNT),
        });
    }

    let mut mesh = Mesh::with_capacity(header_name(header), StlEncoding::Binary, count as usize);
    let mut buf = [0u8; RECORD_SIZE];
    for i in 0..count {
        reader.read_exact(&mut buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                IoError::Truncated { expected: count, got: i }
            } else {
                IoError::Io(e)
            }
        })?;
        let record = FacetRecord::decode(&buf);
        mesh.push_triangle(record.triangle(), record.normal_vector(), record.attribute);
    }

    Ok(mesh)
}

/// Write `mesh` as binary STL with the given facet normals
pub fn write_binary<W: Write>(
    mesh: &Mesh,
    normals: &[Vector3f],
    writer: &mut W,
    name: &str,
    stamp: &Stamp,
) -> IoResult<()> {
    let count = u32::try_from(mesh.len()).map_err(|_| IoError::OversizedCount {
        count: mesh.len() as u64,
        max: u64::from(u32::MAX),
    })?;

    writer.write_all(&header_bytes(stamp, name))?;
    writer.write_u32::<LittleEndian>(count)?;

    let records = mesh
        .triangles()
        .iter()
        .zip(normals)
        .zip(mesh.attributes())
        .map(|((triangle, normal), &attribute)| FacetRecord::from_triangle(triangle, normal, attribute));
    for record in records {
        writer.write_all(&record.encode())?;
    }

    Ok(())
}
