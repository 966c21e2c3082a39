//! Wavefront OBJ support
//!
//! Only positions and triangular faces are read; `vn`, `vt`, groups and
//! materials are ignored. Loaded meshes get freshly computed normals.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use meshcraft_core::{Mesh, Point3f, StlEncoding, Triangle, Vector3f};
use tracing::debug;

use crate::error::{IoError, IoResult};
use crate::stamp::Stamp;

/// Options for OBJ writing
#[derive(Debug, Clone)]
pub struct ObjWriteOptions {
    /// Recompute facet normals from the vertices before writing
    pub update_normals: bool,
    /// Producer and time written into the header comments, taken at write
    /// time when unset
    pub stamp: Option<Stamp>,
}

impl Default for ObjWriteOptions {
    fn default() -> Self {
        Self {
            update_normals: true,
            stamp: None,
        }
    }
}

impl ObjWriteOptions {
    pub fn with_update_normals(mut self, update_normals: bool) -> Self {
        self.update_normals = update_normals;
        self
    }

    pub fn with_stamp(mut self, stamp: Stamp) -> Self {
        self.stamp = Some(stamp);
        self
    }
}

/// A face as read, before its indices are resolved.
struct FaceRef {
    line: usize,
    indices: [usize; 3],
}

fn parse_position<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Option<Point3f> {
    let mut coords = [0f32; 3];
    for c in coords.iter_mut() {
        *c = tokens.next()?.parse().ok()?;
    }
    Some(Point3f::new(coords[0], coords[1], coords[2]))
}

fn parse_face<'a>(line: usize, tokens: impl Iterator<Item = &'a str>) -> IoResult<FaceRef> {
    let tokens: Vec<&str> = tokens.collect();
    if tokens.len() != 3 {
        return Err(IoError::TextParse {
            line,
            message: format!("expected 3 face indices, got {}", tokens.len()),
        });
    }

    let mut indices = [0usize; 3];
    for (index, token) in indices.iter_mut().zip(&tokens) {
        let first = token.split('/').next().unwrap_or_default();
        *index = match first.parse::<usize>() {
            Ok(i) if i > 0 => i,
            _ => {
                return Err(IoError::TextParse {
                    line,
                    message: format!("invalid face index {token:?}"),
                })
            }
        };
    }

    Ok(FaceRef { line, indices })
}

/// Read an OBJ mesh. `name` becomes the mesh name.
pub fn read_obj<R: BufRead>(reader: R, name: &str) -> IoResult<Mesh> {
    let mut positions = Vec::new();
    let mut faces = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = i + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                if let Some(position) = parse_position(tokens) {
                    positions.push(position);
                }
            }
            Some("f") => faces.push(parse_face(line_number, tokens)?),
            _ => {}
        }
    }

    let mut mesh = Mesh::with_capacity(name, StlEncoding::Binary, faces.len());
    for face in &faces {
        let mut vertices = [Point3f::origin(); 3];
        for (vertex, &index) in vertices.iter_mut().zip(&face.indices) {
            *vertex = *positions.get(index - 1).ok_or_else(|| IoError::TextParse {
                line: face.line,
                message: format!(
                    "face index {index} out of range ({} vertices)",
                    positions.len()
                ),
            })?;
        }
        let [v0, v1, v2] = vertices;
        mesh.push_triangle(Triangle::new(v0, v1, v2), Vector3f::zeros(), 0);
    }
    mesh.update_normals();

    Ok(mesh)
}

/// Load an OBJ file, named after the path
pub fn load_obj<P: AsRef<Path>>(path: P) -> IoResult<Mesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::open(path, e))?;
    let mesh = read_obj(BufReader::new(file), &path.display().to_string())?;
    debug!(path = %path.display(), triangles = mesh.len(), "loaded OBJ");
    Ok(mesh)
}

/// Insertion-ordered set of vectors keyed by their printed form.
#[derive(Default)]
struct Dedup {
    index: HashMap<String, usize>,
    values: Vec<[f32; 3]>,
}

impl Dedup {
    /// 1-based index of `value`, inserting it if unseen
    fn insert(&mut self, value: [f32; 3]) -> usize {
        let key = format!("{},{},{}", value[0], value[1], value[2]);
        let next = self.values.len();
        let i = *self.index.entry(key).or_insert(next);
        if i == next {
            self.values.push(value);
        }
        i + 1
    }
}

/// Write `mesh` as OBJ with shared positions and per-face normals.
/// The mesh itself is not modified.
pub fn write_obj<W: Write>(mesh: &Mesh, writer: &mut W, options: &ObjWriteOptions) -> IoResult<()> {
    let computed;
    let normals = if options.update_normals {
        computed = mesh.computed_normals();
        &computed[..]
    } else {
        mesh.normals()
    };

    let mut positions = Dedup::default();
    let mut normal_table = Dedup::default();
    let faces: Vec<([usize; 3], usize)> = mesh
        .triangles()
        .iter()
        .zip(normals)
        .map(|(triangle, normal)| {
            let [a, b, c] = triangle.coords().map(|v| positions.insert(v));
            let n = normal_table.insert([normal.x, normal.y, normal.z]);
            ([a, b, c], n)
        })
        .collect();

    let stamp = options.stamp.clone().unwrap_or_else(Stamp::now);
    writeln!(writer, "# {} {}", stamp.tool, stamp.version)?;
    writeln!(writer, "# {}", stamp.timestamp_text())?;
    writeln!(writer, "# {}", stamp.url)?;
    writeln!(writer)?;

    for [x, y, z] in &positions.values {
        writeln!(writer, "v {x} {y} {z}")?;
    }
    for [x, y, z] in &normal_table.values {
        writeln!(writer, "vn {x} {y} {z}")?;
    }
    for ([a, b, c], n) in faces {
        writeln!(writer, "f {a}//{n} {b}//{n} {c}//{n}")?;
    }

    Ok(())
}

/// Save an OBJ file
pub fn save_obj<P: AsRef<Path>>(mesh: &Mesh, path: P, options: &ObjWriteOptions) -> IoResult<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_obj(mesh, &mut writer, options)?;
    writer.flush()?;
    debug!(path = %path.display(), triangles = mesh.len(), "saved OBJ");
    Ok(())
}
