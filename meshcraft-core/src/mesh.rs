//! Mesh data structures and functionality

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::point::*;
use crate::transform::Transform3D;

/// Name given to a mesh that was not loaded from any source.
pub const EMPTY_MESH_NAME: &str = "empty";

/// Encoding a triangulation (STL) mesh was read with.
///
/// Only consulted by the STL writer when the caller leaves the output
/// encoding on automatic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StlEncoding {
    Ascii,
    #[default]
    Binary,
}

/// A triangle stored as three homogeneous `[x, y, z, 1]` vertices
///
/// Serialized as its three `[x, y, z]` coordinates, so a deserialized
/// triangle always has `w == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f32; 3]; 3]", into = "[[f32; 3]; 3]")]
pub struct Triangle {
    vertices: [Vector4f; 3],
}

impl From<[[f32; 3]; 3]> for Triangle {
    fn from(coords: [[f32; 3]; 3]) -> Self {
        Self::from_coords(coords)
    }
}

impl From<Triangle> for [[f32; 3]; 3] {
    fn from(triangle: Triangle) -> Self {
        triangle.coords()
    }
}

impl Triangle {
    /// Create a triangle from three points
    pub fn new(v0: Point3f, v1: Point3f, v2: Point3f) -> Self {
        Self {
            vertices: [to_homogeneous(&v0), to_homogeneous(&v1), to_homogeneous(&v2)],
        }
    }

    /// Create a triangle from raw `[x, y, z]` coordinates
    pub fn from_coords(coords: [[f32; 3]; 3]) -> Self {
        let [a, b, c] = coords;
        Self::new(
            Point3f::new(a[0], a[1], a[2]),
            Point3f::new(b[0], b[1], b[2]),
            Point3f::new(c[0], c[1], c[2]),
        )
    }

    /// The homogeneous vertices
    pub fn homogeneous(&self) -> &[Vector4f; 3] {
        &self.vertices
    }

    /// Vertex `index` (0..3) as a point
    pub fn vertex(&self, index: usize) -> Point3f {
        from_homogeneous(&self.vertices[index])
    }

    /// All three vertices as points
    pub fn vertices(&self) -> [Point3f; 3] {
        [self.vertex(0), self.vertex(1), self.vertex(2)]
    }

    /// All three vertices as raw coordinates
    pub fn coords(&self) -> [[f32; 3]; 3] {
        self.vertices.map(|v| [v.x, v.y, v.z])
    }

    /// Unit normal following the winding, or zero for a degenerate triangle
    pub fn normal(&self) -> Vector3f {
        let [v0, v1, v2] = self.vertices();
        face_normal(&v0, &v1, &v2)
    }

    /// Signed volume of the tetrahedron spanned by the triangle and the origin
    pub fn signed_volume(&self) -> f64 {
        let [v0, v1, v2] = self.vertices().map(|v| v.coords.cast::<f64>());
        v0.dot(&v1.cross(&v2)) / 6.0
    }

    fn transform(&mut self, transform: &Transform3D) {
        for v in &mut self.vertices {
            *v = transform.apply(v);
        }
    }
}

/// A triangle soup with per-triangle normals and attribute words.
///
/// `triangles`, `normals` and `attributes` always have the same length and
/// are index aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MeshParts")]
pub struct Mesh {
    name: String,
    encoding: StlEncoding,
    triangles: Vec<Triangle>,
    normals: Vec<Vector3f>,
    attributes: Vec<u16>,
}

/// Unvalidated mesh contents, as deserialized or taken apart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshParts {
    pub name: String,
    pub encoding: StlEncoding,
    pub triangles: Vec<Triangle>,
    pub normals: Vec<Vector3f>,
    pub attributes: Vec<u16>,
}

impl TryFrom<MeshParts> for Mesh {
    type Error = Error;

    fn try_from(parts: MeshParts) -> Result<Self> {
        Mesh::from_parts(parts)
    }
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            name: EMPTY_MESH_NAME.to_string(),
            encoding: StlEncoding::Binary,
            triangles: Vec::new(),
            normals: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Create an empty mesh with room for `capacity` triangles
    pub fn with_capacity(name: impl Into<String>, encoding: StlEncoding, capacity: usize) -> Self {
        Self {
            name: name.into(),
            encoding,
            triangles: Vec::with_capacity(capacity),
            normals: Vec::with_capacity(capacity),
            attributes: Vec::with_capacity(capacity),
        }
    }

    /// Assemble a mesh, checking that all per-triangle sequences line up
    pub fn from_parts(parts: MeshParts) -> Result<Self> {
        let MeshParts { name, encoding, triangles, normals, attributes } = parts;
        if normals.len() != triangles.len() || attributes.len() != triangles.len() {
            return Err(Error::InvalidData(format!(
                "mesh '{}' has {} triangles but {} normals and {} attributes",
                name,
                triangles.len(),
                normals.len(),
                attributes.len()
            )));
        }
        Ok(Self { name, encoding, triangles, normals, attributes })
    }

    /// Take the mesh apart into its sequences
    pub fn into_parts(self) -> MeshParts {
        MeshParts {
            name: self.name,
            encoding: self.encoding,
            triangles: self.triangles,
            normals: self.normals,
            attributes: self.attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn encoding(&self) -> StlEncoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: StlEncoding) {
        self.encoding = encoding;
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn normals(&self) -> &[Vector3f] {
        &self.normals
    }

    pub fn attributes(&self) -> &[u16] {
        &self.attributes
    }

    /// Get the number of triangles
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Append a triangle together with its stored normal and attribute word
    pub fn push_triangle(&mut self, triangle: Triangle, normal: Vector3f, attribute: u16) {
        self.triangles.push(triangle);
        self.normals.push(normal);
        self.attributes.push(attribute);
    }

    /// Right-multiply every vertex by `transform`
    pub fn transform(&mut self, transform: &Transform3D) {
        for triangle in &mut self.triangles {
            triangle.transform(transform);
        }
    }

    /// Rotate around the X axis (degrees)
    pub fn rotate_x(&mut self, degrees: f32) {
        self.transform(&Transform3D::rotation_x(degrees));
    }

    /// Rotate around the Y axis (degrees)
    pub fn rotate_y(&mut self, degrees: f32) {
        self.transform(&Transform3D::rotation_y(degrees));
    }

    /// Rotate around the Z axis (degrees)
    pub fn rotate_z(&mut self, degrees: f32) {
        self.transform(&Transform3D::rotation_z(degrees));
    }

    pub fn translate_x(&mut self, distance: f32) {
        self.transform(&Transform3D::translation_x(distance));
    }

    pub fn translate_y(&mut self, distance: f32) {
        self.transform(&Transform3D::translation_y(distance));
    }

    pub fn translate_z(&mut self, distance: f32) {
        self.transform(&Transform3D::translation_z(distance));
    }

    /// Scale independently along each axis
    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) {
        self.transform(&Transform3D::scaling(sx, sy, sz));
    }

    /// Face normals computed from the current geometry
    pub fn computed_normals(&self) -> Vec<Vector3f> {
        self.triangles.iter().map(Triangle::normal).collect()
    }

    /// Replace the stored normals with ones computed from the geometry
    pub fn update_normals(&mut self) {
        self.normals = self.computed_normals();
    }

    /// Signed enclosed volume, summed over origin tetrahedra.
    ///
    /// Only meaningful for closed meshes with consistent winding; neither
    /// property is checked. Outward-facing counter-clockwise winding gives a
    /// positive result.
    pub fn volume(&self) -> f64 {
        self.triangles.iter().map(Triangle::signed_volume).sum()
    }

    /// Append the triangles, normals and attributes of `other`
    pub fn join(&mut self, other: &Mesh) {
        self.triangles.extend_from_slice(&other.triangles);
        self.normals.extend_from_slice(&other.normals);
        self.attributes.extend_from_slice(&other.attributes);
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
