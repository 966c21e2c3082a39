//! I/O operations for triangle meshes
//!
//! This crate reads and writes STL (ASCII and binary, with auto-detection)
//! and Wavefront OBJ files into the [`Mesh`] type from `meshcraft-core`.

pub mod error;
pub mod obj;
pub mod registry;
pub mod stamp;
pub mod stl;

pub use error::*;
pub use obj::{load_obj, read_obj, save_obj, write_obj, ObjWriteOptions};
pub use registry::{IoRegistry, MeshCodec, MeshFormat, ObjCodec, StlCodec};
pub use stamp::Stamp;
pub use stl::{
    load_stl, read_stl, read_stl_solids, read_stl_stream, save_stl, write_stl, StlMode,
    StlWriteOptions,
};

use std::path::Path;

use meshcraft_core::Mesh;

/// Read a mesh, choosing the codec from the file extension
pub fn read_mesh<P: AsRef<Path>>(path: P) -> IoResult<Mesh> {
    IoRegistry::default().read_mesh(path.as_ref())
}

/// Write a mesh, choosing the codec from the file extension
pub fn write_mesh<P: AsRef<Path>>(mesh: &Mesh, path: P) -> IoResult<()> {
    IoRegistry::default().write_mesh(mesh, path.as_ref())
}

#[cfg(test)]
mod tests;
