//! # meshcraft
//!
//! Load, transform and save triangle meshes.
//!
//! This is the umbrella crate that re-exports the workspace crates. Use the
//! individual crates for more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: the `Mesh` triangle soup, `Transform3D`, normals and volume
//! - **I/O**: STL (ASCII and binary, auto-detected) and Wavefront OBJ
//!
//! ## Quick Start
//!
//! ```rust
//! use std::io::Cursor;
//! use meshcraft::prelude::*;
//!
//! let mut mesh = Mesh::new();
//! mesh.push_triangle(
//!     Triangle::from_coords([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
//!     Vector3f::zeros(),
//!     0,
//! );
//! mesh.rotate_x(90.0);
//! mesh.translate_z(2.0);
//!
//! let mut bytes = Vec::new();
//! write_stl(&mesh, &mut bytes, "demo", &StlWriteOptions::ascii())?;
//! let back = read_stl(&mut Cursor::new(bytes), StlMode::Auto)?;
//! assert_eq!(back.len(), 1);
//! # Ok::<(), meshcraft::io::IoError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables io
//! - `io`: STL and OBJ codecs

// Re-export core functionality
pub use meshcraft_core::*;

#[cfg(feature = "io")]
pub use meshcraft_io as io;

/// Convenient imports for common use cases
pub mod prelude {
    pub use meshcraft_core::{
        Drawable, Mesh, MeshParts, Point3f, StlEncoding, Transform3D, Transformable, Triangle,
        Vector3f,
    };

    #[cfg(feature = "io")]
    pub use meshcraft_io::{
        load_obj, load_stl, read_mesh, read_stl, save_obj, save_stl, write_mesh, write_stl,
        IoError, IoResult, MeshFormat, ObjWriteOptions, StlMode, StlWriteOptions,
    };
}
