//! Core data structures and traits for meshcraft
//!
//! This crate provides the in-memory triangle soup (`Mesh`), the homogeneous
//! transforms applied to it, and the analysis helpers (face normals, signed
//! volume, bounds) that the codecs in `meshcraft-io` build on.

pub mod point;
pub mod mesh;
pub mod traits;
pub mod transform;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Vector4, Matrix4};
