//! 3D transformation utilities
//!
//! Matrices follow the row-vector convention: a homogeneous vertex `v` is
//! transformed as `v' = v * M`. Composition therefore reads left to right,
//! `a.then(b)` applies `a` first.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::point::{Matrix4f, Point3f, Vector3f, Vector4f};

/// An affine homogeneous transformation applied on the right of row vectors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4f,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4f::identity(),
        }
    }

    /// Rotation about the X axis by `degrees`
    pub fn rotation_x(degrees: f32) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self {
            matrix: Matrix4f::new(
                1.0, 0.0, 0.0, 0.0,
                0.0, c, s, 0.0,
                0.0, -s, c, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
        }
    }

    /// Rotation about the Y axis by `degrees`
    pub fn rotation_y(degrees: f32) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self {
            matrix: Matrix4f::new(
                c, 0.0, -s, 0.0,
                0.0, 1.0, 0.0, 0.0,
                s, 0.0, c, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
        }
    }

    /// Rotation about the Z axis by `degrees`
    pub fn rotation_z(degrees: f32) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self {
            matrix: Matrix4f::new(
                c, s, 0.0, 0.0,
                -s, c, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        let mut matrix = Matrix4f::identity();
        matrix[(3, 0)] = translation.x;
        matrix[(3, 1)] = translation.y;
        matrix[(3, 2)] = translation.z;
        Self { matrix }
    }

    /// Translation along X
    pub fn translation_x(distance: f32) -> Self {
        Self::translation(Vector3::new(distance, 0.0, 0.0))
    }

    /// Translation along Y
    pub fn translation_y(distance: f32) -> Self {
        Self::translation(Vector3::new(0.0, distance, 0.0))
    }

    /// Translation along Z
    pub fn translation_z(distance: f32) -> Self {
        Self::translation(Vector3::new(0.0, 0.0, distance))
    }

    /// Create a non-uniform scaling transformation
    pub fn scaling(sx: f32, sy: f32, sz: f32) -> Self {
        Self {
            matrix: Matrix4f::new_nonuniform_scaling(&Vector3::new(sx, sy, sz)),
        }
    }

    /// Create a uniform scaling transformation
    pub fn uniform_scaling(scale: f32) -> Self {
        Self::scaling(scale, scale, scale)
    }

    /// Apply the transformation to a homogeneous coordinate.
    ///
    /// The result always carries `w = 1`.
    pub fn apply(&self, v: &Vector4f) -> Vector4f {
        let mut out = (v.transpose() * self.matrix).transpose();
        out.w = 1.0;
        out
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3f) -> Point3f {
        let h = self.apply(&point.to_homogeneous());
        Point3f::new(h.x, h.y, h.z)
    }

    /// Apply the linear part of the transformation to a vector
    pub fn transform_vector(&self, vector: &Vector3f) -> Vector3f {
        let linear: Matrix3<f32> = self.matrix.fixed_view::<3, 3>(0, 0).into_owned();
        (vector.transpose() * linear).transpose()
    }

    /// The transformation that applies `self` first and then `other`
    pub fn then(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Get the inverse transformation
    pub fn inverse(self) -> Option<Self> {
        self.matrix.try_inverse().map(|inv_matrix| Self {
            matrix: inv_matrix,
        })
    }

    /// Check if this is approximately the identity transformation
    pub fn is_identity(&self, epsilon: f32) -> bool {
        let identity = Matrix4f::identity();
        (self.matrix - identity).norm() < epsilon
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Self;

    /// `a * b` applies `a` first, matching `v * A * B`.
    fn mul(self, rhs: Self) -> Self::Output {
        self.then(rhs)
    }
}

impl From<Matrix4f> for Transform3D {
    fn from(matrix: Matrix4f) -> Self {
        Self { matrix }
    }
}
