//! Point and vector types and related functionality

use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A homogeneous `[x, y, z, w]` coordinate
pub type Vector4f = Vector4<f32>;

/// A 4x4 homogeneous matrix
pub type Matrix4f = Matrix4<f32>;

/// Lift a point into homogeneous coordinates with `w = 1`.
#[inline]
pub fn to_homogeneous(point: &Point3f) -> Vector4f {
    Vector4f::new(point.x, point.y, point.z, 1.0)
}

/// Drop the `w` component of a homogeneous coordinate.
///
/// No perspective divide is performed: every transform in this crate is
/// affine and keeps `w` at one.
#[inline]
pub fn from_homogeneous(v: &Vector4f) -> Point3f {
    Point3f::new(v.x, v.y, v.z)
}

/// Unit normal of the plane through three points, following their winding.
///
/// A degenerate triangle has a zero-length cross product; the zero vector is
/// returned as is instead of being divided by zero.
pub fn face_normal(v0: &Point3f, v1: &Point3f, v2: &Point3f) -> Vector3f {
    let cross = (v1 - v0).cross(&(v2 - v0));
    let norm = cross.norm();
    if norm != 0.0 {
        cross / norm
    } else {
        cross
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homogeneous_roundtrip() {
        let p = Point3f::new(1.5, -2.0, 3.25);
        let h = to_homogeneous(&p);
        assert_eq!(h.w, 1.0);
        assert_eq!(from_homogeneous(&h), p);
    }

    #[test]
    fn test_face_normal_ccw() {
        let n = face_normal(
            &Point3f::new(0.0, 0.0, 0.0),
            &Point3f::new(1.0, 0.0, 0.0),
            &Point3f::new(0.0, 1.0, 0.0),
        );
        assert_eq!(n, Vector3f::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_face_normal_degenerate_is_zero() {
        let p = Point3f::new(1.0, 1.0, 1.0);
        let n = face_normal(&p, &p, &Point3f::new(2.0, 2.0, 2.0));
        assert_eq!(n, Vector3f::zeros());
        assert!(n.iter().all(|c| c.is_finite()));
    }
}
