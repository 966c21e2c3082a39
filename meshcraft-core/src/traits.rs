//! Core traits for meshcraft

use crate::{mesh::*, point::*, transform::Transform3D};

/// Trait for objects with spatial extent
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f;
}

/// Trait for objects that can be transformed
pub trait Transformable {
    /// Apply a transformation to the object
    fn transform(&mut self, transform: &Transform3D);
}

impl Transformable for Mesh {
    fn transform(&mut self, transform: &Transform3D) {
        Mesh::transform(self, transform);
    }
}

impl Drawable for Mesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        let mut vertices = self.triangles().iter().flat_map(|t| t.vertices());
        let Some(first) = vertices.next() else {
            return (Point3f::origin(), Point3f::origin());
        };

        let mut min = first;
        let mut max = first;

        for vertex in vertices {
            min.x = min.x.min(vertex.x);
            min.y = min.y.min(vertex.y);
            min.z = min.z.min(vertex.z);

            max.x = max.x.max(vertex.x);
            max.y = max.y.max(vertex.y);
            max.z = max.z.max(vertex.z);
        }

        (min, max)
    }

    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        )
    }
}
