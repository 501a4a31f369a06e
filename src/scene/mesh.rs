//! Mesh instances supplied by the host and the triangles extracted from them.

use glam::{Mat4, Vec3};

use crate::material::{Material, MaterialProperties};

/// One mesh instance from the host's scene: local geometry plus a
/// local-to-world transform and the shading properties to resolve.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    /// Name used in logs and error reports.
    pub name: String,
    /// Local-to-world transform.
    pub transform: Mat4,
    /// Local-space vertex positions.
    pub vertices: Vec<Vec3>,
    /// Triangle index list, three entries per triangle.
    pub indices: Vec<u32>,
    /// Named shading properties (resolved once per instance).
    pub material: MaterialProperties,
}

impl MeshInstance {
    /// Number of whole triangles the index list describes.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A world-space triangle with one flat normal and its own material copy.
///
/// Created once per extraction pass and never mutated.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v1: Vec3,
    pub v2: Vec3,
    pub v3: Vec3,
    /// Unit flat normal, `normalize(cross(v3 - v1, v2 - v1))`.
    pub normal: Vec3,
    pub material: Material,
}

impl Triangle {
    /// Flat normal for the given winding. The winding matches the kernel's
    /// shading assumption and must not be flipped.
    pub fn face_normal(v1: Vec3, v2: Vec3, v3: Vec3) -> Vec3 {
        (v3 - v1).cross(v2 - v1).normalize()
    }
}

/// A sphere resting on or above the ground plane.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub center: Vec3,
    /// Radius, > 0.
    pub radius: f32,
    pub material: Material,
}

/// Overlap test on raw center/radius pairs: squared center distance below
/// the squared sum of radii. Exactly touching spheres do not overlap.
pub fn spheres_overlap(center_a: Vec3, radius_a: f32, center_b: Vec3, radius_b: f32) -> bool {
    let min_dist = radius_a + radius_b;
    center_a.distance_squared(center_b) < min_dist * min_dist
}

impl Sphere {
    /// Non-overlap invariant check against another sphere.
    pub fn overlaps(&self, other: &Sphere) -> bool {
        spheres_overlap(self.center, self.radius, other.center, other.radius)
    }
}
