//! Extract world-space triangles from host mesh instances.
//!
//! Runs once per activation: every instance's vertices are transformed to
//! world space, each index triple becomes one flat-shaded [`Triangle`] with
//! its own copy of the resolved material. An instance whose shading
//! properties cannot be resolved is skipped and reported; extraction for the
//! remaining instances continues.

use glam::Vec3;
use log::warn;

use crate::error::{Error, Result};
use crate::scene::mesh::{MeshInstance, Triangle};

/// Result of one extraction pass.
pub struct ExtractionReport {
    /// Flat triangle sequence in instance order.
    pub triangles: Vec<Triangle>,
    /// Instances that were skipped, with the error that disqualified them.
    pub skipped: Vec<(String, Error)>,
}

impl ExtractionReport {
    pub fn stats(&self) -> SceneStats {
        SceneStats {
            triangle_count: self.triangles.len(),
            skipped_instances: self.skipped.len(),
        }
    }
}

/// Extraction statistics.
#[derive(Debug, Default)]
pub struct SceneStats {
    pub triangle_count: usize,
    pub skipped_instances: usize,
}

/// Extract all triangles from the given instances.
///
/// Not incremental: topology changes after extraction are not observed until
/// the next activation.
#[tracing::instrument(skip_all, fields(instance_count = instances.len()))]
pub fn extract_triangles(instances: &[MeshInstance]) -> ExtractionReport {
    let mut triangles = Vec::new();
    let mut skipped = Vec::new();

    for instance in instances {
        match extract_instance(instance, &mut triangles) {
            Ok(count) => {
                log::debug!("extracted {} triangles from '{}'", count, instance.name);
            }
            Err(e) => {
                warn!("skipping instance '{}': {}", instance.name, e);
                skipped.push((instance.name.clone(), e));
            }
        }
    }

    ExtractionReport { triangles, skipped }
}

/// Extract one instance, appending to `out`. Returns the triangle count.
///
/// On error nothing from this instance is left in `out`.
fn extract_instance(instance: &MeshInstance, out: &mut Vec<Triangle>) -> Result<usize> {
    // Resolve the material first: a bad instance must contribute nothing.
    let material = instance.material.resolve(&instance.name)?;

    let start = out.len();
    for chunk in instance.indices.chunks_exact(3) {
        let [v1, v2, v3] = fetch_vertices(instance, chunk)?;
        out.push(Triangle {
            v1,
            v2,
            v3,
            normal: Triangle::face_normal(v1, v2, v3),
            material,
        });
    }

    Ok(out.len() - start)
}

/// Transform the three referenced vertices into world space.
fn fetch_vertices(instance: &MeshInstance, chunk: &[u32]) -> Result<[Vec3; 3]> {
    let mut world = [Vec3::ZERO; 3];
    for (slot, &index) in world.iter_mut().zip(chunk) {
        let local = instance
            .vertices
            .get(index as usize)
            .ok_or(Error::IndexOutOfBounds {
                instance: instance.name.clone(),
                index,
                count: instance.vertices.len(),
            })?;
        *slot = instance.transform.transform_point3(*local);
    }
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialProperties;
    use glam::{Mat4, Vec3};

    fn quad_instance(name: &str, transform: Mat4) -> MeshInstance {
        MeshInstance {
            name: name.to_string(),
            transform,
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            material: MaterialProperties::with_standard(
                Vec3::new(0.5, 0.5, 0.5),
                Vec3::splat(0.04),
                0.3,
                0.0,
            ),
        }
    }

    #[test]
    fn test_extracts_world_space_triangles() {
        let offset = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let report = extract_triangles(&[quad_instance("quad", offset)]);
        assert_eq!(report.triangles.len(), 2);
        assert!(report.skipped.is_empty());
        assert!((report.triangles[0].v1.x - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_normals_unit_and_orthogonal() {
        let rot = Mat4::from_rotation_x(0.7) * Mat4::from_rotation_y(-1.2);
        let report = extract_triangles(&[quad_instance("quad", rot)]);
        for t in &report.triangles {
            assert!((t.normal.length() - 1.0).abs() < 1e-5);
            let e1 = t.v2 - t.v1;
            let e2 = t.v3 - t.v1;
            assert!(t.normal.dot(e1).abs() < 1e-4);
            assert!(t.normal.dot(e2).abs() < 1e-4);
        }
    }

    #[test]
    fn test_material_duplicated_per_triangle() {
        let report = extract_triangles(&[quad_instance("quad", Mat4::IDENTITY)]);
        assert_eq!(
            report.triangles[0].material.albedo,
            report.triangles[1].material.albedo
        );
    }

    #[test]
    fn test_missing_material_skips_instance_only() {
        let mut bad = quad_instance("bad", Mat4::IDENTITY);
        bad.material = MaterialProperties::new();
        let good = quad_instance("good", Mat4::IDENTITY);

        let report = extract_triangles(&[bad, good]);
        assert_eq!(report.triangles.len(), 2); // only the good quad
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "bad");
        assert!(matches!(report.skipped[0].1, Error::MissingMaterial { .. }));
    }

    #[test]
    fn test_out_of_range_index_skips_instance() {
        let mut bad = quad_instance("bad", Mat4::IDENTITY);
        bad.indices = vec![0, 1, 99];
        let report = extract_triangles(&[bad]);
        assert!(report.triangles.is_empty());
        assert!(matches!(report.skipped[0].1, Error::IndexOutOfBounds { .. }));
    }

    #[test]
    fn test_empty_instance_contributes_nothing() {
        let mut empty = quad_instance("empty", Mat4::IDENTITY);
        empty.indices.clear();
        let report = extract_triangles(&[empty]);
        assert!(report.triangles.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_winding_matches_kernel_contract() {
        // One triangle wound so that cross(v3-v1, v2-v1) points up (+Y):
        // v1=(0,0,0), v2=(0,0,1), v3=(1,0,0).
        let instance = MeshInstance {
            name: "tri".to_string(),
            transform: Mat4::IDENTITY,
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, 0.0),
            ],
            indices: vec![0, 1, 2],
            material: MaterialProperties::with_standard(Vec3::ONE, Vec3::ZERO, 0.0, 0.0),
        };
        let report = extract_triangles(&[instance]);
        assert!((report.triangles[0].normal - Vec3::Y).length() < 1e-6);
    }
}
