//! Procedural sphere-scene generation via seeded rejection sampling.
//!
//! Candidates are drawn one at a time: radius first, then a position on a
//! placement disk, resting on the y=0 ground plane. A candidate that overlaps
//! any previously accepted sphere is discarded permanently; there is no
//! redraw, so the accepted count may fall short of the target. Identical seed
//! and parameters reproduce the identical sphere list, including which
//! candidates were rejected.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::material::Material;
use crate::scene::mesh::{spheres_overlap, Sphere};

/// Emitted radiance assigned to spheres that win the emissive coin flip.
pub const EMISSIVE_STRENGTH: f32 = 2.0;

/// Specular reflectance of non-metallic (dielectric) spheres.
pub const DIELECTRIC_SPECULAR: f32 = 0.04;

/// Parameters for one generation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereSceneParams {
    /// Target number of candidates; accepted count may be lower.
    pub count: u32,
    /// Radius range [min, max], sampled uniformly.
    pub radius_min: f32,
    pub radius_max: f32,
    /// Radius of the horizontal placement disk.
    pub placement_radius: f32,
}

impl Default for SphereSceneParams {
    fn default() -> Self {
        Self {
            count: 100,
            radius_min: 3.0,
            radius_max: 8.0,
            placement_radius: 100.0,
        }
    }
}

/// Generate up to `params.count` non-overlapping spheres.
///
/// The draw sequence is linear and never reordered: a rejected candidate
/// consumes exactly its radius and position draws, an accepted one also
/// consumes its material draws.
#[tracing::instrument(skip_all, fields(candidate_count = params.count))]
pub fn generate_spheres(params: &SphereSceneParams, seed: u64) -> Vec<Sphere> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut spheres: Vec<Sphere> = Vec::with_capacity(params.count as usize);

    'candidates: for _ in 0..params.count {
        let radius = if params.radius_max > params.radius_min {
            rng.gen_range(params.radius_min..params.radius_max)
        } else {
            params.radius_min
        };
        let pos = sample_disk(&mut rng, params.placement_radius);
        let candidate_center = Vec3::new(pos.0, radius, pos.1);

        // Reject against every accepted sphere; a failed candidate is gone
        // for good.
        for other in &spheres {
            if spheres_overlap(candidate_center, radius, other.center, other.radius) {
                continue 'candidates;
            }
        }

        let material = sample_material(&mut rng);
        spheres.push(Sphere {
            center: candidate_center,
            radius,
            material,
        });
    }

    log::debug!(
        "sphere generation: accepted {} of {} candidates",
        spheres.len(),
        params.count
    );
    spheres
}

/// Uniform point inside a disk of the given radius (polar with sqrt warp).
fn sample_disk(rng: &mut SmallRng, disk_radius: f32) -> (f32, f32) {
    let theta = rng.gen_range(0.0..std::f32::consts::TAU);
    let r = disk_radius * rng.gen::<f32>().sqrt();
    (r * theta.cos(), r * theta.sin())
}

/// Material draws for an accepted candidate, in fixed order: color, metallic
/// coin, smoothness, emissive coin.
fn sample_material(rng: &mut SmallRng) -> Material {
    let color = Vec3::new(rng.gen(), rng.gen(), rng.gen());
    let metallic = rng.gen_bool(0.5);
    let (albedo, specular) = if metallic {
        (Vec3::ZERO, color)
    } else {
        (color, Vec3::splat(DIELECTRIC_SPECULAR))
    };
    let smoothness = rng.gen::<f32>();
    let emission = if rng.gen_bool(0.2) {
        EMISSIVE_STRENGTH
    } else {
        0.0
    };

    Material {
        albedo,
        specular,
        smoothness,
        emission,
    }
}
