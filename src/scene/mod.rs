//! Scene data: mesh instances, extracted triangles, procedural spheres.

pub mod extract;
pub mod mesh;
pub mod spheres;

pub use extract::{extract_triangles, ExtractionReport, SceneStats};
pub use mesh::{MeshInstance, Sphere, Triangle};
pub use spheres::{generate_spheres, SphereSceneParams};
