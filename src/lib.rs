//! # Radiant
//!
//! Progressive GPU ray-tracing scene host. Prepares scene geometry and
//! materials for an external GPU kernel and drives the progressive
//! accumulation loop that refines the rendered image frame over frame until
//! camera or lighting changes invalidate it.
//!
//! ## Modules
//!
//! - [`scene`] - Mesh instances, triangle extraction, procedural spheres
//! - [`gpu`] - Packed buffer layouts, buffer building, the kernel boundary
//! - [`accum`] - The progressive accumulation controller
//! - [`surface`] - CPU-visible sample surfaces
//! - [`camera`] - Per-frame camera and light state
//! - [`material`] - Materials and the named-property bag
//! - [`environment`] - HDR/EXR environment maps (feature `gpu`)
//!
//! ## Example
//!
//! ```ignore
//! use radiant::accum::{ProgressiveController, Tunables};
//! use radiant::scene::extract_triangles;
//!
//! let report = extract_triangles(&instances);
//! let mut controller = ProgressiveController::new(kernel, Tunables::default());
//! controller.activate(&report.triangles)?;
//!
//! loop {
//!     let image = controller.render_frame(&frame_request)?;
//!     present(image);
//! }
//! ```

pub mod accum;
pub mod camera;
pub mod error;
pub mod gpu;
pub mod material;
pub mod scene;
pub mod surface;

// Environment maps need the GPU stack (optional, enabled with "gpu" feature)
#[cfg(feature = "gpu")]
pub mod environment;

// Re-export commonly used types
pub use error::{Error, Result};
pub use surface::SampleSurface;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::accum::{ProgressiveController, Tunables};
    pub use crate::camera::{CameraState, FrameRequest, LightState};
    pub use crate::error::{Error, Result};
    pub use crate::gpu::{KernelInputs, SceneBuffers, TraceKernel};
    pub use crate::material::{Material, MaterialProperties};
    pub use crate::scene::{
        extract_triangles, generate_spheres, MeshInstance, Sphere, SphereSceneParams, Triangle,
    };
    pub use crate::surface::SampleSurface;
}
