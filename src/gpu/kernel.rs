//! The boundary contract with the GPU ray-tracing kernel.
//!
//! The kernel itself is an external collaborator: it consumes the packed
//! scene buffers and per-frame inputs and produces exactly one noisy
//! radiance sample into the target surface per dispatch. Hosts hand the
//! controller any [`TraceKernel`] implementation; the crate ships a
//! wgpu-backed one behind the `gpu` feature.

use glam::{Mat4, Vec2, Vec4};

use crate::error::Result;
use crate::gpu::buffers::SceneBuffers;
use crate::surface::SampleSurface;

/// Per-frame inputs the controller sets before each dispatch.
#[derive(Debug, Clone, Copy)]
pub struct KernelInputs {
    /// Camera-to-world matrix.
    pub camera_to_world: Mat4,
    /// Inverse projection matrix.
    pub inverse_projection: Mat4,
    /// xyz = light direction, w = intensity.
    pub light: Vec4,
    /// Environment map intensity multiplier.
    pub env_intensity: f32,
    /// Sub-pixel jitter offset in [0, 1)^2, fresh every frame.
    pub jitter: Vec2,
    /// Frames dispatched since the last accumulation reset.
    pub frame_index: u32,
}

/// A GPU ray-tracing kernel the controller can drive.
///
/// The command-ordering contract: `trace` returns only after the sample is
/// visible in `target`; the controller never blends concurrently with a
/// dispatch.
pub trait TraceKernel {
    /// Per-element byte size this kernel expects for the sphere buffer.
    fn sphere_stride(&self) -> usize;

    /// Per-element byte size this kernel expects for the triangle buffer.
    fn triangle_stride(&self) -> usize;

    /// Replace the kernel's scene data wholesale. Called once per activation.
    fn upload_scene(&mut self, buffers: &SceneBuffers) -> Result<()>;

    /// Drop the kernel's scene data. Called on deactivation.
    fn release_scene(&mut self);

    /// Produce one noisy radiance sample into `target`.
    fn trace(&mut self, inputs: &KernelInputs, target: &mut SampleSurface) -> Result<()>;
}
