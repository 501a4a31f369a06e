//! GPU-facing data layouts, buffer packing and kernel plumbing.

pub mod buffers;
pub mod kernel;
pub mod layout;

#[cfg(feature = "gpu")]
pub mod compute;

pub use buffers::{build_sphere_buffer, build_triangle_buffer, SceneBuffer, SceneBuffers};
pub use kernel::{KernelInputs, TraceKernel};
pub use layout::{GpuSphere, GpuTriangle, SPHERE_STRIDE, TRIANGLE_STRIDE};

#[cfg(feature = "gpu")]
pub use compute::WgpuKernel;
