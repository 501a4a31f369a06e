//! Pack primitive lists into fixed-stride byte buffers for kernel upload.
//!
//! A rebuild always replaces a buffer in full; nothing here patches
//! incrementally. The element stride is validated against the stride the
//! kernel advertises before any packing happens, so a layout drift between
//! host and kernel fails the activation instead of corrupting a frame.

use crate::error::{Error, Result};
use crate::gpu::layout::{GpuSphere, GpuTriangle, SPHERE_STRIDE, TRIANGLE_STRIDE};
use crate::scene::mesh::{Sphere, Triangle};

/// One contiguous fixed-stride buffer of a single primitive kind.
#[derive(Debug, Clone)]
pub struct SceneBuffer {
    kind: &'static str,
    stride: usize,
    count: usize,
    bytes: Vec<u8>,
}

impl SceneBuffer {
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Element count.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Per-element byte stride.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Packed contents, `count * stride` bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// The buffer pair one activation produces.
#[derive(Debug, Clone)]
pub struct SceneBuffers {
    pub spheres: SceneBuffer,
    pub triangles: SceneBuffer,
}

fn check_stride(kind: &'static str, ours: usize, expected: usize) -> Result<()> {
    if ours != expected {
        return Err(Error::BufferLayoutMismatch {
            kind,
            expected,
            actual: ours,
        });
    }
    Ok(())
}

/// Pack spheres. An empty list is valid: generation may have rejected every
/// candidate.
pub fn build_sphere_buffer(spheres: &[Sphere], expected_stride: usize) -> Result<SceneBuffer> {
    check_stride("sphere", SPHERE_STRIDE, expected_stride)?;

    let packed: Vec<GpuSphere> = spheres.iter().map(GpuSphere::from).collect();
    Ok(SceneBuffer {
        kind: "sphere",
        stride: SPHERE_STRIDE,
        count: packed.len(),
        bytes: bytemuck::cast_slice(&packed).to_vec(),
    })
}

/// Pack triangles. An empty sequence means the geometry source has not been
/// populated, which is an error rather than an empty scene.
#[tracing::instrument(skip_all, fields(triangle_count = triangles.len()))]
pub fn build_triangle_buffer(triangles: &[Triangle], expected_stride: usize) -> Result<SceneBuffer> {
    check_stride("triangle", TRIANGLE_STRIDE, expected_stride)?;

    if triangles.is_empty() {
        return Err(Error::EmptySourceData);
    }

    let packed: Vec<GpuTriangle> = triangles.iter().map(GpuTriangle::from).collect();
    log::debug!(
        "packed {} triangles ({} bytes)",
        packed.len(),
        packed.len() * TRIANGLE_STRIDE
    );
    Ok(SceneBuffer {
        kind: "triangle",
        stride: TRIANGLE_STRIDE,
        count: packed.len(),
        bytes: bytemuck::cast_slice(&packed).to_vec(),
    })
}
