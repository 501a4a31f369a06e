//! Packed primitive layouts for GPU storage buffers.
//!
//! Element strides are part of the kernel boundary contract and must equal
//! the kernel's expected per-element byte size exactly. Scalars ride in the
//! fourth lane of each 16-byte row so WGSL's vec3 alignment rules cannot
//! shift fields.

use bytemuck::{Pod, Zeroable};

use crate::scene::mesh::{Sphere, Triangle};

/// Byte stride of one packed sphere.
pub const SPHERE_STRIDE: usize = std::mem::size_of::<GpuSphere>();

/// Byte stride of one packed triangle.
pub const TRIANGLE_STRIDE: usize = std::mem::size_of::<GpuTriangle>();

/// Sphere element (48 bytes): three 16-byte rows.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuSphere {
    pub center: [f32; 3],
    pub radius: f32,
    pub albedo: [f32; 3],
    pub smoothness: f32,
    pub specular: [f32; 3],
    pub emission: f32,
}

/// Triangle element (96 bytes) with inline material: six 16-byte rows.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuTriangle {
    pub v1: [f32; 3],
    pub smoothness: f32,
    pub v2: [f32; 3],
    pub emission: f32,
    pub v3: [f32; 3],
    pub _pad0: f32,
    pub normal: [f32; 3],
    pub _pad1: f32,
    pub albedo: [f32; 3],
    pub _pad2: f32,
    pub specular: [f32; 3],
    pub _pad3: f32,
}

const _: () = assert!(SPHERE_STRIDE == 48);
const _: () = assert!(TRIANGLE_STRIDE == 96);

impl From<&Sphere> for GpuSphere {
    fn from(s: &Sphere) -> Self {
        GpuSphere {
            center: s.center.to_array(),
            radius: s.radius,
            albedo: s.material.albedo.to_array(),
            smoothness: s.material.smoothness,
            specular: s.material.specular.to_array(),
            emission: s.material.emission,
        }
    }
}

impl From<&Triangle> for GpuTriangle {
    fn from(t: &Triangle) -> Self {
        GpuTriangle {
            v1: t.v1.to_array(),
            smoothness: t.material.smoothness,
            v2: t.v2.to_array(),
            emission: t.material.emission,
            v3: t.v3.to_array(),
            _pad0: 0.0,
            normal: t.normal.to_array(),
            _pad1: 0.0,
            albedo: t.material.albedo.to_array(),
            _pad2: 0.0,
            specular: t.material.specular.to_array(),
            _pad3: 0.0,
        }
    }
}
