//! Per-frame camera and light state supplied by the host.

use glam::{Mat4, Vec3, Vec4};

/// Change threshold for matrix elements when comparing against the previous
/// frame. Small enough to catch any real movement without tripping on
/// round-off in host-side math.
const MATRIX_EPS: f32 = 1e-6;

/// Perspective projection for wgpu's 0..1 clip depth.
pub fn wgpu_projection(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    // glam's perspective_rh already targets 0..1 depth; no GL remap needed.
    Mat4::perspective_rh(fov_y, aspect, near, far)
}

/// Camera pose and projection for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Camera-to-world (inverse view) matrix.
    pub camera_to_world: Mat4,
    /// Inverse projection matrix (clip to view space).
    pub inverse_projection: Mat4,
}

impl CameraState {
    /// Build from a look-at pose and perspective parameters.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3, fov_y: f32, aspect: f32) -> Self {
        let view = Mat4::look_at_rh(eye, target, up);
        let proj = wgpu_projection(fov_y, aspect, 0.1, 1000.0);
        Self {
            camera_to_world: view.inverse(),
            inverse_projection: proj.inverse(),
        }
    }

    /// Element-wise comparison against the previous frame's state.
    pub fn differs_from(&self, other: &CameraState) -> bool {
        mat_differs(&self.camera_to_world, &other.camera_to_world)
            || mat_differs(&self.inverse_projection, &other.inverse_projection)
    }
}

fn mat_differs(a: &Mat4, b: &Mat4) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .any(|(x, y)| (x - y).abs() > MATRIX_EPS)
}

/// Directional light for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    /// Direction the light travels (need not be normalized by the host).
    pub direction: Vec3,
    /// Scalar intensity, >= 0.
    pub intensity: f32,
}

impl LightState {
    /// Pack as the kernel's vec4: xyz = direction, w = intensity.
    pub fn to_vec4(self) -> Vec4 {
        self.direction.extend(self.intensity)
    }

    pub fn differs_from(&self, other: &LightState) -> bool {
        (self.direction - other.direction).abs().max_element() > MATRIX_EPS
            || (self.intensity - other.intensity).abs() > MATRIX_EPS
    }
}

/// Everything the host supplies for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameRequest {
    /// Requested output resolution; a change forces surface reallocation.
    pub width: u32,
    pub height: u32,
    pub camera: CameraState,
    pub light: LightState,
}
