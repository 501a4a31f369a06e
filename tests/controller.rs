//! State-machine tests for the progressive accumulation controller,
//! driven by a scripted kernel that produces known constant samples.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use glam::Vec3;
use radiant::accum::{ProgressiveController, Tunables};
use radiant::camera::{CameraState, FrameRequest, LightState};
use radiant::error::Error;
use radiant::gpu::{KernelInputs, SceneBuffers, TraceKernel, SPHERE_STRIDE, TRIANGLE_STRIDE};
use radiant::material::MaterialProperties;
use radiant::scene::Triangle;
use radiant::surface::SampleSurface;

/// Shared script the test mutates while the controller owns the kernel.
#[derive(Default)]
struct Script {
    /// Constant sample value per successful dispatch, in order.
    samples: VecDeque<f32>,
    /// When set, the next dispatch fails without consuming a sample.
    fail_next: bool,
    uploads: u32,
    releases: u32,
}

struct ScriptedKernel {
    script: Rc<RefCell<Script>>,
    sphere_stride: usize,
    triangle_stride: usize,
}

impl ScriptedKernel {
    fn new() -> (Self, Rc<RefCell<Script>>) {
        let script = Rc::new(RefCell::new(Script::default()));
        (
            Self {
                script: Rc::clone(&script),
                sphere_stride: SPHERE_STRIDE,
                triangle_stride: TRIANGLE_STRIDE,
            },
            script,
        )
    }
}

impl TraceKernel for ScriptedKernel {
    fn sphere_stride(&self) -> usize {
        self.sphere_stride
    }

    fn triangle_stride(&self) -> usize {
        self.triangle_stride
    }

    fn upload_scene(&mut self, _buffers: &SceneBuffers) -> radiant::Result<()> {
        self.script.borrow_mut().uploads += 1;
        Ok(())
    }

    fn release_scene(&mut self) {
        self.script.borrow_mut().releases += 1;
    }

    fn trace(&mut self, _inputs: &KernelInputs, target: &mut SampleSurface) -> radiant::Result<()> {
        let mut script = self.script.borrow_mut();
        if script.fail_next {
            script.fail_next = false;
            return Err(Error::kernel("injected failure"));
        }
        let v = script.samples.pop_front().expect("script exhausted");
        target.fill([v, v, v, 1.0]);
        Ok(())
    }
}

fn one_triangle() -> Vec<Triangle> {
    let (v1, v2, v3) = (Vec3::ZERO, Vec3::X, Vec3::Z);
    vec![Triangle {
        v1,
        v2,
        v3,
        normal: Triangle::face_normal(v1, v2, v3),
        material: MaterialProperties::with_standard(Vec3::ONE, Vec3::ZERO, 0.5, 0.0)
            .resolve("tri")
            .unwrap(),
    }]
}

fn request(width: u32, height: u32, eye_x: f32, intensity: f32) -> FrameRequest {
    FrameRequest {
        width,
        height,
        camera: CameraState::look_at(
            Vec3::new(eye_x, 2.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            0.8,
            width as f32 / height as f32,
        ),
        light: LightState {
            direction: Vec3::new(0.2, -1.0, 0.1),
            intensity,
        },
    }
}

fn activated_controller() -> (ProgressiveController<ScriptedKernel>, Rc<RefCell<Script>>) {
    let (kernel, script) = ScriptedKernel::new();
    let mut controller = ProgressiveController::new(kernel, Tunables::default()).with_jitter_seed(1);
    controller.activate(&one_triangle()).unwrap();
    (controller, script)
}

#[test]
fn accumulation_law_matches_arithmetic_mean() {
    let (mut controller, script) = activated_controller();
    let samples = [1.0f32, 5.0, 3.0, 7.0, 4.0];
    script.borrow_mut().samples.extend(samples);

    let req = request(4, 4, 0.0, 1.0);
    let mut last = 0.0;
    for _ in &samples {
        last = controller.render_frame(&req).unwrap().texel(0, 0)[0];
    }

    let mean = samples.iter().sum::<f32>() / samples.len() as f32;
    assert!((last - mean).abs() < 1e-5, "got {last}, want {mean}");
    assert_eq!(controller.sample_count(), samples.len() as u32);
}

#[test]
fn camera_change_resets_to_fresh_sample() {
    let (mut controller, script) = activated_controller();
    script.borrow_mut().samples.extend([2.0, 2.0, 2.0, 2.0, 2.0, 9.0]);

    let steady = request(4, 4, 0.0, 1.0);
    for _ in 0..5 {
        controller.render_frame(&steady).unwrap();
    }
    assert_eq!(controller.sample_count(), 5);

    // Frame 6 moves the camera: the mean restarts from that frame's raw
    // sample alone.
    let moved = request(4, 4, 1.0, 1.0);
    let blended = controller.render_frame(&moved).unwrap();
    assert_eq!(blended.texel(0, 0), [9.0, 9.0, 9.0, 1.0]);
    assert_eq!(controller.sample_count(), 1);
}

#[test]
fn light_change_resets_accumulation() {
    let (mut controller, script) = activated_controller();
    script.borrow_mut().samples.extend([2.0, 2.0, 8.0]);

    let dim = request(4, 4, 0.0, 1.0);
    controller.render_frame(&dim).unwrap();
    controller.render_frame(&dim).unwrap();

    let bright = request(4, 4, 0.0, 2.0);
    let blended = controller.render_frame(&bright).unwrap();
    assert_eq!(blended.texel(0, 0)[0], 8.0);
    assert_eq!(controller.sample_count(), 1);
}

#[test]
fn resize_reallocates_and_resets() {
    let (mut controller, script) = activated_controller();
    script.borrow_mut().samples.extend([2.0, 2.0, 2.0, 6.0]);

    let small = request(4, 4, 0.0, 1.0);
    for _ in 0..3 {
        controller.render_frame(&small).unwrap();
    }

    let large = request(8, 8, 0.0, 1.0);
    let blended = controller.render_frame(&large).unwrap();
    assert_eq!(blended.dimensions(), (8, 8));
    assert_eq!(blended.texel(7, 7)[0], 6.0); // fresh mean, not carried over
    assert_eq!(controller.sample_count(), 1);
}

#[test]
fn env_intensity_setter_resets_accumulation() {
    let (mut controller, script) = activated_controller();
    script.borrow_mut().samples.extend([2.0, 2.0]);

    let req = request(4, 4, 0.0, 1.0);
    controller.render_frame(&req).unwrap();
    assert_eq!(controller.sample_count(), 1);

    controller.set_env_intensity(3.0);
    assert_eq!(controller.sample_count(), 0);

    // Setting the same value again must not reset mid-accumulation.
    controller.render_frame(&req).unwrap();
    controller.set_env_intensity(3.0);
    assert_eq!(controller.sample_count(), 1);
}

#[test]
fn dispatch_failure_is_fatal_to_that_frame_only() {
    let (mut controller, script) = activated_controller();
    script.borrow_mut().samples.extend([4.0, 4.0, 1.0]);

    let req = request(4, 4, 0.0, 1.0);
    controller.render_frame(&req).unwrap();
    controller.render_frame(&req).unwrap();

    script.borrow_mut().fail_next = true;
    let err = controller.render_frame(&req).unwrap_err();
    assert!(matches!(err, Error::Kernel(_)));
    // State untouched: still accumulating from two samples.
    assert_eq!(controller.sample_count(), 2);
    assert!(controller.is_active());

    // Next frame retries and continues the mean: (4 + 4 + 1) / 3.
    let blended = controller.render_frame(&req).unwrap();
    assert!((blended.texel(0, 0)[0] - 3.0).abs() < 1e-5);
    assert_eq!(controller.sample_count(), 3);
}

#[test]
fn empty_geometry_source_blocks_activation() {
    let (kernel, script) = ScriptedKernel::new();
    let mut controller = ProgressiveController::new(kernel, Tunables::default());

    let err = controller.activate(&[]).unwrap_err();
    assert!(matches!(err, Error::EmptySourceData));
    assert!(!controller.is_active());
    assert_eq!(script.borrow().uploads, 0);

    let err = controller.render_frame(&request(4, 4, 0.0, 1.0)).unwrap_err();
    assert!(matches!(err, Error::NotActivated));
}

#[test]
fn stride_mismatch_blocks_activation() {
    let (mut kernel, script) = ScriptedKernel::new();
    kernel.sphere_stride = SPHERE_STRIDE + 4;
    let mut controller = ProgressiveController::new(kernel, Tunables::default());

    let err = controller.activate(&one_triangle()).unwrap_err();
    assert!(matches!(err, Error::BufferLayoutMismatch { .. }));
    assert!(!controller.is_active());
    assert_eq!(script.borrow().uploads, 0);
}

#[test]
fn deactivate_releases_scene_and_surfaces() {
    let (mut controller, script) = activated_controller();
    script.borrow_mut().samples.push_back(2.0);
    controller.render_frame(&request(4, 4, 0.0, 1.0)).unwrap();

    controller.deactivate();
    assert!(!controller.is_active());
    assert_eq!(controller.sample_count(), 0);
    assert!(controller.blended().is_none());
    assert_eq!(script.borrow().releases, 1);

    let err = controller.render_frame(&request(4, 4, 0.0, 1.0)).unwrap_err();
    assert!(matches!(err, Error::NotActivated));
}

#[test]
fn reactivation_rebuilds_and_uploads_again() {
    let (mut controller, script) = activated_controller();
    assert_eq!(script.borrow().uploads, 1);

    controller.deactivate();
    controller.activate(&one_triangle()).unwrap();
    assert_eq!(script.borrow().uploads, 2);
}

#[test]
fn zero_resolution_frame_fails_before_dispatch() {
    let (mut controller, script) = activated_controller();
    // No scripted samples: a dispatch attempt would panic the script.
    let err = controller.render_frame(&request(0, 4, 0.0, 1.0)).unwrap_err();
    assert!(matches!(err, Error::ResourceAllocation { .. }));
    assert_eq!(script.borrow().uploads, 1);

    // A valid resolution on the next frame recovers.
    script.borrow_mut().samples.push_back(5.0);
    let blended = controller.render_frame(&request(4, 4, 0.0, 1.0)).unwrap();
    assert_eq!(blended.texel(0, 0)[0], 5.0);
}
