//! Progressive accumulation controller.
//!
//! Owns the output surfaces and the sample counter, detects camera/light/
//! tunable changes between frames, dispatches the kernel for one noisy
//! sample per frame and folds it into a running mean. Activation builds the
//! scene buffers wholesale; accumulation resets far more often, on any
//! visual-affecting change.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::camera::{CameraState, FrameRequest, LightState};
use crate::error::{Error, Result};
use crate::gpu::buffers::{build_sphere_buffer, build_triangle_buffer, SceneBuffers};
use crate::gpu::kernel::{KernelInputs, TraceKernel};
use crate::scene::mesh::Triangle;
use crate::scene::spheres::{generate_spheres, SphereSceneParams};
use crate::surface::SampleSurface;

/// Host-adjustable parameters.
///
/// Sphere-scene values take effect at the next activation; the environment
/// intensity applies to the next frame. Every setter on the controller
/// resets accumulation, since each of these changes what the converged
/// image should look like.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tunables {
    pub sphere_scene: SphereSceneParams,
    /// Seed for the deterministic sphere-generation stream.
    pub seed: u64,
    /// Environment map intensity multiplier.
    pub env_intensity: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            sphere_scene: SphereSceneParams::default(),
            seed: 0,
            env_intensity: 1.0,
        }
    }
}

/// Drives a [`TraceKernel`] through activate / render-frame / deactivate.
///
/// States: uninitialized (no scene buffers) and accumulating(n). There is no
/// terminal state and no sample cap; the host stops calling `render_frame`
/// when it is done.
pub struct ProgressiveController<K: TraceKernel> {
    kernel: K,
    tunables: Tunables,

    buffers: Option<SceneBuffers>,
    raw: Option<SampleSurface>,
    blended: Option<SampleSurface>,
    sample_count: u32,

    // Previous-frame snapshots for change detection. Only enough state to
    // compare, never full history.
    prev_camera: Option<CameraState>,
    prev_light: Option<LightState>,

    // Free-running jitter stream, independent of the seeded generation
    // stream so scene determinism never couples to frame timing.
    jitter_rng: SmallRng,
}

impl<K: TraceKernel> ProgressiveController<K> {
    pub fn new(kernel: K, tunables: Tunables) -> Self {
        Self {
            kernel,
            tunables,
            buffers: None,
            raw: None,
            blended: None,
            sample_count: 0,
            prev_camera: None,
            prev_light: None,
            jitter_rng: SmallRng::from_entropy(),
        }
    }

    /// Pin the jitter stream, for reproducible tests.
    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Whether the controller holds scene buffers and can render.
    pub fn is_active(&self) -> bool {
        self.buffers.is_some()
    }

    /// Samples blended since the last reset.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    /// Build the scene and enter the accumulating state.
    ///
    /// Generates the procedural spheres, packs both buffers (validating
    /// strides against the kernel), and uploads them. Any failure leaves the
    /// controller uninitialized and is surfaced to the host.
    #[tracing::instrument(skip_all, fields(triangle_count = triangles.len()))]
    pub fn activate(&mut self, triangles: &[Triangle]) -> Result<()> {
        let spheres = generate_spheres(&self.tunables.sphere_scene, self.tunables.seed);

        let sphere_buffer = build_sphere_buffer(&spheres, self.kernel.sphere_stride())?;
        let triangle_buffer = build_triangle_buffer(triangles, self.kernel.triangle_stride())?;

        let buffers = SceneBuffers {
            spheres: sphere_buffer,
            triangles: triangle_buffer,
        };
        self.kernel.upload_scene(&buffers)?;

        log::info!(
            "scene activated: {} spheres, {} triangles",
            buffers.spheres.count(),
            buffers.triangles.count()
        );
        self.buffers = Some(buffers);
        self.reset_accumulation();
        self.prev_camera = None;
        self.prev_light = None;
        Ok(())
    }

    /// Release buffers and surfaces, back to uninitialized.
    pub fn deactivate(&mut self) {
        if self.buffers.take().is_some() {
            self.kernel.release_scene();
            log::info!("scene deactivated");
        }
        self.raw = None;
        self.blended = None;
        self.sample_count = 0;
        self.prev_camera = None;
        self.prev_light = None;
    }

    /// Drop accumulated samples; the next frame starts a fresh mean.
    pub fn reset_accumulation(&mut self) {
        self.sample_count = 0;
    }

    /// Replace the sphere-scene parameters (applied at next activation).
    pub fn set_sphere_scene(&mut self, params: SphereSceneParams) {
        if self.tunables.sphere_scene != params {
            self.tunables.sphere_scene = params;
            self.reset_accumulation();
        }
    }

    /// Replace the generation seed (applied at next activation).
    pub fn set_seed(&mut self, seed: u64) {
        if self.tunables.seed != seed {
            self.tunables.seed = seed;
            self.reset_accumulation();
        }
    }

    /// Set the environment intensity multiplier (applies next frame).
    pub fn set_env_intensity(&mut self, intensity: f32) {
        if self.tunables.env_intensity != intensity {
            self.tunables.env_intensity = intensity;
            self.reset_accumulation();
        }
    }

    /// Render one frame and return the blended surface.
    ///
    /// Sequence: (re)allocate surfaces on resolution change, run the change
    /// check against the previous frame's snapshots, dispatch the kernel for
    /// one raw sample, blend it into the running mean, present. A dispatch
    /// failure is fatal to this frame only: state is untouched and the next
    /// call retries.
    pub fn render_frame(&mut self, request: &FrameRequest) -> Result<&SampleSurface> {
        if self.buffers.is_none() {
            return Err(Error::NotActivated);
        }

        self.ensure_surfaces(request.width, request.height)?;

        // Change check runs every frame; any difference is a hard reset.
        let camera_changed = self
            .prev_camera
            .is_some_and(|prev| request.camera.differs_from(&prev));
        let light_changed = self
            .prev_light
            .is_some_and(|prev| request.light.differs_from(&prev));
        if camera_changed || light_changed {
            log::debug!(
                "state change detected (camera: {camera_changed}, light: {light_changed}), resetting accumulation"
            );
            self.reset_accumulation();
        }
        self.prev_camera = Some(request.camera);
        self.prev_light = Some(request.light);

        let inputs = KernelInputs {
            camera_to_world: request.camera.camera_to_world,
            inverse_projection: request.camera.inverse_projection,
            light: request.light.to_vec4(),
            env_intensity: self.tunables.env_intensity,
            jitter: Vec2::new(self.jitter_rng.gen(), self.jitter_rng.gen()),
            frame_index: self.sample_count,
        };

        // Both surfaces exist past ensure_surfaces.
        let raw = self.raw.as_mut().expect("raw surface allocated");
        let blended = self.blended.as_mut().expect("blended surface allocated");

        self.kernel.trace(&inputs, raw)?;

        blended.blend_sample(raw, self.sample_count);
        self.sample_count += 1;

        Ok(self.blended.as_ref().expect("blended surface allocated"))
    }

    /// The most recent blended result, if any frame has completed.
    pub fn blended(&self) -> Option<&SampleSurface> {
        self.blended.as_ref()
    }

    /// Allocate or reallocate both surfaces when the requested resolution
    /// differs from the allocated one. Never leaves one surface stale: on
    /// failure both are dropped so the next frame retries from scratch.
    fn ensure_surfaces(&mut self, width: u32, height: u32) -> Result<()> {
        let current = self.raw.as_ref().map(SampleSurface::dimensions);
        if current == Some((width, height)) {
            return Ok(());
        }

        self.raw = None;
        self.blended = None;
        self.reset_accumulation();

        let raw = SampleSurface::new(width, height)?;
        let blended = SampleSurface::new(width, height)?;
        log::debug!("output surfaces reallocated at {width}x{height}");
        self.raw = Some(raw);
        self.blended = Some(blended);
        Ok(())
    }
}
