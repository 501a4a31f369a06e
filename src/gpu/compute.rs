//! wgpu-backed kernel plumbing.
//!
//! Owns the compute pipeline built from a caller-supplied WGSL kernel, the
//! scene storage buffers, the per-frame uniform, the environment texture and
//! the `Rgba32Float` output with its readback path. The shading math lives
//! entirely in the supplied WGSL; this module only feeds it.
//!
//! ## Binding contract
//! ```text
//! @group(0) @binding(0)  spheres     storage, read-only
//! @group(0) @binding(1)  triangles   storage, read-only
//! @group(0) @binding(2)  frame       uniform (FrameUniform)
//! @group(0) @binding(3)  environment texture_2d<f32>
//! @group(0) @binding(4)  env_sampler sampler
//! @group(0) @binding(5)  output      storage texture, rgba32float, write
//! ```

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::environment::{create_default_env, EnvironmentMap};
use crate::error::{Error, Result};
use crate::gpu::buffers::SceneBuffers;
use crate::gpu::kernel::{KernelInputs, TraceKernel};
use crate::gpu::layout::{SPHERE_STRIDE, TRIANGLE_STRIDE};
use crate::surface::SampleSurface;

/// Workgroup size, must match `@workgroup_size` in the supplied WGSL.
const WG_SIZE: u32 = 8;

/// Bytes per output texel (rgba32float).
const TEXEL_BYTES: u32 = 16;

/// Per-frame uniform matching the WGSL `FrameUniform` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct FrameUniform {
    camera_to_world: [[f32; 4]; 4],
    inverse_projection: [[f32; 4]; 4],
    /// xyz = light direction, w = intensity.
    light: [f32; 4],
    jitter: [f32; 2],
    env_intensity: f32,
    frame_index: u32,
    sphere_count: u32,
    triangle_count: u32,
    _pad: [u32; 2],
}

/// Kernel state driven through the [`TraceKernel`] trait.
pub struct WgpuKernel {
    device: wgpu::Device,
    queue: wgpu::Queue,

    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,

    // Scene storage (uploaded on activation)
    sphere_buffer: Option<wgpu::Buffer>,
    triangle_buffer: Option<wgpu::Buffer>,
    sphere_count: u32,
    triangle_count: u32,

    frame_buffer: wgpu::Buffer,
    environment: EnvironmentMap,

    // Output storage texture + readback, recreated on size change
    output_texture: Option<wgpu::Texture>,
    readback_buffer: Option<wgpu::Buffer>,
    width: u32,
    height: u32,
}

impl WgpuKernel {
    /// Create the pipeline from the external kernel's WGSL source.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, kernel_wgsl: &str) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("trace_kernel_shader"),
            source: wgpu::ShaderSource::Wgsl(kernel_wgsl.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("trace_bind_group_layout"),
            entries: &[
                // @binding(0) sphere storage
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // @binding(1) triangle storage
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // @binding(2) frame uniform
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // @binding(3) environment texture
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                // @binding(4) environment sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // @binding(5) output storage texture
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba32Float,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("trace_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("trace_compute_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trace_frame_uniform"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let environment = create_default_env(device, queue);

        Self {
            device: device.clone(),
            queue: queue.clone(),
            pipeline,
            bind_group_layout,
            bind_group: None,
            sphere_buffer: None,
            triangle_buffer: None,
            sphere_count: 0,
            triangle_count: 0,
            frame_buffer,
            environment,
            output_texture: None,
            readback_buffer: None,
            width: 0,
            height: 0,
        }
    }

    /// Replace the environment map. The caller is responsible for resetting
    /// accumulation; the controller does so when its intensity tunable moves.
    pub fn set_environment(&mut self, env: EnvironmentMap) {
        self.environment = env;
        self.rebuild_bind_group();
    }

    /// Recreate the output texture and readback buffer at a new size.
    fn resize_output(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height && self.output_texture.is_some() {
            return;
        }
        self.width = width;
        self.height = height;

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("trace_output"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trace_readback"),
            size: padded_bytes_per_row(width) as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        self.output_texture = Some(texture);
        self.readback_buffer = Some(readback);
        self.rebuild_bind_group();
    }

    /// Rebuild the bind group after any buffer/texture replacement.
    fn rebuild_bind_group(&mut self) {
        let (Some(spheres), Some(triangles), Some(output)) = (
            &self.sphere_buffer,
            &self.triangle_buffer,
            &self.output_texture,
        ) else {
            self.bind_group = None;
            return;
        };

        let output_view = output.create_view(&wgpu::TextureViewDescriptor::default());
        self.bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("trace_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: spheres.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: triangles.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&self.environment.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.environment.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(&output_view),
                },
            ],
        }));
    }

    /// Copy the finished sample from the readback buffer into `target`,
    /// dropping the per-row padding.
    fn read_into(&self, target: &mut SampleSurface) -> Result<()> {
        let readback = self
            .readback_buffer
            .as_ref()
            .ok_or_else(|| Error::kernel("readback buffer missing"))?;

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| Error::kernel(format!("device poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| Error::kernel("readback callback dropped"))?
            .map_err(|e| Error::kernel(format!("readback map failed: {e:?}")))?;

        {
            let data = slice.get_mapped_range();
            let padded = padded_bytes_per_row(self.width) as usize;
            let row_bytes = (self.width * TEXEL_BYTES) as usize;
            let texels = bytemuck::cast_slice_mut::<[f32; 4], u8>(target.texels_mut());
            for y in 0..self.height as usize {
                let src = &data[y * padded..y * padded + row_bytes];
                texels[y * row_bytes..(y + 1) * row_bytes].copy_from_slice(src);
            }
        }
        readback.unmap();
        Ok(())
    }
}

impl TraceKernel for WgpuKernel {
    fn sphere_stride(&self) -> usize {
        SPHERE_STRIDE
    }

    fn triangle_stride(&self) -> usize {
        TRIANGLE_STRIDE
    }

    fn upload_scene(&mut self, buffers: &SceneBuffers) -> Result<()> {
        // wgpu rejects zero-sized buffers; an empty sphere set binds one
        // zeroed element and the uniform's count keeps the kernel honest.
        let sphere_bytes = buffers.spheres.bytes();
        let sphere_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("trace_spheres"),
                contents: if sphere_bytes.is_empty() {
                    &[0u8; SPHERE_STRIDE]
                } else {
                    sphere_bytes
                },
                usage: wgpu::BufferUsages::STORAGE,
            });

        let triangle_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("trace_triangles"),
                contents: buffers.triangles.bytes(),
                usage: wgpu::BufferUsages::STORAGE,
            });

        self.sphere_count = buffers.spheres.count() as u32;
        self.triangle_count = buffers.triangles.count() as u32;
        self.sphere_buffer = Some(sphere_buffer);
        self.triangle_buffer = Some(triangle_buffer);
        self.rebuild_bind_group();
        Ok(())
    }

    fn release_scene(&mut self) {
        self.sphere_buffer = None;
        self.triangle_buffer = None;
        self.sphere_count = 0;
        self.triangle_count = 0;
        self.bind_group = None;
    }

    fn trace(&mut self, inputs: &KernelInputs, target: &mut SampleSurface) -> Result<()> {
        let (width, height) = target.dimensions();
        self.resize_output(width, height);

        let Some(bind_group) = &self.bind_group else {
            return Err(Error::kernel("no scene uploaded"));
        };
        let output = self
            .output_texture
            .as_ref()
            .ok_or_else(|| Error::kernel("output texture missing"))?;
        let readback = self
            .readback_buffer
            .as_ref()
            .ok_or_else(|| Error::kernel("readback buffer missing"))?;

        let uniform = FrameUniform {
            camera_to_world: inputs.camera_to_world.to_cols_array_2d(),
            inverse_projection: inputs.inverse_projection.to_cols_array_2d(),
            light: inputs.light.to_array(),
            jitter: inputs.jitter.to_array(),
            env_intensity: inputs.env_intensity,
            frame_index: inputs.frame_index,
            sphere_count: self.sphere_count,
            triangle_count: self.triangle_count,
            _pad: [0; 2],
        };
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniform));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("trace_encoder"),
            });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("trace_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(width.div_ceil(WG_SIZE), height.div_ceil(WG_SIZE), 1);
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: output,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row(width)),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(Some(encoder.finish()));
        self.read_into(target)
    }
}

/// Row pitch aligned to `COPY_BYTES_PER_ROW_ALIGNMENT` (256).
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * TEXEL_BYTES;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (unpadded + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_rows_align_to_256() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(16), 256);
        assert_eq!(padded_bytes_per_row(17), 512);
        assert_eq!(padded_bytes_per_row(64), 1024);
    }

    #[test]
    fn test_frame_uniform_is_tightly_sized() {
        // Two mat4s + light vec4 + two 16-byte rows of scalars.
        assert_eq!(std::mem::size_of::<FrameUniform>(), 176);
    }
}
