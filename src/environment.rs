//! HDR/EXR environment map loading and GPU resources.

use std::path::Path;

use half::f16;
use wgpu::util::DeviceExt;

use crate::error::{Error, Result};

/// Environment map texture the kernel samples for missed rays.
pub struct EnvironmentMap {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

/// Load an HDR/EXR file and create an `Rgba16Float` texture from it.
pub fn load_env_map(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    path: &Path,
) -> Result<EnvironmentMap> {
    use image::{GenericImageView, ImageReader};

    let img = ImageReader::open(path)
        .map_err(|e| Error::EnvMap(e.to_string()))?
        .decode()
        .map_err(|e| Error::EnvMap(e.to_string()))?;
    let (width, height) = img.dimensions();
    let rgba = img.to_rgba32f();

    // Convert f32 to f16 for a filterable HDR texture format.
    let data: Vec<f16> = rgba.as_raw().iter().map(|&v| f16::from_f32(v)).collect();

    Ok(create_env_texture(
        device,
        queue,
        width,
        height,
        bytemuck::cast_slice(&data),
        "hdr_env",
    ))
}

/// A 1x1 black environment for hosts that render without one.
pub fn create_default_env(device: &wgpu::Device, queue: &wgpu::Queue) -> EnvironmentMap {
    let data: [f16; 4] = [f16::ZERO, f16::ZERO, f16::ZERO, f16::ONE];
    create_env_texture(device, queue, 1, 1, bytemuck::cast_slice(&data), "default_env")
}

fn create_env_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    width: u32,
    height: u32,
    bytes: &[u8],
    label: &str,
) -> EnvironmentMap {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        bytes,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    EnvironmentMap {
        texture,
        view,
        sampler,
        width,
        height,
    }
}
