//! External scene inputs: the fixed-capacity light list uniform and the
//! optional equirectangular environment map.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use log::{info, warn};

use crate::error::Error;
use crate::params::LightConfig;

/// Light capacity baked into the shader uniform contract.
/// Must match `array<Light, 4>` in the surface and base shaders. The active
/// count is frozen when the pipeline is built; changing it is a rebuild.
pub const MAX_LIGHTS: usize = 4;

/// One packed light: `position.w` is 0 for directional, 1 for point;
/// `color.w` carries the intensity.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuLight {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightsUniform {
    pub lights: [GpuLight; MAX_LIGHTS],
    pub count: u32,
    pub _pad: [f32; 3],
}

impl LightsUniform {
    pub fn pack(lights: &[LightConfig]) -> Self {
        debug_assert!(lights.len() <= MAX_LIGHTS);
        let mut u = Self::zeroed();
        for (i, light) in lights.iter().take(MAX_LIGHTS).enumerate() {
            let kind = if light.directional { 0.0 } else { 1.0 };
            u.lights[i] = GpuLight {
                position: [light.position[0], light.position[1], light.position[2], kind],
                color: [light.color[0], light.color[1], light.color[2], light.intensity],
            };
        }
        u.count = lights.len().min(MAX_LIGHTS) as u32;
        u
    }
}

/// Environment map texture plus a flag telling the shader whether a real
/// asset is bound or the procedural sky fallback should be used.
pub struct EnvironmentMap {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub present: bool,
}

impl EnvironmentMap {
    /// Load an equirectangular environment image, or fall back to a 1x1
    /// placeholder. A missing or unreadable asset degrades the scene
    /// visually but never aborts the pipeline.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: Option<&Path>,
    ) -> Self {
        match path {
            Some(path) => match Self::decode(device, queue, path) {
                Ok(env) => {
                    info!("environment map loaded from {}", path.display());
                    env
                }
                Err(e) => {
                    warn!(
                        "environment map {} unavailable ({e}), using procedural sky",
                        path.display()
                    );
                    Self::placeholder(device, queue)
                }
            },
            None => Self::placeholder(device, queue),
        }
    }

    fn decode(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path) -> Result<Self, Error> {
        let image = image::open(path)?.to_rgba8();
        let (width, height) = image.dimensions();
        let texture = Self::upload(device, queue, width, height, &image);
        Ok(Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            sampler: Self::create_sampler(device),
            present: true,
        })
    }

    fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let texture = Self::upload(device, queue, 1, 1, &[90, 120, 150, 255]);
        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            sampler: Self::create_sampler(device),
            present: false,
        }
    }

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Environment Map"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        texture
    }

    fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Environment Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lights_uniform_packing() {
        let lights = vec![
            LightConfig {
                position: [5.0, 5.0, 5.0],
                color: [1.0, 0.37, 0.37],
                intensity: 2.0,
                directional: true,
            },
            LightConfig {
                position: [0.0, 10.0, 0.0],
                color: [1.0, 1.0, 1.0],
                intensity: 0.5,
                directional: false,
            },
        ];
        let u = LightsUniform::pack(&lights);

        assert_eq!(u.count, 2);
        assert_eq!(u.lights[0].position[3], 0.0); // directional
        assert_eq!(u.lights[1].position[3], 1.0); // point
        assert_eq!(u.lights[0].color[3], 2.0); // intensity
        assert_eq!(u.lights[2].color, [0.0; 4]); // unused slots zeroed
    }

    #[test]
    fn test_lights_uniform_layout_size() {
        // Must stay in sync with the WGSL Lights struct.
        assert_eq!(
            std::mem::size_of::<LightsUniform>(),
            MAX_LIGHTS * 32 + 16
        );
    }
}
