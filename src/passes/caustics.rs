//! Caustics estimation pass. Renders the seabed plane with a material that
//! evaluates the shared wave function per fragment (independent of the bake
//! pass) and converts the local wave normal into a focusing intensity.
//!
//! The two strategies from the configuration stay separate models behind an
//! explicit selection; the pure-math mirrors of both live here as well so
//! the clamping behavior is testable without a GPU.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::mesh::{GpuMesh, Vertex};
use crate::params::{CausticsConfig, CausticsModel};
use crate::passes::uniform_entry;
use crate::targets::COLOR_FORMAT;
use crate::waves;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct CausticsUniforms {
    view_proj: [[f32; 4]; 4],
    /// x = ground_depth, y = intercept_near, z = intercept_far, w = ior_ratio
    geometry: [f32; 4],
    /// x = min_intensity, y = max_intensity, z = refraction_sharpness
    intensity: [f32; 4],
    model: u32,
    _pad: [f32; 3],
}

/// Per-frame input, passed by value; the pass holds no live scene state
#[derive(Debug, Clone, Copy)]
pub struct CausticsFrame {
    pub view_proj: Mat4,
}

pub struct CausticsPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    config: CausticsConfig,
}

impl CausticsPass {
    pub fn new(
        device: &wgpu::Device,
        wave_layout: &wgpu::BindGroupLayout,
        config: CausticsConfig,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Caustics Shader"),
            source: wgpu::ShaderSource::Wgsl(
                waves::assemble_shader(include_str!("../shaders/caustics.wgsl")).into(),
            ),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Caustics Uniform Buffer"),
            contents: bytemuck::cast_slice(&[CausticsUniforms::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Caustics Bind Group Layout"),
            entries: &[uniform_entry(0)],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Caustics Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Caustics Pipeline Layout"),
            bind_group_layouts: &[wave_layout, &bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Caustics Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
            config,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, frame: &CausticsFrame) {
        let c = &self.config;
        let model = match c.model {
            CausticsModel::Distance => 0u32,
            CausticsModel::Refraction => 1u32,
        };
        let uniforms = CausticsUniforms {
            view_proj: frame.view_proj.to_cols_array_2d(),
            geometry: [
                c.ground_depth_m,
                c.intercept_near_m,
                c.intercept_far_m,
                c.ior_ratio,
            ],
            intensity: [c.min_intensity, c.max_intensity, c.refraction_sharpness, 0.0],
            model,
            _pad: [0.0; 3],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    pub fn draw<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        wave_bind_group: &'a wgpu::BindGroup,
        mesh: &'a GpuMesh,
    ) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, wave_bind_group, &[]);
        rpass.set_bind_group(1, &self.bind_group, &[]);
        mesh.draw(rpass);
    }
}

/// CPU mirror of the shader's intercept-distance model. Intensity is an
/// affine function of the window-normalized intercept distance, clamped to
/// [0, 1] for arbitrary (negative or huge) intercepts.
pub fn distance_intensity(normal: Vec3, config: &CausticsConfig) -> f32 {
    let line_dir = -normal;
    let plane_d = -config.ground_depth_m;

    let denom = line_dir.y;
    let intercept = if denom.abs() > 1e-6 {
        plane_d / denom
    } else {
        config.intercept_far_m
    };

    let bounded = intercept.clamp(config.intercept_near_m, config.intercept_far_m);
    let t = (bounded - config.intercept_near_m)
        / (config.intercept_far_m - config.intercept_near_m);
    (config.max_intensity + (config.min_intensity - config.max_intensity) * t).clamp(0.0, 1.0)
}

/// CPU mirror of the shader's Snell-refraction model
pub fn refraction_intensity(normal: Vec3, config: &CausticsConfig) -> f32 {
    let eta = config.ior_ratio;
    let incident = Vec3::NEG_Y;

    // refract() per the GLSL/WGSL definition
    let cos_i = -incident.dot(normal);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return 0.0;
    }
    let refracted = eta * incident + (eta * cos_i - k.sqrt()) * normal;

    let alignment = (-refracted.y).max(0.0);
    alignment
        .powf(config.refraction_sharpness)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tilted_normal(x: f32) -> Vec3 {
        Vec3::new(x, 1.0, 0.0).normalize()
    }

    #[test]
    fn test_flat_normal_gives_shortest_intercept() {
        let config = CausticsConfig::default();
        // Straight-down normal intercepts at exactly ground_depth, inside
        // the window, so intensity is near the maximum end.
        let flat = distance_intensity(Vec3::Y, &config);
        let tilted = distance_intensity(tilted_normal(1.2), &config);
        assert!(flat >= tilted);
    }

    #[test]
    fn test_distance_intensity_clamped_for_extreme_normals() {
        let config = CausticsConfig::default();
        // Grazing and inverted normals produce huge or negative intercepts;
        // output must stay a valid color regardless.
        let cases = [
            Vec3::Y,
            tilted_normal(50.0),
            Vec3::new(1.0, 1e-5, 0.0).normalize(),
            Vec3::new(0.3, -1.0, 0.1).normalize(),
            Vec3::NEG_Y,
        ];
        for normal in cases {
            let i = distance_intensity(normal, &config);
            assert!((0.0..=1.0).contains(&i), "intensity {i} out of range");
        }
    }

    #[test]
    fn test_distance_intensity_clamped_for_extreme_config() {
        // An intensity range wider than [0,1] must still clamp.
        let config = CausticsConfig {
            max_intensity: 4.0,
            min_intensity: -2.0,
            ..CausticsConfig::default()
        };
        for x in [0.0, 0.2, 0.8, 3.0] {
            let i = distance_intensity(tilted_normal(x), &config);
            assert!((0.0..=1.0).contains(&i), "intensity {i} out of range");
        }
    }

    #[test]
    fn test_refraction_vertical_normal_is_fully_aligned() {
        let config = CausticsConfig::default();
        let i = refraction_intensity(Vec3::Y, &config);
        assert!((i - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_refraction_intensity_clamped() {
        let config = CausticsConfig::default();
        for x in [0.0, 0.5, 2.0, 20.0] {
            let i = refraction_intensity(tilted_normal(x), &config);
            assert!((0.0..=1.0).contains(&i), "intensity {i} out of range");
        }
    }

    #[test]
    fn test_refraction_bends_toward_vertical_less_when_tilted() {
        let config = CausticsConfig::default();
        let straight = refraction_intensity(Vec3::Y, &config);
        let tilted = refraction_intensity(tilted_normal(0.6), &config);
        assert!(straight > tilted);
    }
}
