//! Water surface pass. Displaces the coarse ocean mesh by the baked position
//! map in the vertex stage and shades with the baked normal map, Fresnel
//! reflection and the fixed light list in the fragment stage.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::mesh::{GpuMesh, Vertex};
use crate::params::SurfaceMaterial;
use crate::passes::{sampler_entry, texture_entry, uniform_entry};
use crate::scene::EnvironmentMap;
use crate::targets::{COLOR_FORMAT, DEPTH_FORMAT, TargetSet};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct SurfaceUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    camera: [f32; 4],
    base_color: [f32; 4],
    /// x = 1/roughness, y = environment flag, z = sim time
    params: [f32; 4],
}

/// Per-frame input, passed by value
#[derive(Debug, Clone, Copy)]
pub struct SurfaceFrame {
    pub view_proj: Mat4,
    pub model: Mat4,
    pub camera_pos: Vec3,
    pub sim_time_s: f32,
}

pub struct SurfacePass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
    material: SurfaceMaterial,
    environment_present: bool,
}

impl SurfacePass {
    pub fn new(
        device: &wgpu::Device,
        lights_buffer: &wgpu::Buffer,
        targets: &TargetSet,
        environment: &EnvironmentMap,
        material: SurfaceMaterial,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Surface Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/surface.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Surface Uniform Buffer"),
            contents: bytemuck::cast_slice(&[SurfaceUniforms::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Surface Uniform Bind Group Layout"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Surface Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
            ],
        });

        // The baked maps are Rgba32Float and read with textureLoad, so they
        // bind as non-filterable; only the environment map is filtered.
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Surface Texture Bind Group Layout"),
            entries: &[
                texture_entry(0, false),
                texture_entry(1, false),
                texture_entry(2, true),
                sampler_entry(3),
            ],
        });
        // The bake targets are session-fixed, so this bind group survives
        // viewport resizes.
        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Surface Texture Bind Group"),
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&targets.position_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&targets.normal_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&environment.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&environment.sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Surface Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Surface Pipeline"),
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
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group,
            material,
            environment_present: environment.present,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, frame: &SurfaceFrame) {
        let m = &self.material;
        let env_flag = if self.environment_present { 1.0 } else { 0.0 };
        let uniforms = SurfaceUniforms {
            view_proj: frame.view_proj.to_cols_array_2d(),
            model: frame.model.to_cols_array_2d(),
            normal_matrix: frame.model.inverse().transpose().to_cols_array_2d(),
            camera: [frame.camera_pos.x, frame.camera_pos.y, frame.camera_pos.z, 0.0],
            base_color: [m.base_color[0], m.base_color[1], m.base_color[2], m.opacity],
            params: [1.0 / m.roughness, env_flag, frame.sim_time_s, 0.0],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, mesh: &'a GpuMesh) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.uniform_bind_group, &[]);
        rpass.set_bind_group(1, &self.texture_bind_group, &[]);
        mesh.draw(rpass);
    }
}
