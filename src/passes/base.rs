//! Base scene pass: the lit, fogged seabed. Drawn once into scene color A
//! and once more underneath the water surface into scene color B.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::mesh::{GpuMesh, Vertex};
use crate::params::{CausticsConfig, SeabedConfig};
use crate::passes::uniform_entry;
use crate::targets::{COLOR_FORMAT, DEPTH_FORMAT};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct BaseUniforms {
    view_proj: [[f32; 4]; 4],
    camera: [f32; 4],
    /// rgb = ground color, a = ground depth
    ground: [f32; 4],
    /// rgb = fog color, a = fog density
    fog: [f32; 4],
}

/// Per-frame input, passed by value
#[derive(Debug, Clone, Copy)]
pub struct BaseFrame {
    pub view_proj: Mat4,
    pub camera_pos: Vec3,
}

pub struct BasePass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    seabed: SeabedConfig,
    ground_depth_m: f32,
}

impl BasePass {
    pub fn new(
        device: &wgpu::Device,
        lights_buffer: &wgpu::Buffer,
        seabed: SeabedConfig,
        caustics: &CausticsConfig,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Base Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/base.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Base Uniform Buffer"),
            contents: bytemuck::cast_slice(&[BaseUniforms::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Base Bind Group Layout"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Base Bind Group"),
            layout: &bind_group_layout,
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Base Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Base Pipeline"),
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
            bind_group,
            seabed,
            ground_depth_m: caustics.ground_depth_m,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, frame: &BaseFrame) {
        let s = &self.seabed;
        let uniforms = BaseUniforms {
            view_proj: frame.view_proj.to_cols_array_2d(),
            camera: [frame.camera_pos.x, frame.camera_pos.y, frame.camera_pos.z, 0.0],
            ground: [
                s.ground_color[0],
                s.ground_color[1],
                s.ground_color[2],
                self.ground_depth_m,
            ],
            fog: [s.fog_color[0], s.fog_color[1], s.fog_color[2], s.fog_density],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, mesh: &'a GpuMesh) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        mesh.draw(rpass);
    }
}
