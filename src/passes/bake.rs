//! Displacement bake pass. Renders the flat ocean-extent grid through a
//! fixed top-down orthographic camera at bake resolution and writes the
//! wave-field displacement and normal into the two float maps in a single
//! multiple-render-target pass. Every later consumer reads these maps rather
//! than re-evaluating the waves per vertex.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::mesh::{GpuMesh, Vertex};
use crate::passes::uniform_entry;
use crate::targets::BAKE_FORMAT;
use crate::waves;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct BakeUniforms {
    view_proj: [[f32; 4]; 4],
}

pub struct BakePass {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
}

impl BakePass {
    pub fn new(
        device: &wgpu::Device,
        wave_layout: &wgpu::BindGroupLayout,
        ocean_extent_m: f32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bake Shader"),
            source: wgpu::ShaderSource::Wgsl(
                waves::assemble_shader(include_str!("../shaders/bake.wgsl")).into(),
            ),
        });

        // Fixed orthographic camera looking straight down at the ocean
        // extent; never changes with the viewport.
        let uniforms = BakeUniforms {
            view_proj: ortho_view_proj(ocean_extent_m).to_cols_array_2d(),
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bake Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bake Bind Group Layout"),
            entries: &[uniform_entry(0)],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bake Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bake Pipeline Layout"),
            bind_group_layouts: &[wave_layout, &bind_group_layout],
            push_constant_ranges: &[],
        });

        // Float targets are not blendable without extra features; the pass
        // overwrites every texel anyway.
        let float_target = Some(wgpu::ColorTargetState {
            format: BAKE_FORMAT,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Bake Pipeline"),
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
                targets: &[float_target.clone(), float_target],
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
            bind_group,
        }
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

/// Orthographic projection covering exactly the ocean extent, aimed straight
/// down with -Z up so bake texel (u, v) lands at mesh UV (u, v).
fn ortho_view_proj(extent_m: f32) -> Mat4 {
    let half = extent_m / 2.0;
    let view = Mat4::look_at_rh(Vec3::new(0.0, extent_m, 0.0), Vec3::ZERO, Vec3::NEG_Z);
    let proj = Mat4::orthographic_rh(-half, half, -half, half, 0.1, extent_m * 4.0);
    proj * view
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_ortho_maps_extent_corners_to_clip_corners() {
        let extent = 120.0;
        let vp = ortho_view_proj(extent);

        let corner = vp * Vec4::new(-60.0, 0.0, -60.0, 1.0);
        assert!((corner.x / corner.w + 1.0).abs() < 1e-4);
        assert!((corner.y / corner.w - 1.0).abs() < 1e-4);

        let opposite = vp * Vec4::new(60.0, 0.0, 60.0, 1.0);
        assert!((opposite.x / opposite.w - 1.0).abs() < 1e-4);
        assert!((opposite.y / opposite.w + 1.0).abs() < 1e-4);
    }
}
