//! Composition chain: the blend pass merging the caustic-lit base scene with
//! the water scene, and the display pass applying the output color transform.
//! Both are stateless full-screen triangles; their bind groups reference the
//! viewport-coupled targets and are rebuilt on resize.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::params::CompositorConfig;
use crate::passes::{sampler_entry, texture_entry, uniform_entry};
use crate::targets::{COLOR_FORMAT, TargetSet};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct BlendUniforms {
    /// x = blend factor, y = caustics strength
    params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct DisplayUniforms {
    /// x = 1/gamma
    params: [f32; 4],
}

pub struct CompositePass {
    blend_pipeline: wgpu::RenderPipeline,
    blend_layout: wgpu::BindGroupLayout,
    blend_bind_group: wgpu::BindGroup,
    blend_uniforms: wgpu::Buffer,

    display_pipeline: wgpu::RenderPipeline,
    display_layout: wgpu::BindGroupLayout,
    display_bind_group: wgpu::BindGroup,
    display_uniforms: wgpu::Buffer,

    sampler: wgpu::Sampler,
}

impl CompositePass {
    pub fn new(
        device: &wgpu::Device,
        targets: &TargetSet,
        surface_format: wgpu::TextureFormat,
        surface_is_srgb: bool,
        config: CompositorConfig,
    ) -> Self {
        let blend_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blend Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/blend.wgsl").into()),
        });
        let display_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Display Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/display.wgsl").into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Composite Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let blend_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Blend Uniform Buffer"),
            contents: bytemuck::cast_slice(&[BlendUniforms {
                params: [config.blend_factor, config.caustics_strength, 0.0, 0.0],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // An sRGB swapchain already encodes on write; apply unity gamma then.
        let gamma = if surface_is_srgb { 1.0 } else { config.gamma };
        let display_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Display Uniform Buffer"),
            contents: bytemuck::cast_slice(&[DisplayUniforms {
                params: [1.0 / gamma, 0.0, 0.0, 0.0],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let blend_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blend Bind Group Layout"),
            entries: &[
                texture_entry(0, true),
                texture_entry(1, true),
                texture_entry(2, true),
                sampler_entry(3),
                uniform_entry(4),
            ],
        });
        let display_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Display Bind Group Layout"),
            entries: &[texture_entry(0, true), sampler_entry(1), uniform_entry(2)],
        });

        let blend_pipeline = Self::fullscreen_pipeline(
            device,
            "Blend Pipeline",
            &blend_shader,
            &blend_layout,
            COLOR_FORMAT,
        );
        let display_pipeline = Self::fullscreen_pipeline(
            device,
            "Display Pipeline",
            &display_shader,
            &display_layout,
            surface_format,
        );

        let blend_bind_group =
            Self::blend_bind_group(device, &blend_layout, targets, &sampler, &blend_uniforms);
        let display_bind_group = Self::display_bind_group(
            device,
            &display_layout,
            targets,
            &sampler,
            &display_uniforms,
        );

        Self {
            blend_pipeline,
            blend_layout,
            blend_bind_group,
            blend_uniforms,
            display_pipeline,
            display_layout,
            display_bind_group,
            display_uniforms,
            sampler,
        }
    }

    /// Re-reference the viewport-coupled target views after a resize
    pub fn rebind(&mut self, device: &wgpu::Device, targets: &TargetSet) {
        self.blend_bind_group = Self::blend_bind_group(
            device,
            &self.blend_layout,
            targets,
            &self.sampler,
            &self.blend_uniforms,
        );
        self.display_bind_group = Self::display_bind_group(
            device,
            &self.display_layout,
            targets,
            &self.sampler,
            &self.display_uniforms,
        );
    }

    pub fn draw_blend<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        rpass.set_pipeline(&self.blend_pipeline);
        rpass.set_bind_group(0, &self.blend_bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }

    pub fn draw_display<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        rpass.set_pipeline(&self.display_pipeline);
        rpass.set_bind_group(0, &self.display_bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }

    fn fullscreen_pipeline(
        device: &wgpu::Device,
        label: &str,
        shader: &wgpu::ShaderModule,
        layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[layout],
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
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
        })
    }

    fn blend_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        targets: &TargetSet,
        sampler: &wgpu::Sampler,
        uniforms: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blend Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&targets.scene_a.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&targets.caustics.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&targets.scene_b.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: uniforms.as_entire_binding(),
                },
            ],
        })
    }

    fn display_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        targets: &TargetSet,
        sampler: &wgpu::Sampler,
        uniforms: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Display Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&targets.composite.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniforms.as_entire_binding(),
                },
            ],
        })
    }
}
