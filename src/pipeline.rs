//! Frame orchestration. One host thread drives the fixed pass sequence:
//! bake and caustics first (independent of each other), then the base scene,
//! then the water surface, then blend and display. A consumer pass never
//! binds a target before the pass writing it has been recorded, so ordering
//! inside the single command encoder is the only synchronization needed.

use glam::Mat4;
use log::info;
use wgpu::util::DeviceExt;

use crate::camera::CameraRig;
use crate::clock::Clock;
use crate::context::GpuContext;
use crate::error::Error;
use crate::mesh::{GpuMesh, GridMesh};
use crate::params::{AppConfig, LightConfig, RecordingConfig};
use crate::passes::bake::BakePass;
use crate::passes::base::{BaseFrame, BasePass};
use crate::passes::caustics::{CausticsFrame, CausticsPass};
use crate::passes::composite::CompositePass;
use crate::passes::surface::{SurfaceFrame, SurfacePass};
use crate::scene::{EnvironmentMap, LightsUniform};
use crate::targets::TargetSet;
use crate::waves::WaveField;

/// Seabed extends past the ocean patch so the horizon does not show a seam
const SEABED_EXTENT_SCALE: f32 = 2.0;

pub struct OceanPipeline {
    config: AppConfig,
    wave_field: WaveField,
    clock: Clock,
    camera: CameraRig,

    targets: TargetSet,
    wave_buffer: wgpu::Buffer,
    wave_layout: wgpu::BindGroupLayout,
    wave_bind_group: wgpu::BindGroup,
    lights_buffer: wgpu::Buffer,
    environment: EnvironmentMap,

    bake: BakePass,
    caustics: CausticsPass,
    base: BasePass,
    surface: SurfacePass,
    composite: CompositePass,

    ocean_mesh: GpuMesh,
    bake_quad: GpuMesh,
    seabed_mesh: GpuMesh,

    recording: Option<RecordingConfig>,
}

impl OceanPipeline {
    pub fn new(
        ctx: &GpuContext,
        config: AppConfig,
        lights: Vec<LightConfig>,
        camera: CameraRig,
        environment_path: Option<&std::path::Path>,
        recording: Option<RecordingConfig>,
    ) -> Result<Self, Error> {
        config.validate(&lights)?;
        let device = &ctx.device;

        let clock = match &recording {
            Some(rec) => Clock::fixed_step(rec.fps),
            None => Clock::realtime(),
        };

        let wave_field = WaveField::new(config.ocean.waves.clone());
        let wave_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Wave Field Uniform Buffer"),
            contents: bytemuck::cast_slice(&[wave_field.uniforms(0.0)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let wave_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Wave Field Bind Group Layout"),
            entries: &[crate::passes::uniform_entry(0)],
        });
        let wave_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Wave Field Bind Group"),
            layout: &wave_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wave_buffer.as_entire_binding(),
            }],
        });

        let lights_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lights Uniform Buffer"),
            contents: bytemuck::cast_slice(&[LightsUniform::pack(&lights)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let targets = TargetSet::new(device, ctx.viewport(), config.bake.resolution);
        let environment = EnvironmentMap::load(device, &ctx.queue, environment_path);

        let extent = config.ocean.extent_m;
        let ocean_mesh = GridMesh::new(extent, config.ocean.tessellation).upload(device, "Ocean");
        let bake_quad = GridMesh::new(extent, 1).upload(device, "Bake Quad");
        let seabed_mesh =
            GridMesh::new(extent * SEABED_EXTENT_SCALE, 1).upload(device, "Seabed");

        let bake = BakePass::new(device, &wave_layout, extent);
        let caustics = CausticsPass::new(device, &wave_layout, config.caustics);
        let base = BasePass::new(device, &lights_buffer, config.seabed, &config.caustics);
        let surface = SurfacePass::new(
            device,
            &lights_buffer,
            &targets,
            &environment,
            config.material,
        );
        let composite = CompositePass::new(
            device,
            &targets,
            ctx.config.format,
            ctx.surface_is_srgb,
            config.compositor,
        );

        info!(
            "pipeline built: {} waves, {} lights, bake {}x{}",
            wave_field.wave_count(),
            lights.len(),
            targets.bake_size(),
            targets.bake_size()
        );

        Ok(Self {
            config,
            wave_field,
            clock,
            camera,
            targets,
            wave_buffer,
            wave_layout,
            wave_bind_group,
            lights_buffer,
            environment,
            bake,
            caustics,
            base,
            surface,
            composite,
            ocean_mesh,
            bake_quad,
            seabed_mesh,
            recording,
        })
    }

    /// Advance simulation time and push the derived wave uniforms. Phases
    /// grow monotonically; nothing else about the wave field mutates.
    pub fn tick(&mut self, queue: &wgpu::Queue) -> f32 {
        let sim_time = self.clock.tick();
        queue.write_buffer(
            &self.wave_buffer,
            0,
            bytemuck::cast_slice(&[self.wave_field.uniforms(sim_time)]),
        );
        sim_time
    }

    /// Swap in a new configuration: revalidate, rebuild the fixed-size
    /// uniform contracts and every pass. Distinct from per-frame `tick` by
    /// design; wave and light counts only change here.
    pub fn rebuild(
        &mut self,
        ctx: &GpuContext,
        config: AppConfig,
        lights: Vec<LightConfig>,
    ) -> Result<(), Error> {
        config.validate(&lights)?;
        let device = &ctx.device;

        self.wave_field = WaveField::new(config.ocean.waves.clone());
        ctx.queue.write_buffer(
            &self.wave_buffer,
            0,
            bytemuck::cast_slice(&[self.wave_field.uniforms(self.clock.sim_time_s())]),
        );
        ctx.queue.write_buffer(
            &self.lights_buffer,
            0,
            bytemuck::cast_slice(&[LightsUniform::pack(&lights)]),
        );

        if config.bake.resolution != self.targets.bake_size() {
            self.targets = TargetSet::new(device, ctx.viewport(), config.bake.resolution);
        }

        let extent = config.ocean.extent_m;
        self.ocean_mesh = GridMesh::new(extent, config.ocean.tessellation).upload(device, "Ocean");
        self.bake_quad = GridMesh::new(extent, 1).upload(device, "Bake Quad");
        self.seabed_mesh =
            GridMesh::new(extent * SEABED_EXTENT_SCALE, 1).upload(device, "Seabed");

        self.bake = BakePass::new(device, &self.wave_layout, extent);
        self.caustics = CausticsPass::new(device, &self.wave_layout, config.caustics);
        self.base = BasePass::new(device, &self.lights_buffer, config.seabed, &config.caustics);
        self.surface = SurfacePass::new(
            device,
            &self.lights_buffer,
            &self.targets,
            &self.environment,
            config.material,
        );
        self.composite = CompositePass::new(
            device,
            &self.targets,
            ctx.config.format,
            ctx.surface_is_srgb,
            config.compositor,
        );

        self.config = config;
        info!("pipeline rebuilt");
        Ok(())
    }

    /// Reallocate viewport-coupled targets and rebind the passes that
    /// reference them. Runs between frames, never during one, so no pass
    /// observes a target mid-reallocation. Bake targets are untouched.
    pub fn resize(&mut self, ctx: &mut GpuContext, width: u32, height: u32) {
        ctx.resize(width, height);
        self.targets.resize(&ctx.device, ctx.viewport());
        self.composite.rebind(&ctx.device, &self.targets);
        self.config.render.window_width = ctx.config.width;
        self.config.render.window_height = ctx.config.height;
    }

    /// Record and submit the full pass sequence, then present
    pub fn render(&mut self, ctx: &GpuContext, frame_num: usize) -> Result<(), wgpu::SurfaceError> {
        let sim_time = self.clock.sim_time_s();
        let (view_proj, camera_pos) = self.camera.view_proj(sim_time, &self.config.render);

        self.caustics.update(&ctx.queue, &CausticsFrame { view_proj });
        self.base.update(
            &ctx.queue,
            &BaseFrame {
                view_proj,
                camera_pos,
            },
        );
        self.surface.update(
            &ctx.queue,
            &SurfaceFrame {
                view_proj,
                model: Mat4::IDENTITY,
                camera_pos,
                sim_time_s: sim_time,
            },
        );

        let output = ctx.surface.get_current_texture()?;
        let frame_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        // 1. Bake displacement + normal maps (MRT, fixed resolution)
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Bake Pass"),
                color_attachments: &[
                    Some(color_attachment(&self.targets.position_map.view)),
                    Some(color_attachment(&self.targets.normal_map.view)),
                ],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.bake.draw(&mut rpass, &self.wave_bind_group, &self.bake_quad);
        }

        // 2. Caustics estimate (independent of the bake)
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Caustics Pass"),
                color_attachments: &[Some(color_attachment(&self.targets.caustics.view))],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.caustics
                .draw(&mut rpass, &self.wave_bind_group, &self.seabed_mesh);
        }

        // 3. Base scene into scene color A
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Base Scene Pass"),
                color_attachments: &[Some(color_attachment(&self.targets.scene_a.view))],
                depth_stencil_attachment: Some(depth_attachment(&self.targets.depth.view)),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.base.draw(&mut rpass, &self.seabed_mesh);
        }

        // 4. Full scene with water into scene color B
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Water Scene Pass"),
                color_attachments: &[Some(color_attachment(&self.targets.scene_b.view))],
                depth_stencil_attachment: Some(depth_attachment(&self.targets.depth.view)),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.base.draw(&mut rpass, &self.seabed_mesh);
            self.surface.draw(&mut rpass, &self.ocean_mesh);
        }

        // 5. Blend A, caustics and B
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blend Pass"),
                color_attachments: &[Some(color_attachment(&self.targets.composite.view))],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.composite.draw_blend(&mut rpass);
        }

        // 6. Display color transform onto the swapchain
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Display Pass"),
                color_attachments: &[Some(color_attachment(&frame_view))],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.composite.draw_display(&mut rpass);
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));

        if let Some(recording) = self.recording.clone() {
            self.capture_frame(ctx, frame_num, &recording, &output);
        }

        output.present();
        Ok(())
    }

    pub fn recording(&self) -> Option<&RecordingConfig> {
        self.recording.as_ref()
    }

    /// Capture the presented frame to disk (recording mode only)
    fn capture_frame(
        &self,
        ctx: &GpuContext,
        frame_num: usize,
        recording: &RecordingConfig,
        frame: &wgpu::SurfaceTexture,
    ) {
        let (width, height) = ctx.viewport();
        let bytes_per_pixel = 4u32;
        let unpadded_bytes_per_row = width * bytes_per_pixel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = (unpadded_bytes_per_row + align - 1) / align * align;

        let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Capture Buffer"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Capture Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &frame.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        ctx.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, |_| {});
        ctx.device.poll(wgpu::Maintain::Wait);

        let data = buffer_slice.get_mapped_range();
        let mut image_data = vec![0u8; (width * height * bytes_per_pixel) as usize];
        let swap_bgra = matches!(
            ctx.config.format,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        );
        for y in 0..height {
            let padded_offset = (y * padded_bytes_per_row) as usize;
            let unpadded_offset = (y * unpadded_bytes_per_row) as usize;
            let row =
                &mut image_data[unpadded_offset..unpadded_offset + unpadded_bytes_per_row as usize];
            row.copy_from_slice(&data[padded_offset..padded_offset + unpadded_bytes_per_row as usize]);
            if swap_bgra {
                for pixel in row.chunks_exact_mut(4) {
                    pixel.swap(0, 2);
                }
            }
        }
        drop(data);
        buffer.unmap();

        let frame_path = format!("{}/frame_{:05}.png", recording.frames_dir(), frame_num);
        if let Err(e) = image::save_buffer(
            &frame_path,
            &image_data,
            width,
            height,
            image::ColorType::Rgba8,
        ) {
            log::error!("failed to save frame {frame_num}: {e}");
        }
    }
}

fn color_attachment(view: &wgpu::TextureView) -> wgpu::RenderPassColorAttachment<'_> {
    wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            store: wgpu::StoreOp::Store,
        },
    }
}

fn depth_attachment(view: &wgpu::TextureView) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(1.0),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    }
}
