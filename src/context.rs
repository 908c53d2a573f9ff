//! wgpu bring-up: instance, adapter, device, surface configuration, and the
//! capability verification the bake pass depends on.

use std::sync::Arc;

use log::info;
use winit::window::Window;

use crate::error::Error;

/// GPU context shared by every pass
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    /// True when only an sRGB swapchain format was available; the display
    /// pass then skips its own gamma encode.
    pub surface_is_srgb: bool,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>, capture_frames: bool) -> Result<Self, Error> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(Error::NoAdapter)?;

        verify_capabilities(&adapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // Prefer a non-sRGB swapchain so the display pass owns the output
        // color transform explicitly.
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);
        let surface_is_srgb = surface_format.is_srgb();

        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if capture_frames {
            usage |= wgpu::TextureUsages::COPY_SRC;
        }

        let config = wgpu::SurfaceConfiguration {
            usage,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        info!(
            "GPU context ready: {} ({:?}), surface {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            surface_format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            surface_is_srgb,
        })
    }

    /// Reconfigure the swapchain for a new viewport. Callers reallocate
    /// viewport-coupled render targets in the same step so no frame can
    /// observe a half-resized pipeline.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

/// The bake pass writes world-space displacement and normal to two float
/// color attachments in a single pass. An adapter that cannot do that must
/// fail here, at initialization, not degrade silently.
fn verify_capabilities(adapter: &wgpu::Adapter) -> Result<(), Error> {
    let limits = adapter.limits();
    if limits.max_color_attachments < 2 {
        return Err(Error::unsupported(format!(
            "need 2 simultaneous color attachments for the displacement bake, adapter allows {}",
            limits.max_color_attachments
        )));
    }
    // Two Rgba32Float attachments: 2 * 16 bytes per sample
    if limits.max_color_attachment_bytes_per_sample < 32 {
        return Err(Error::unsupported(format!(
            "need 32 color attachment bytes per sample, adapter allows {}",
            limits.max_color_attachment_bytes_per_sample
        )));
    }
    let float_target = adapter
        .get_texture_format_features(wgpu::TextureFormat::Rgba32Float)
        .allowed_usages;
    if !float_target.contains(wgpu::TextureUsages::RENDER_ATTACHMENT) {
        return Err(Error::unsupported(
            "Rgba32Float render attachments are not supported",
        ));
    }
    if !float_target.contains(wgpu::TextureUsages::TEXTURE_BINDING) {
        return Err(Error::unsupported(
            "Rgba32Float texture binding is not supported",
        ));
    }
    Ok(())
}
