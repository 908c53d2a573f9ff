//! Render target set. Each target is owned by the pipeline stage that
//! produces it; viewport-coupled targets reallocate on resize while the bake
//! pair stays at its fixed resolution, decoupling simulation resolution from
//! display resolution.

/// How a target tracks the output viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    /// Reallocated in lockstep with the viewport
    Viewport,
    /// Square, fixed for the session (bake targets)
    Fixed(u32),
}

/// Resolve the texture extent for a sizing policy at a given viewport
pub fn extent_for(sizing: Sizing, viewport: (u32, u32)) -> wgpu::Extent3d {
    let (width, height) = match sizing {
        Sizing::Viewport => viewport,
        Sizing::Fixed(side) => (side, side),
    };
    wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    }
}

/// One GPU-owned color or depth attachment
pub struct Target {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

impl Target {
    fn new(
        device: &wgpu::Device,
        label: &str,
        extent: wgpu::Extent3d,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            format,
        }
    }
}

/// Formats for the intermediate buffers
pub const BAKE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// All intermediate targets of the pass chain
pub struct TargetSet {
    /// World-space displacement per bake texel (float precision, fixed size)
    pub position_map: Target,
    /// World-space normal per bake texel (float precision, fixed size)
    pub normal_map: Target,
    /// Caustics intensity over the seabed (viewport)
    pub caustics: Target,
    /// Base scene color (viewport)
    pub scene_a: Target,
    /// Scene-with-water color (viewport)
    pub scene_b: Target,
    /// Blend pass output, consumed by the display pass (viewport)
    pub composite: Target,
    /// Shared depth buffer for the scene passes (viewport)
    pub depth: Target,

    bake_size: u32,
}

impl TargetSet {
    pub fn new(device: &wgpu::Device, viewport: (u32, u32), bake_size: u32) -> Self {
        let attach = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let bake_extent = extent_for(Sizing::Fixed(bake_size), viewport);

        let mut set = Self {
            position_map: Target::new(device, "Position Map", bake_extent, BAKE_FORMAT, attach),
            normal_map: Target::new(device, "Normal Map", bake_extent, BAKE_FORMAT, attach),
            caustics: Target::new(device, "Caustics Buffer", bake_extent, COLOR_FORMAT, attach),
            scene_a: Target::new(device, "Scene Color A", bake_extent, COLOR_FORMAT, attach),
            scene_b: Target::new(device, "Scene Color B", bake_extent, COLOR_FORMAT, attach),
            composite: Target::new(device, "Composite", bake_extent, COLOR_FORMAT, attach),
            depth: Target::new(
                device,
                "Scene Depth",
                bake_extent,
                DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            ),
            bake_size,
        };
        // The viewport-coupled targets were created at a placeholder extent;
        // size them properly in one place.
        set.resize(device, viewport);
        set
    }

    /// Reallocate every viewport-coupled target. The bake pair is left
    /// untouched regardless of the new viewport.
    pub fn resize(&mut self, device: &wgpu::Device, viewport: (u32, u32)) {
        let attach = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let extent = extent_for(Sizing::Viewport, viewport);

        self.caustics = Target::new(device, "Caustics Buffer", extent, COLOR_FORMAT, attach);
        self.scene_a = Target::new(device, "Scene Color A", extent, COLOR_FORMAT, attach);
        self.scene_b = Target::new(device, "Scene Color B", extent, COLOR_FORMAT, attach);
        self.composite = Target::new(device, "Composite", extent, COLOR_FORMAT, attach);
        self.depth = Target::new(
            device,
            "Scene Depth",
            extent,
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
    }

    pub fn bake_size(&self) -> u32 {
        self.bake_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_sizing_tracks_viewport() {
        let small = extent_for(Sizing::Viewport, (800, 600));
        let large = extent_for(Sizing::Viewport, (1920, 1080));
        assert_eq!((small.width, small.height), (800, 600));
        assert_eq!((large.width, large.height), (1920, 1080));
    }

    #[test]
    fn test_fixed_sizing_ignores_viewport() {
        // Bake targets must not change across a resize.
        let before = extent_for(Sizing::Fixed(512), (800, 600));
        let after = extent_for(Sizing::Fixed(512), (1920, 1080));
        assert_eq!((before.width, before.height), (512, 512));
        assert_eq!((after.width, after.height), (512, 512));
    }

    #[test]
    fn test_zero_viewport_clamped() {
        let extent = extent_for(Sizing::Viewport, (0, 0));
        assert_eq!((extent.width, extent.height), (1, 1));
    }
}
