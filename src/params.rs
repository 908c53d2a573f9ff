//! Parameter definitions with physical units and documented semantics.
//!
//! Everything the pipeline consumes at build time lives here. Wave and light
//! lists are immutable once the pipeline is built; changing them is a
//! `rebuild`, not a per-frame mutation.

use crate::error::Error;
use crate::scene::MAX_LIGHTS;
use crate::waves::MAX_WAVES;

/// One traveling wave component of the ocean surface.
///
/// Steepness is deliberately not clamped: values large enough to loop the
/// crest produce self-intersecting geometry, matching reference behavior.
#[derive(Debug, Clone, Copy)]
pub struct WaveDescriptor {
    /// Crest-to-crest wavelength (meters). Must be > 0.
    pub wavelength_m: f32,

    /// Vertical wave height (meters). Must be >= 0.
    pub amplitude_m: f32,

    /// Phase speed (meters per second). Negative reverses travel direction.
    pub speed_m_per_s: f32,

    /// Travel direction in the horizontal plane (degrees, 0 = +X).
    pub direction_deg: f32,

    /// Horizontal crest sharpening factor (dimensionless). Must be >= 0.
    pub steepness: f32,
}

/// Ocean surface extent, tessellation and wave list
#[derive(Debug, Clone)]
pub struct OceanConfig {
    /// Side length of the square ocean patch (meters)
    pub extent_m: f32,

    /// Surface mesh subdivisions per side. Kept coarse on purpose: wave
    /// detail comes from the baked displacement map, not mesh density.
    pub tessellation: usize,

    /// Wave components, at most [`MAX_WAVES`]
    pub waves: Vec<WaveDescriptor>,
}

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            extent_m: 120.0,
            tessellation: 96,
            waves: vec![
                WaveDescriptor {
                    wavelength_m: 34.0,
                    amplitude_m: 0.9,
                    speed_m_per_s: 6.0,
                    direction_deg: 12.0,
                    steepness: 0.55,
                },
                WaveDescriptor {
                    wavelength_m: 19.0,
                    amplitude_m: 0.45,
                    speed_m_per_s: 4.5,
                    direction_deg: 83.0,
                    steepness: 0.4,
                },
                WaveDescriptor {
                    wavelength_m: 11.0,
                    amplitude_m: 0.22,
                    speed_m_per_s: 3.2,
                    direction_deg: -41.0,
                    steepness: 0.35,
                },
                WaveDescriptor {
                    wavelength_m: 6.5,
                    amplitude_m: 0.09,
                    speed_m_per_s: 2.4,
                    direction_deg: 147.0,
                    steepness: 0.25,
                },
            ],
        }
    }
}

/// Water surface material parameters
#[derive(Debug, Clone, Copy)]
pub struct SurfaceMaterial {
    /// Base diffuse water color (linear RGB)
    pub base_color: [f32; 3],

    /// Specular falloff control. The specular exponent is `1/roughness`,
    /// so 0 is a caller error rejected by `validate()`.
    pub roughness: f32,

    /// Output alpha for the translucent water look
    pub opacity: f32,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            base_color: [0.02, 0.12, 0.18],
            roughness: 0.04,
            opacity: 0.86,
        }
    }
}

/// Caustics approximation strategy.
///
/// The two models are not reconciled into one physical model; selection is
/// always explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CausticsModel {
    /// Intercept-distance model: intersect a ray along the negated wave
    /// normal with the ground plane; short intercepts mean strong focusing.
    Distance,

    /// Snell-refraction model: bend the vertical ray at the surface and use
    /// alignment with vertical as the focusing proxy.
    Refraction,
}

/// Seabed / underwater look parameters
#[derive(Debug, Clone, Copy)]
pub struct CausticsConfig {
    pub model: CausticsModel,

    /// Depth of the seabed plane below the rest surface (meters)
    pub ground_depth_m: f32,

    /// Near edge of the intercept-distance window (meters)
    pub intercept_near_m: f32,

    /// Far edge of the intercept-distance window (meters)
    pub intercept_far_m: f32,

    /// Intensity written for the shortest intercept (clamped to [0,1])
    pub max_intensity: f32,

    /// Intensity written for the longest intercept (clamped to [0,1])
    pub min_intensity: f32,

    /// Index-of-refraction ratio for the refraction model (water/air)
    pub ior_ratio: f32,

    /// Exponent sharpening the refraction-model alignment term
    pub refraction_sharpness: f32,
}

impl Default for CausticsConfig {
    fn default() -> Self {
        Self {
            model: CausticsModel::Distance,
            ground_depth_m: 8.0,
            intercept_near_m: 6.0,
            intercept_far_m: 26.0,
            max_intensity: 1.0,
            min_intensity: 0.0,
            ior_ratio: 1.0 / 1.33,
            refraction_sharpness: 32.0,
        }
    }
}

/// Seabed shading parameters for the base scene pass
#[derive(Debug, Clone, Copy)]
pub struct SeabedConfig {
    /// Seabed diffuse color (linear RGB)
    pub ground_color: [f32; 3],

    /// Underwater fog color (linear RGB)
    pub fog_color: [f32; 3],

    /// Exponential fog density (per meter of view distance)
    pub fog_density: f32,
}

impl Default for SeabedConfig {
    fn default() -> Self {
        Self {
            ground_color: [0.23, 0.2, 0.14],
            fog_color: [0.03, 0.1, 0.14],
            fog_density: 0.008,
        }
    }
}

/// Full-screen composition parameters
#[derive(Debug, Clone, Copy)]
pub struct CompositorConfig {
    /// Interpolation weight between the caustic-lit base scene and the
    /// water scene (0 = base only, 1 = water scene only)
    pub blend_factor: f32,

    /// Multiplier applied to the caustics buffer when lighting the base scene
    pub caustics_strength: f32,

    /// Display gamma for the final output transform
    pub gamma: f32,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            blend_factor: 0.82,
            caustics_strength: 1.4,
            gamma: 2.2,
        }
    }
}

/// One scene light. Count is frozen when the pipeline is built.
#[derive(Debug, Clone, Copy)]
pub struct LightConfig {
    /// World position (point light) or direction toward the light
    /// (directional light)
    pub position: [f32; 3],

    /// Light color (linear RGB)
    pub color: [f32; 3],

    pub intensity: f32,

    /// Directional lights ignore distance attenuation
    pub directional: bool,
}

/// Default light rig: two opposing colored directional lights, one warm
/// from above, one cool from below the horizon.
pub fn default_lights() -> Vec<LightConfig> {
    vec![
        LightConfig {
            position: [5.0, 5.0, 5.0],
            color: [1.0, 0.37, 0.37],
            intensity: 1.0,
            directional: true,
        },
        LightConfig {
            position: [-5.0, -5.0, -5.0],
            color: [0.12, 0.12, 1.0],
            intensity: 1.0,
            directional: true,
        },
    ]
}

/// Displacement/normal bake target configuration
#[derive(Debug, Clone, Copy)]
pub struct BakeConfig {
    /// Bake target resolution (texels per side). Fixed for the session and
    /// decoupled from the display viewport.
    pub resolution: u32,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self { resolution: 512 }
    }
}

/// Window and projection configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (meters)
    pub near_plane_m: f32,

    /// Far clipping plane (meters)
    pub far_plane_m: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 50.0,
            near_plane_m: 0.1,
            far_plane_m: 1000.0,
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height as f32
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for captured frames
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }
}

/// Everything the pipeline needs at build time
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub ocean: OceanConfig,
    pub material: SurfaceMaterial,
    pub caustics: CausticsConfig,
    pub seabed: SeabedConfig,
    pub compositor: CompositorConfig,
    pub bake: BakeConfig,
    pub render: RenderConfig,
}

impl AppConfig {
    /// Reject degenerate parameters before they reach shading code, where
    /// they would silently produce NaN/undefined results.
    pub fn validate(&self, lights: &[LightConfig]) -> Result<(), Error> {
        if self.ocean.waves.len() > MAX_WAVES {
            return Err(Error::invalid_config(format!(
                "{} waves exceeds capacity of {}",
                self.ocean.waves.len(),
                MAX_WAVES
            )));
        }
        for (i, wave) in self.ocean.waves.iter().enumerate() {
            if wave.wavelength_m <= 0.0 {
                return Err(Error::invalid_config(format!(
                    "wave {i}: wavelength must be > 0, got {}",
                    wave.wavelength_m
                )));
            }
            if wave.amplitude_m < 0.0 {
                return Err(Error::invalid_config(format!(
                    "wave {i}: amplitude must be >= 0, got {}",
                    wave.amplitude_m
                )));
            }
            if wave.steepness < 0.0 {
                return Err(Error::invalid_config(format!(
                    "wave {i}: steepness must be >= 0, got {}",
                    wave.steepness
                )));
            }
        }
        if self.material.roughness <= 0.0 {
            return Err(Error::invalid_config(
                "roughness must be > 0 (specular exponent is 1/roughness)",
            ));
        }
        if lights.len() > MAX_LIGHTS {
            return Err(Error::invalid_config(format!(
                "{} lights exceeds capacity of {}",
                lights.len(),
                MAX_LIGHTS
            )));
        }
        if self.caustics.intercept_far_m <= self.caustics.intercept_near_m {
            return Err(Error::invalid_config(
                "caustics intercept window must satisfy near < far",
            ));
        }
        if self.bake.resolution == 0 {
            return Err(Error::invalid_config("bake resolution must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate(&default_lights()).is_ok());
    }

    #[test]
    fn test_zero_wavelength_rejected() {
        let mut config = AppConfig::default();
        config.ocean.waves[0].wavelength_m = 0.0;
        assert!(config.validate(&default_lights()).is_err());
    }

    #[test]
    fn test_zero_roughness_rejected() {
        let mut config = AppConfig::default();
        config.material.roughness = 0.0;
        assert!(config.validate(&default_lights()).is_err());
    }

    #[test]
    fn test_too_many_waves_rejected() {
        let mut config = AppConfig::default();
        let wave = config.ocean.waves[0];
        config.ocean.waves = vec![wave; MAX_WAVES + 1];
        assert!(config.validate(&default_lights()).is_err());
    }

    #[test]
    fn test_too_many_lights_rejected() {
        let config = AppConfig::default();
        let lights = vec![default_lights()[0]; MAX_LIGHTS + 1];
        assert!(config.validate(&lights).is_err());
    }

    #[test]
    fn test_inverted_intercept_window_rejected() {
        let mut config = AppConfig::default();
        config.caustics.intercept_near_m = 30.0;
        config.caustics.intercept_far_m = 10.0;
        assert!(config.validate(&default_lights()).is_err());
    }
}
