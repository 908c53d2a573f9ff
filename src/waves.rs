//! Gerstner wave field: descriptor list, per-frame uniform derivation, and a
//! CPU reference evaluation that mirrors the WGSL `wave_sample` function
//! operation for operation.
//!
//! Two GPU call sites consume this model (the displacement bake pass and the
//! caustics pass). Both compile the identical `waves.wgsl` source against the
//! identical uniform buffer, so equal inputs produce bit-equivalent results;
//! the CPU implementation here is the test oracle for that shared function.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::params::WaveDescriptor;

/// Wave capacity baked into the shader uniform contract.
/// Must match `array<vec4f, 8>` in `shaders/waves.wgsl`.
pub const MAX_WAVES: usize = 8;

/// Per-sample result of the wave superposition, world y-up:
/// `offset.xz` is horizontal displacement, `offset.y` is height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    pub offset: Vec3,
    pub normal: Vec3,
}

/// Flattened per-frame wave data, shared by the bake and caustics shaders.
///
/// Layout matches `WaveFieldUniforms` in `shaders/waves.wgsl`:
/// `dir_freq[i] = (dir.x, dir.y, frequency, inverse_frequency)`,
/// `amp_steep_phase[i] = (amplitude, steepness, phase, 0)`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WaveFieldUniforms {
    pub dir_freq: [[f32; 4]; MAX_WAVES],
    pub amp_steep_phase: [[f32; 4]; MAX_WAVES],
    pub wave_count: u32,
    pub sim_time: f32,
    pub _pad: [f32; 2],
}

/// Ordered, immutable wave descriptor list with derived evaluation
pub struct WaveField {
    waves: Vec<WaveDescriptor>,
}

impl WaveField {
    pub fn new(waves: Vec<WaveDescriptor>) -> Self {
        debug_assert!(waves.len() <= MAX_WAVES);
        Self { waves }
    }

    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    /// Derive the flattened uniform arrays for the given simulation time.
    ///
    /// `phase = speed * sim_time * frequency` grows monotonically with time
    /// and is never wrapped, so the surface stays continuous across frames.
    pub fn uniforms(&self, sim_time: f32) -> WaveFieldUniforms {
        let mut u = WaveFieldUniforms::zeroed();
        for (i, wave) in self.waves.iter().enumerate() {
            let frequency = TAU / wave.wavelength_m;
            let inverse_frequency = wave.wavelength_m / TAU;
            let phase = wave.speed_m_per_s * sim_time * frequency;
            let theta = wave.direction_deg.to_radians();
            u.dir_freq[i] = [theta.cos(), theta.sin(), frequency, inverse_frequency];
            u.amp_steep_phase[i] = [wave.amplitude_m, wave.steepness, phase, 0.0];
        }
        u.wave_count = self.waves.len() as u32;
        u.sim_time = sim_time;
        u
    }

    /// Evaluate the superposition at a horizontal sample point.
    ///
    /// Pure function of the descriptor list and `sim_time`; mirrors the WGSL
    /// `wave_sample` exactly. With zero waves this returns zero offset and
    /// the flat normal, no division by count.
    pub fn evaluate(&self, sample_xz: Vec2, sim_time: f32) -> Displacement {
        evaluate_uniforms(&self.uniforms(sim_time), sample_xz)
    }
}

/// Superposition over pre-derived uniforms (the exact GPU-side input)
pub fn evaluate_uniforms(u: &WaveFieldUniforms, sample_xz: Vec2) -> Displacement {
    let mut offset = Vec3::ZERO;
    let mut normal = Vec3::Y;

    if u.wave_count == 0 {
        return Displacement { offset, normal };
    }
    let count = u.wave_count as f32;

    for i in 0..u.wave_count as usize {
        let dir = Vec2::new(u.dir_freq[i][0], u.dir_freq[i][1]);
        let frequency = u.dir_freq[i][2];
        let inverse_frequency = u.dir_freq[i][3];
        let amplitude = u.amp_steep_phase[i][0];
        let steepness = u.amp_steep_phase[i][1];
        let phase = u.amp_steep_phase[i][2];

        let theta = dir.dot(sample_xz) * frequency + phase;
        let c = theta.cos();
        let s = theta.sin();

        offset.x += steepness * inverse_frequency * dir.x * c;
        offset.z += steepness * inverse_frequency * dir.y * c;
        offset.y += amplitude * s;

        normal.x -= dir.x * frequency * amplitude * c;
        normal.z -= dir.y * frequency * amplitude * c;
        normal.y -= (steepness / count) * s;
    }

    // Horizontal displacement is count-normalized; height is the raw sum.
    offset.x /= count;
    offset.z /= count;

    Displacement {
        offset,
        normal: normal.normalize(),
    }
}

/// Shared WGSL wave library, prepended to every shader that evaluates the
/// wave field so all call sites compile the same function.
pub fn shader_library() -> &'static str {
    include_str!("shaders/waves.wgsl")
}

/// Assemble a consumer shader from the shared library and a pass body
pub fn assemble_shader(body: &'static str) -> String {
    format!("{}\n{}", shader_library(), body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_wave() -> WaveDescriptor {
        WaveDescriptor {
            wavelength_m: 5.0,
            amplitude_m: 0.5,
            speed_m_per_s: 1.0,
            direction_deg: 0.0,
            steepness: 0.2,
        }
    }

    #[test]
    fn test_zero_waves_returns_flat_surface() {
        let field = WaveField::new(vec![]);
        let d = field.evaluate(Vec2::new(3.7, -12.0), 42.0);
        assert_eq!(d.offset, Vec3::ZERO);
        assert_eq!(d.normal, Vec3::Y);
    }

    #[test]
    fn test_frequency_inverse_frequency_product_is_one() {
        let field = WaveField::new(vec![single_wave()]);
        let u = field.uniforms(0.0);
        let product = u.dir_freq[0][2] * u.dir_freq[0][3];
        assert!((product - 1.0).abs() < 1e-6, "got {product}");
    }

    #[test]
    fn test_phase_is_monotonic_in_time() {
        let field = WaveField::new(vec![single_wave()]);
        let phase_early = field.uniforms(1.0).amp_steep_phase[0][2];
        let phase_late = field.uniforms(2.5).amp_steep_phase[0][2];
        assert!(phase_late > phase_early);
    }

    #[test]
    fn test_horizontal_displacement_is_count_normalized() {
        // N identical waves must displace horizontally exactly as far as one.
        let one = WaveField::new(vec![single_wave()]);
        let five = WaveField::new(vec![single_wave(); 5]);

        let sample = Vec2::new(1.3, 0.4);
        let a = one.evaluate(sample, 0.7).offset;
        let b = five.evaluate(sample, 0.7).offset;

        let horiz_a = Vec2::new(a.x, a.z).length();
        let horiz_b = Vec2::new(b.x, b.z).length();
        assert!((horiz_a - horiz_b).abs() < 1e-6);
    }

    #[test]
    fn test_evaluate_is_deterministic_across_call_sites() {
        let field = WaveField::new(vec![
            single_wave(),
            WaveDescriptor {
                wavelength_m: 9.0,
                amplitude_m: 0.3,
                speed_m_per_s: 2.0,
                direction_deg: 67.0,
                steepness: 0.6,
            },
        ]);
        let sample = Vec2::new(-4.2, 8.8);

        // Direct evaluation vs evaluation over pre-derived uniforms (the
        // bake-pass input path) must agree bit for bit.
        let direct = field.evaluate(sample, 3.25);
        let via_uniforms = evaluate_uniforms(&field.uniforms(3.25), sample);
        assert_eq!(direct, via_uniforms);
        assert_eq!(direct, field.evaluate(sample, 3.25));
    }

    #[test]
    fn test_single_wave_at_origin_time_zero() {
        // dp = 0, so cos = 1 and sin = 0: no height, horizontal push along
        // +X, normal tilted toward -X.
        let field = WaveField::new(vec![single_wave()]);
        let d = field.evaluate(Vec2::ZERO, 0.0);

        assert_eq!(d.offset.y, 0.0);
        assert!(d.offset.x > 0.0);
        assert_eq!(d.offset.z, 0.0);
        assert!(d.normal.x < 0.0);
        assert!(d.normal.y > 0.0);
        let expected_x = 0.2 * (5.0 / TAU);
        assert!((d.offset.x - expected_x).abs() < 1e-6);
    }

    #[test]
    fn test_combined_height_bounded_by_amplitude_sum() {
        let wave = WaveDescriptor {
            amplitude_m: 0.1,
            ..single_wave()
        };
        let field = WaveField::new(vec![wave; 3]);

        let mut peak: f32 = 0.0;
        for ix in -50..=50 {
            for it in 0..40 {
                let sample = Vec2::new(ix as f32 * 0.1, 0.0);
                let h = field.evaluate(sample, it as f32 * 0.05).offset.y;
                peak = peak.max(h.abs());
            }
        }
        assert!(peak <= 3.0 * 0.1 + 1e-6, "peak height {peak} exceeds sum bound");
    }

    #[test]
    fn test_normal_is_unit_length() {
        let field = WaveField::new(vec![
            single_wave(),
            WaveDescriptor {
                direction_deg: 120.0,
                steepness: 1.8, // intentionally extreme, never clamped
                ..single_wave()
            },
        ]);
        let n = field.evaluate(Vec2::new(2.0, 1.0), 1.9).normal;
        assert!((n.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_uniform_buffer_layout_size() {
        // 2 arrays of MAX_WAVES vec4s plus one trailing 16-byte block;
        // must stay in sync with shaders/waves.wgsl.
        assert_eq!(
            std::mem::size_of::<WaveFieldUniforms>(),
            MAX_WAVES * 16 * 2 + 16
        );
    }
}
