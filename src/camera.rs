//! Camera providers. Interactive controls are an external concern; the
//! pipeline only needs a view-projection matrix and eye position per frame.

use glam::{Mat4, Vec3};

use crate::params::RenderConfig;

/// Stationary camera looking at a fixed target
#[derive(Debug, Clone)]
pub struct FixedCamera {
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for FixedCamera {
    fn default() -> Self {
        Self {
            position: [-34.0, 26.0, 92.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

/// Straight-line flight at constant altitude
#[derive(Debug, Clone)]
pub struct BasicCameraPath {
    /// Constant altitude (meters)
    pub altitude_m: f32,

    /// Forward movement speed (meters per second)
    pub forward_speed_m_per_s: f32,

    /// Look-ahead distance (meters)
    pub look_ahead_m: f32,
}

impl Default for BasicCameraPath {
    fn default() -> Self {
        Self {
            altitude_m: 22.0,
            forward_speed_m_per_s: 4.0,
            look_ahead_m: 90.0,
        }
    }
}

/// Camera preset selection
#[derive(Debug, Clone)]
pub enum CameraPreset {
    Fixed(FixedCamera),
    Basic(BasicCameraPath),
}

impl Default for CameraPreset {
    fn default() -> Self {
        Self::Fixed(FixedCamera::default())
    }
}

/// Camera provider computing per-frame view state
pub struct CameraRig {
    preset: CameraPreset,
}

impl CameraRig {
    pub fn new(preset: CameraPreset) -> Self {
        Self { preset }
    }

    /// Compute camera position and look-at target for given time
    pub fn compute_position_and_target(&self, time_s: f32) -> (Vec3, Vec3) {
        match &self.preset {
            CameraPreset::Fixed(p) => (Vec3::from_array(p.position), Vec3::from_array(p.target)),
            CameraPreset::Basic(p) => {
                let eye = Vec3::new(0.0, p.altitude_m, time_s * p.forward_speed_m_per_s);
                // Look ahead and slightly down at the surface
                let target = Vec3::new(0.0, p.altitude_m * 0.4, eye.z + p.look_ahead_m);
                (eye, target)
            }
        }
    }

    /// Create view-projection matrix for rendering
    ///
    /// # Returns
    /// Tuple of (view_proj_matrix, camera_position)
    pub fn view_proj(&self, time_s: f32, config: &RenderConfig) -> (Mat4, Vec3) {
        let (eye, target) = self.compute_position_and_target(time_s);
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let proj = Mat4::perspective_rh(
            config.fov_degrees.to_radians(),
            config.aspect_ratio(),
            config.near_plane_m,
            config.far_plane_m,
        );
        (proj * view, eye)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_camera_is_stationary() {
        let rig = CameraRig::new(CameraPreset::Fixed(FixedCamera::default()));
        let (eye0, target0) = rig.compute_position_and_target(0.0);
        let (eye1, target1) = rig.compute_position_and_target(10.0);
        assert_eq!(eye0, eye1);
        assert_eq!(target0, target1);
    }

    #[test]
    fn test_basic_camera_moves_forward() {
        let p = BasicCameraPath::default();
        let rig = CameraRig::new(CameraPreset::Basic(p.clone()));
        let (eye0, _) = rig.compute_position_and_target(0.0);
        let (eye1, target1) = rig.compute_position_and_target(1.0);
        assert_eq!(eye1.z - eye0.z, p.forward_speed_m_per_s);
        assert_eq!(eye1.y, p.altitude_m);
        assert!(target1.z > eye1.z);
    }

    #[test]
    fn test_view_proj_matrix_is_finite() {
        let rig = CameraRig::new(CameraPreset::default());
        let (view_proj, eye) = rig.view_proj(0.0, &RenderConfig::default());
        assert_ne!(view_proj, Mat4::IDENTITY);
        assert!(eye.x.is_finite() && eye.y.is_finite() && eye.z.is_finite());
    }
}
