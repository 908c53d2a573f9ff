//! Command-line interface: preset selection and recording mode.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::camera::{BasicCameraPath, CameraPreset, FixedCamera};
use crate::params::{AppConfig, CausticsModel, RecordingConfig};

#[derive(Parser, Debug)]
#[command(name = "seashade", about = "Procedural ocean surface renderer")]
pub struct Cli {
    /// Record frames for N seconds instead of running interactively
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Camera preset
    #[arg(long, value_enum, default_value_t = CameraArg::Fixed)]
    pub camera: CameraArg,

    /// Caustics approximation model
    #[arg(long, value_enum, default_value_t = CausticsArg::Distance)]
    pub caustics: CausticsArg,

    /// Displacement bake resolution (texels per side)
    #[arg(long)]
    pub bake_size: Option<u32>,

    /// Equirectangular environment map image
    #[arg(long, value_name = "PATH")]
    pub env_map: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraArg {
    Fixed,
    Basic,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CausticsArg {
    Distance,
    Refraction,
}

impl Cli {
    /// Fold the command-line selections into the default configuration
    pub fn app_config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.caustics.model = match self.caustics {
            CausticsArg::Distance => CausticsModel::Distance,
            CausticsArg::Refraction => CausticsModel::Refraction,
        };
        if let Some(size) = self.bake_size {
            config.bake.resolution = size;
        }
        config
    }

    pub fn camera_preset(&self) -> CameraPreset {
        match self.camera {
            CameraArg::Fixed => CameraPreset::Fixed(FixedCamera::default()),
            CameraArg::Basic => CameraPreset::Basic(BasicCameraPath::default()),
        }
    }

    pub fn recording(&self) -> Option<RecordingConfig> {
        self.record.map(RecordingConfig::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_interactive_fixed_camera() {
        let cli = Cli::parse_from(["seashade"]);
        assert!(cli.recording().is_none());
        assert!(matches!(cli.camera_preset(), CameraPreset::Fixed(_)));
        assert_eq!(cli.app_config().caustics.model, CausticsModel::Distance);
    }

    #[test]
    fn test_record_flag_builds_recording_config() {
        let cli = Cli::parse_from(["seashade", "--record", "2.5"]);
        let recording = cli.recording().unwrap();
        assert_eq!(recording.total_frames(), 150);
    }

    #[test]
    fn test_caustics_and_bake_size_overrides() {
        let cli = Cli::parse_from([
            "seashade",
            "--caustics",
            "refraction",
            "--bake-size",
            "1024",
        ]);
        let config = cli.app_config();
        assert_eq!(config.caustics.model, CausticsModel::Refraction);
        assert_eq!(config.bake.resolution, 1024);
    }
}
