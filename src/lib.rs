//! Real-time procedural ocean renderer.
//!
//! A Gerstner wave field drives a multi-pass wgpu pipeline: displacement and
//! normal maps are baked at a fixed resolution each frame, the seabed and
//! water surface are shaded from them, a caustics estimate lights the base
//! scene, and a compositor chain blends and color-transforms the result.

pub mod camera;
pub mod cli;
pub mod clock;
pub mod context;
pub mod error;
pub mod mesh;
pub mod params;
pub mod passes;
pub mod pipeline;
pub mod scene;
pub mod targets;
pub mod waves;
