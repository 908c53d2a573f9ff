//! Fatal pipeline errors. Anything here aborts initialization; per-frame
//! surface errors are handled inline and never reach this type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to create rendering surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to acquire GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    /// The adapter cannot satisfy a capability the pipeline requires
    /// (multiple render targets, float color attachments). Fail fast rather
    /// than silently degrading shading quality.
    #[error("unsupported GPU capability: {what}")]
    Unsupported { what: String },

    #[error("invalid configuration: {what}")]
    InvalidConfig { what: String },

    #[error("failed to load environment map: {0}")]
    EnvironmentMap(#[from] image::ImageError),
}

impl Error {
    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported { what: what.into() }
    }

    pub fn invalid_config(what: impl Into<String>) -> Self {
        Self::InvalidConfig { what: what.into() }
    }
}
