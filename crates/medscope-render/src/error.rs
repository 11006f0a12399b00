//! Rendering error types.

use medscope_core::MedscopeError;
use thiserror::Error;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create surface.
    #[error("failed to create surface: {0}")]
    SurfaceCreationFailed(#[from] wgpu::CreateSurfaceError),

    /// The adapter reports no usable format or alpha mode for the surface.
    #[error("surface is not supported by the adapter")]
    SurfaceUnsupported,

    /// A mesh has no triangles.
    #[error("mesh for entity {0} has no triangles")]
    EmptyMesh(String),

    /// Pixel lies outside the identity target.
    #[error("pixel ({x}, {y}) is outside the {width}x{height} identity target")]
    PixelOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// Mapping the readback buffer failed.
    #[error("identity readback failed: {0}")]
    ReadbackFailed(String),

    /// Surface lost.
    #[error("surface lost")]
    SurfaceLost,

    /// Surface outdated.
    #[error("surface outdated")]
    SurfaceOutdated,

    /// Out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// Timeout waiting for GPU.
    #[error("timeout waiting for GPU")]
    Timeout,

    /// Any other surface failure.
    #[error("surface error")]
    SurfaceOther,
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost => RenderError::SurfaceLost,
            wgpu::SurfaceError::Outdated => RenderError::SurfaceOutdated,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            wgpu::SurfaceError::Timeout => RenderError::Timeout,
            wgpu::SurfaceError::Other => RenderError::SurfaceOther,
        }
    }
}

impl From<RenderError> for MedscopeError {
    fn from(err: RenderError) -> Self {
        MedscopeError::Readback(err.to_string())
    }
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
