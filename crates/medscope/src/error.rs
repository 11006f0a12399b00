//! Viewer error types.

use medscope_core::MedscopeError;
use medscope_render::RenderError;
use thiserror::Error;

/// Errors that stop the viewer.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Scene setup or frame failure.
    #[error(transparent)]
    Scene(#[from] MedscopeError),

    /// GPU setup failure.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The window system refused to start.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The window could not be created.
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
}
