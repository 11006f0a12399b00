//! Application window and event loop management.

mod frame;
mod input;

use std::sync::Arc;
use std::time::Instant;

use glam::{UVec2, Vec2, Vec3};
use winit::event_loop::EventLoop;
use winit::window::Window;

use medscope_core::{InputSnapshot, KeyAction, Scene};
use medscope_render::RenderEngine;

use crate::anatomy::EntityMesh;
use crate::error::ViewerError;

/// Interactive window around a [`Scene`].
///
/// Left button picks, selects and drags. Right button orbits the camera and
/// the wheel zooms. Keys are mapped through the scene's keybindings.
pub struct Viewer {
    scene: Scene,
    meshes: Vec<EntityMesh>,
    bounds: Option<(Vec3, Vec3)>,
    title: String,
    window: Option<Arc<Window>>,
    engine: Option<RenderEngine>,
    error: Option<ViewerError>,
    close_requested: bool,
    status: String,
    start: Instant,
    // Input state, updated on every window event
    pointer: Vec2,
    pointer_inside: bool,
    primary_down: bool,
    orbit_down: bool,
    focused: bool,
    pending_actions: Vec<KeyAction>,
}

impl Viewer {
    /// Creates a viewer for `scene`; `meshes` are uploaded once the window exists.
    pub fn new(scene: Scene, meshes: Vec<EntityMesh>) -> Self {
        Self {
            scene,
            meshes,
            bounds: None,
            title: "medscope".to_string(),
            window: None,
            engine: None,
            error: None,
            close_requested: false,
            status: String::new(),
            start: Instant::now(),
            pointer: Vec2::ZERO,
            pointer_inside: false,
            primary_down: false,
            orbit_down: false,
            focused: true,
            pending_actions: Vec::new(),
        }
    }

    /// Sets the window title prefix.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Frames the camera on `[min, max]` at startup and on view reset.
    #[must_use]
    pub fn with_bounds(mut self, min: Vec3, max: Vec3) -> Self {
        self.bounds = Some((min, max));
        self
    }

    /// Returns the scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Opens the window and blocks until it is closed.
    pub fn run(mut self) -> Result<(), ViewerError> {
        let event_loop = EventLoop::new()?;
        event_loop.run_app(&mut self)?;
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Milliseconds since the viewer was created.
    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Builds this frame's input snapshot, consuming queued key actions.
    fn take_input(&mut self, window_size: UVec2) -> InputSnapshot {
        InputSnapshot {
            pointer: self.pointer,
            pointer_inside: self.pointer_inside,
            window_size,
            primary_down: self.primary_down,
            focused: self.focused,
            pressed_actions: std::mem::take(&mut self.pending_actions),
        }
    }

    fn fail(&mut self, err: impl Into<ViewerError>) {
        let err = err.into();
        log::error!("{err}");
        self.error = Some(err);
        self.close_requested = true;
    }
}
