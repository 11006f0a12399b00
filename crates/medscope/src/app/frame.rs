use glam::UVec2;

use medscope_core::KeyAction;
use medscope_render::{RenderEngine, RenderError};

use super::Viewer;

impl Viewer {
    /// Runs one scene frame against the GPU and presents it.
    pub(super) fn render(&mut self) {
        let now_ms = self.now_ms();
        let Some((width, height)) = self.engine.as_ref().map(RenderEngine::dimensions) else {
            return;
        };
        let reset_view = self.pending_actions.contains(&KeyAction::ResetView);
        let input = self.take_input(UVec2::new(width, height));

        let Some(engine) = &mut self.engine else {
            return;
        };

        match self.scene.frame(&input, now_ms, engine) {
            Ok(report) => {
                if report.quit_requested {
                    self.close_requested = true;
                }
            }
            Err(err) => {
                self.fail(err);
                return;
            }
        }

        if reset_view {
            if let Some((min, max)) = self.bounds {
                engine.camera.look_at_box(min, max);
            }
        }

        match engine.render_frame(self.scene.registry()) {
            Ok(()) => {}
            Err(RenderError::SurfaceLost | RenderError::SurfaceOutdated) => {
                let (w, h) = engine.dimensions();
                engine.resize(w, h);
            }
            Err(RenderError::OutOfMemory) => {
                log::error!("Out of memory");
                self.close_requested = true;
            }
            Err(err) => log::warn!("{err}"),
        }

        let status = self.scene.status_line();
        if status != self.status {
            log::debug!("{status}");
            if let Some(window) = &self.window {
                window.set_title(&format!("{} | {status}", self.title));
            }
            self.status = status;
        }
    }
}
