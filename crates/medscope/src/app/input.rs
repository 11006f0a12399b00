use std::sync::Arc;

use glam::Vec2;
use pollster::FutureExt;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use medscope_render::RenderEngine;

use super::Viewer;

/// Camera orbit radians per pixel of right-drag.
const ORBIT_SPEED: f32 = 0.01;

/// Returns the key name used in keybinding options (`"KeyB"`, `"Space"`, ...).
pub(crate) fn key_name(code: KeyCode) -> String {
    format!("{code:?}")
}

impl Viewer {
    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<(), crate::ViewerError> {
        let window_attributes = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let mut engine = RenderEngine::new_windowed(window.clone()).block_on()?;
        for entity_mesh in &self.meshes {
            let gpu = engine.upload_mesh(entity_mesh.id, &entity_mesh.mesh)?;
            gpu.set_opacity(entity_mesh.opacity);
        }
        if let Some((min, max)) = self.bounds {
            engine.camera.look_at_box(min, max);
        }
        log::info!(
            "viewer started with {} entities",
            self.scene.registry().len()
        );

        window.request_redraw();
        self.window = Some(window);
        self.engine = Some(engine);
        Ok(())
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init_gpu(event_loop) {
            self.fail(err);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                if let Some(engine) = &mut self.engine {
                    engine.resize(size.width, size.height);
                }
            }
            WindowEvent::Focused(focused) => {
                self.focused = focused;
                if !focused {
                    // Releases that happen elsewhere never reach us.
                    self.primary_down = false;
                    self.orbit_down = false;
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                #[allow(clippy::cast_possible_truncation)]
                let pointer = Vec2::new(position.x as f32, position.y as f32);
                if self.orbit_down && self.pointer_inside {
                    let delta = pointer - self.pointer;
                    if let Some(engine) = &mut self.engine {
                        engine
                            .camera
                            .orbit(delta.x * ORBIT_SPEED, delta.y * ORBIT_SPEED);
                    }
                }
                self.pointer = pointer;
                self.pointer_inside = true;
            }
            WindowEvent::CursorLeft { .. } => {
                // Inside again only on the next real position, so no stale delta.
                self.pointer_inside = false;
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let down = state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.primary_down = down,
                    MouseButton::Right => self.orbit_down = down,
                    _ => {}
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(engine) = &mut self.engine {
                    let scroll = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        #[allow(clippy::cast_possible_truncation)]
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                    };
                    let scale = engine.camera.distance * 0.1;
                    engine.camera.zoom(scroll * scale);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    let name = key_name(code);
                    match self.scene.options().keybindings.lookup(&name) {
                        Some(action) => {
                            log::debug!("{name} -> {action:?}");
                            self.pending_actions.push(action);
                        }
                        None => log::trace!("unbound key {name}"),
                    }
                }
            }
            _ => {}
        }

        if self.close_requested {
            event_loop.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medscope_core::{KeyAction, Options};

    #[test]
    fn test_default_bindings_resolve_from_key_codes() {
        let options = Options::default();
        let lookup = |code| options.keybindings.lookup(&key_name(code));
        assert_eq!(lookup(KeyCode::KeyB), Some(KeyAction::ToggleBreathing));
        assert_eq!(lookup(KeyCode::Space), Some(KeyAction::ToggleSpin));
        assert_eq!(lookup(KeyCode::KeyR), Some(KeyAction::ResetView));
        assert_eq!(lookup(KeyCode::KeyC), Some(KeyAction::ClearSelection));
        assert_eq!(lookup(KeyCode::Escape), Some(KeyAction::Quit));
        assert_eq!(lookup(KeyCode::KeyZ), None);
    }
}
