//! Identity pass and the picking readback seam.

use glam::UVec2;
use medscope_core::renderable::submit_identity_pass;
use medscope_core::{PickReadback, Registry};

use super::RenderEngine;

impl RenderEngine {
    /// Draws every visible entity's identity value into the identity target.
    pub fn render_identity(&mut self, registry: &Registry) {
        self.meshes
            .update_camera(&self.queue, &self.camera, self.camera.position());
        submit_identity_pass(registry, self.meshes.meshes_mut());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("identity encoder"),
            });
        {
            let mut pass = self.identity.begin_pass(&mut encoder);
            self.meshes.draw_identity(&self.queue, &mut pass);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Returns the identity byte at `(x, y)` of the last identity pass.
    pub fn identity_at(&self, x: u32, y: u32) -> crate::RenderResult<u8> {
        self.identity.read_pixel(&self.device, &self.queue, x, y)
    }
}

impl PickReadback for RenderEngine {
    fn prepare(&mut self, registry: &Registry) -> medscope_core::Result<()> {
        self.render_identity(registry);
        Ok(())
    }

    fn read_identity_pixel(&mut self, x: u32, y: u32) -> medscope_core::Result<u8> {
        Ok(self.identity_at(x, y)?)
    }

    fn target_size(&self) -> UVec2 {
        self.identity.size()
    }
}
