//! Regular pass and presentation.

use medscope_core::renderable::submit_regular_pass;
use medscope_core::Registry;

use super::RenderEngine;
use crate::error::RenderResult;

impl RenderEngine {
    /// Draws the regular pass with this frame's transforms and presents it.
    ///
    /// Headless engines draw into their offscreen target instead.
    pub fn render_frame(&mut self, registry: &Registry) -> RenderResult<()> {
        let output = match &self.surface {
            Some(surface) => Some(surface.get_current_texture()?),
            None => None,
        };
        let surface_view = output
            .as_ref()
            .map(|o| o.texture.create_view(&wgpu::TextureViewDescriptor::default()));
        let Some(view) = surface_view.as_ref().or(self.offscreen_view.as_ref()) else {
            return Ok(());
        };

        self.meshes
            .update_camera(&self.queue, &self.camera, self.camera.position());
        submit_regular_pass(registry, self.meshes.meshes_mut());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("regular encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("regular pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            self.meshes.draw_regular(&self.queue, &mut pass);
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        if let Some(output) = output {
            output.present();
        }
        Ok(())
    }
}
