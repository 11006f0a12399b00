//! Offscreen identity buffer and single-texel readback.

use glam::UVec2;
use medscope_core::pick::BACKGROUND_CODE;

use crate::error::{RenderError, RenderResult};

/// Color format of the identity channel.
pub const IDENTITY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

/// Depth format shared by both passes.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Clear value of the identity channel; unorm-encodes to [`BACKGROUND_CODE`].
#[allow(clippy::cast_lossless)]
pub const IDENTITY_CLEAR: wgpu::Color = wgpu::Color {
    r: BACKGROUND_CODE as f64 / 255.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

/// Rows copied out of a texture must be padded to this many bytes.
const READBACK_ROW_BYTES: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

/// The offscreen target the identity pass draws into.
///
/// Row zero is the top row, so window coordinates map onto it without a flip.
pub struct IdentityTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    staging_buffer: wgpu::Buffer,
    size: UVec2,
}

impl IdentityTarget {
    /// Creates an identity target of `width` by `height` texels.
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = UVec2::new(width.max(1), height.max(1));
        let extent = wgpu::Extent3d {
            width: size.x,
            height: size.y,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("identity texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: IDENTITY_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("identity depth texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        // One padded row is enough for a single texel.
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("identity staging buffer"),
            size: u64::from(READBACK_ROW_BYTES),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        log::debug!("identity target created at {}x{}", size.x, size.y);

        Self {
            texture,
            view,
            depth_view,
            staging_buffer,
            size,
        }
    }

    /// Recreates the target if the size changed.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 || self.size == UVec2::new(width, height) {
            return;
        }
        *self = Self::new(device, width, height);
    }

    /// Returns the target size in texels.
    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Returns the color view the identity pass writes.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Returns the depth view of the identity pass.
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Begins a render pass that clears the target to the background code.
    pub fn begin_pass<'a>(&'a self, encoder: &'a mut wgpu::CommandEncoder) -> wgpu::RenderPass<'a> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("identity pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(IDENTITY_CLEAR),
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
        })
    }

    /// Reads back the identity byte at `(x, y)`.
    ///
    /// Blocks until the GPU has finished every submitted pass.
    pub fn read_pixel(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        x: u32,
        y: u32,
    ) -> RenderResult<u8> {
        if x >= self.size.x || y >= self.size.y {
            return Err(RenderError::PixelOutOfBounds {
                x,
                y,
                width: self.size.x,
                height: self.size.y,
            });
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("identity readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(READBACK_ROW_BYTES),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = self.staging_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| RenderError::ReadbackFailed(e.to_string()))?;
        rx.recv()
            .map_err(|e| RenderError::ReadbackFailed(e.to_string()))?
            .map_err(|e| RenderError::ReadbackFailed(e.to_string()))?;

        let value = slice.get_mapped_range()[0];
        self.staging_buffer.unmap();

        log::trace!("identity ({x}, {y}) = {value}");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_value_encodes_background() {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let byte = (IDENTITY_CLEAR.r * 255.0).round() as u8;
        assert_eq!(byte, BACKGROUND_CODE);
    }
}
