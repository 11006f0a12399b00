//! GPU mesh resources and the two mesh pipelines.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::num::NonZeroU64;

use glam::{Mat4, Vec3};
use medscope_core::pick::MAX_ENTITIES;
use medscope_core::{CameraMatrices, EntityId, MaterialUniforms, Renderable};
use wgpu::util::DeviceExt;

use crate::error::{RenderError, RenderResult};
use crate::identity_target::{DEPTH_FORMAT, IDENTITY_FORMAT};
use crate::mesh::{MeshData, Vertex};

/// Camera uniforms for GPU (80 bytes, matches `Camera` in `mesh.wgsl`).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

impl Default for CameraUniforms {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            eye: [0.0, 0.0, 3.0, 1.0],
        }
    }
}

/// Per-draw uniforms (96 bytes, matches `Draw` in `mesh.wgsl`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x: identity value, y: hovering, z: selected.
    pub params: [f32; 4],
}

impl DrawUniforms {
    fn identity(transform: Mat4, encoded: f32) -> Self {
        Self {
            model: transform.to_cols_array_2d(),
            color: [0.0; 4],
            params: [encoded, 0.0, 0.0, 0.0],
        }
    }

    fn regular(transform: Mat4, material: &MaterialUniforms, opacity: f32) -> Self {
        let color = material.display_color();
        Self {
            model: transform.to_cols_array_2d(),
            color: [color.x, color.y, color.z, opacity],
            params: [0.0, material.hovering, material.selected, 0.0],
        }
    }
}

/// Dynamic-offset stride; the default `min_uniform_buffer_offset_alignment`.
const DRAW_STRIDE: u64 = 256;

/// Uploaded geometry of one entity plus the draws queued for it this frame.
pub struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    opacity: f32,
    identity_draws: Vec<DrawUniforms>,
    regular_draws: Vec<DrawUniforms>,
}

impl GpuMesh {
    /// Uploads `mesh`.
    pub fn new(device: &wgpu::Device, label: &str, mesh: &MeshData) -> RenderResult<Self> {
        if mesh.triangle_count() == 0 {
            return Err(RenderError::EmptyMesh(label.to_string()));
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        #[allow(clippy::cast_possible_truncation)]
        let index_count = mesh.indices.len() as u32;
        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count,
            opacity: 1.0,
            identity_draws: Vec::new(),
            regular_draws: Vec::new(),
        })
    }

    /// Returns the regular-pass opacity.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Sets the regular-pass opacity. Identity draws are always opaque.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Returns how many identity and regular draws are queued.
    pub fn queued(&self) -> (usize, usize) {
        (self.identity_draws.len(), self.regular_draws.len())
    }
}

impl Renderable for GpuMesh {
    fn submit_for_identity_pass(&mut self, transform: Mat4, encoded: f32) {
        self.identity_draws.push(DrawUniforms::identity(transform, encoded));
    }

    fn submit_for_regular_pass(&mut self, transform: Mat4, material: &MaterialUniforms) {
        self.regular_draws
            .push(DrawUniforms::regular(transform, material, self.opacity));
    }
}

/// Uniform slots for the draws of one pass.
struct DrawSlots {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: usize,
}

impl DrawSlots {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let capacity = MAX_ENTITIES;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: DRAW_STRIDE * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            capacity,
        }
    }
}

/// Which queue of a [`GpuMesh`] a pass consumes.
#[derive(Clone, Copy, PartialEq, Eq)]
enum PassKind {
    Identity,
    Regular,
}

/// Owns every entity's [`GpuMesh`] and draws them in either pass.
pub struct MeshRenderer {
    identity_pipeline: wgpu::RenderPipeline,
    regular_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    identity_slots: DrawSlots,
    regular_slots: DrawSlots,
    meshes: HashMap<EntityId, GpuMesh>,
}

impl MeshRenderer {
    /// Builds both pipelines. `color_format` is the regular pass target.
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("camera bind group layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(80),
                    },
                    count: None,
                }],
            });

        let draw_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("draw bind group layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(96),
                    },
                    count: None,
                }],
            });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera uniforms"),
            contents: bytemuck::cast_slice(&[CameraUniforms::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera bind group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh pipeline layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &draw_bind_group_layout],
            push_constant_ranges: &[],
        });

        let identity_pipeline = create_pipeline(
            device,
            &layout,
            &shader,
            "identity pipeline",
            "fs_identity",
            wgpu::ColorTargetState {
                format: IDENTITY_FORMAT,
                blend: None, // identity values must land unblended
                write_mask: wgpu::ColorWrites::ALL,
            },
        );
        let regular_pipeline = create_pipeline(
            device,
            &layout,
            &shader,
            "regular pipeline",
            "fs_regular",
            wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            },
        );

        Self {
            identity_pipeline,
            regular_pipeline,
            camera_buffer,
            camera_bind_group,
            identity_slots: DrawSlots::new(device, &draw_bind_group_layout, "identity draws"),
            regular_slots: DrawSlots::new(device, &draw_bind_group_layout, "regular draws"),
            meshes: HashMap::new(),
        }
    }

    /// Uploads geometry for entity `id`, replacing any previous mesh.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        id: EntityId,
        mesh: &MeshData,
    ) -> RenderResult<&mut GpuMesh> {
        let gpu = GpuMesh::new(device, &format!("entity {id}"), mesh)?;
        log::debug!("uploaded {} triangles for entity {id}", mesh.triangle_count());
        Ok(match self.meshes.entry(id) {
            Entry::Occupied(mut slot) => {
                slot.insert(gpu);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(gpu),
        })
    }

    /// Returns every mesh keyed by entity, for pass submission.
    pub fn meshes_mut(&mut self) -> &mut HashMap<EntityId, GpuMesh> {
        &mut self.meshes
    }

    /// Uploads the camera for the next passes.
    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &dyn CameraMatrices, eye: Vec3) {
        let uniforms = CameraUniforms {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            eye: [eye.x, eye.y, eye.z, 1.0],
        };
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Draws every queued identity draw into `pass` and clears the queue.
    pub fn draw_identity(&mut self, queue: &wgpu::Queue, pass: &mut wgpu::RenderPass<'_>) {
        self.draw(queue, pass, PassKind::Identity);
    }

    /// Draws every queued regular draw into `pass` and clears the queue.
    ///
    /// Opaque meshes go first so translucent clip planes blend over them.
    pub fn draw_regular(&mut self, queue: &wgpu::Queue, pass: &mut wgpu::RenderPass<'_>) {
        self.draw(queue, pass, PassKind::Regular);
    }

    fn draw(&mut self, queue: &wgpu::Queue, pass: &mut wgpu::RenderPass<'_>, kind: PassKind) {
        let (pipeline, slots) = match kind {
            PassKind::Identity => (&self.identity_pipeline, &self.identity_slots),
            PassKind::Regular => (&self.regular_pipeline, &self.regular_slots),
        };

        let mut order: Vec<EntityId> = self.meshes.keys().copied().collect();
        order.sort_by(|a, b| {
            let opaque = |id: &EntityId| self.meshes[id].opacity >= 1.0;
            opaque(b).cmp(&opaque(a)).then(a.cmp(b))
        });

        let mut draws = Vec::new();
        for id in order {
            let Some(mesh) = self.meshes.get_mut(&id) else {
                continue;
            };
            let queued = match kind {
                PassKind::Identity => std::mem::take(&mut mesh.identity_draws),
                PassKind::Regular => std::mem::take(&mut mesh.regular_draws),
            };
            draws.extend(queued.into_iter().map(|u| (id, u)));
        }
        if draws.len() > slots.capacity {
            log::warn!(
                "{} draws queued, only {} fit; dropping the rest",
                draws.len(),
                slots.capacity
            );
            draws.truncate(slots.capacity);
        }

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        for (slot, (id, uniforms)) in draws.iter().enumerate() {
            let offset = DRAW_STRIDE * slot as u64;
            queue.write_buffer(&slots.buffer, offset, bytemuck::bytes_of(uniforms));

            let mesh = &self.meshes[id];
            #[allow(clippy::cast_possible_truncation)]
            pass.set_bind_group(1, &slots.bind_group, &[offset as u32]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    label: &str,
    fragment_entry: &str,
    target: wgpu::ColorTargetState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(target)],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None, // planes are seen from both sides
            ..wgpu::PrimitiveState::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layouts_match_shader() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 80);
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 96);
        assert!(std::mem::size_of::<DrawUniforms>() as u64 <= DRAW_STRIDE);
    }

    #[test]
    fn test_regular_draw_carries_feedback() {
        let material = MaterialUniforms {
            color: [0.2, 0.4, 0.6],
            hovering: 1.0,
            selected: 0.0,
            _padding: [0.0; 3],
        };
        let draw = DrawUniforms::regular(Mat4::IDENTITY, &material, 0.5);
        let shown = material.display_color();
        assert_eq!(draw.color, [shown.x, shown.y, shown.z, 0.5]);
        assert_eq!(draw.params[1], 1.0);
    }

    #[test]
    fn test_identity_draw_carries_code() {
        let draw = DrawUniforms::identity(Mat4::from_translation(Vec3::X), 30.0 / 255.0);
        assert!((draw.params[0] - 30.0 / 255.0).abs() < f32::EPSILON);
        assert_eq!(draw.model[3], [1.0, 0.0, 0.0, 1.0]);
    }
}
