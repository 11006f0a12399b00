//! Rendering backend for medscope.
//!
//! This crate provides the wgpu side of picking:
//! - [`IdentityTarget`], the offscreen identity buffer and its blocking readback
//! - [`MeshRenderer`], which draws entity meshes in the identity and regular passes
//! - [`Camera`], an orbit camera implementing the core camera contract
//! - [`RenderEngine`], device and surface setup that also serves as the
//!   [`PickReadback`](medscope_core::PickReadback) of a scene

pub mod camera;
pub mod engine;
pub mod error;
pub mod identity_target;
pub mod mesh;
pub mod mesh_renderer;

pub use camera::Camera;
pub use engine::RenderEngine;
pub use error::{RenderError, RenderResult};
pub use identity_target::{IdentityTarget, IDENTITY_FORMAT};
pub use mesh::{MeshData, Vertex};
pub use mesh_renderer::{CameraUniforms, DrawUniforms, GpuMesh, MeshRenderer};
