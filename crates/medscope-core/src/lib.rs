//! Core abstractions for medscope.
//!
//! This crate holds everything about interactive picking that does not need a GPU:
//! - [`Registry`] of pickable [`Entity`]s (surfaces, clip planes, rotation widgets)
//! - identity encoding and the [`PickReadback`] seam in [`pick`]
//! - the hover/select/drag state machine in [`interaction`]
//! - per-frame transform composition in [`transform`]
//! - [`Scene`], which runs one frame in order
//!
//! The drawing side plugs in through [`Renderable`], [`CameraMatrices`] and
//! [`PickReadback`].

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Options structs legitimately have many boolean flags
#![allow(clippy::struct_excessive_bools)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod camera;
pub mod entity;
pub mod error;
pub mod input;
pub mod interaction;
pub mod options;
pub mod pick;
pub mod registry;
pub mod renderable;
pub mod scene;
pub mod transform;

pub use camera::CameraMatrices;
pub use entity::{Axis, Category, Entity, EntityDesc, EntityId, Group};
pub use error::{MedscopeError, Result};
pub use input::{ClickLatch, InputSnapshot, PointerTracker};
pub use interaction::{InteractionContext, InteractionReport};
pub use options::{BackgroundDeselect, KeyAction, KeybindingOptions, Options};
pub use pick::{PickHit, PickReadback, PixelOrigin, BACKGROUND_CODE};
pub use registry::Registry;
pub use renderable::{MaterialUniforms, Renderable};
pub use scene::Scene;
pub use transform::{Breathing, ComposeParams, RotationFrame};

// Re-export glam types for convenience
pub use glam::{Mat4, UVec2, Vec2, Vec3, Vec4};
