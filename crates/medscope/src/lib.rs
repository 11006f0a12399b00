//! medscope: interactive picking and manipulation for anatomical scenes.
//!
//! A scene holds organ surfaces, axis-aligned clip planes and rotation
//! widgets. Every frame the entities are drawn into an offscreen identity
//! buffer, the texel under the cursor is read back, and the result drives
//! hover, selection and dragging.
//!
//! # Quick Start
//!
//! ```no_run
//! use medscope::*;
//!
//! fn main() -> std::result::Result<(), ViewerError> {
//!     init_logging();
//!
//!     let (scene, meshes) = standard_scene(Options::default())?;
//!     Viewer::new(scene, meshes)
//!         .with_bounds(Vec3::splat(-1.0), Vec3::ONE)
//!         .run()
//! }
//! ```
//!
//! # Controls
//!
//! - Left click selects the entity under the cursor; clicking empty space
//!   deselects surfaces and widgets.
//! - Dragging horizontally with a clip plane or widget selected slides the
//!   plane or turns the volume.
//! - Right drag orbits the camera, the wheel zooms.
//! - Keys are configured through [`KeybindingOptions`].

mod anatomy;
mod app;
mod error;

pub use anatomy::{standard_scene, AnatomyBuilder, EntityMesh, Organ};
pub use app::Viewer;
pub use error::ViewerError;

// Re-export core types
pub use medscope_core::{
    Axis, BackgroundDeselect, Category, Entity, EntityDesc, EntityId, Group, InputSnapshot,
    InteractionContext, InteractionReport, KeyAction, KeybindingOptions, Mat4, MedscopeError,
    Options, PickHit, PickReadback, PixelOrigin, Registry, Result, Scene, UVec2, Vec2, Vec3, Vec4,
    BACKGROUND_CODE,
};

// Re-export render types
pub use medscope_render::{Camera, MeshData, RenderEngine, RenderError};

/// Initializes `env_logger`; safe to call more than once.
///
/// Honors `RUST_LOG`, e.g. `RUST_LOG=medscope_core=debug` to trace selection changes.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Builds the standard scene and opens a viewer on it.
pub fn show(options: Options) -> std::result::Result<(), ViewerError> {
    init_logging();
    let (scene, meshes) = standard_scene(options)?;
    Viewer::new(scene, meshes)
        .with_bounds(Vec3::splat(-1.0), Vec3::ONE)
        .run()
}
