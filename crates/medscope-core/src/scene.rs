//! One interactive frame, end to end.

use crate::entity::{EntityDesc, EntityId};
use crate::error::Result;
use crate::input::InputSnapshot;
use crate::interaction::{self, InteractionContext, InteractionReport};
use crate::options::Options;
use crate::pick::{self, PickHit, PickReadback};
use crate::registry::Registry;
use crate::transform;

/// Owns the entities and the interaction state of a viewer.
#[derive(Debug, Clone)]
pub struct Scene {
    registry: Registry,
    options: Options,
    interaction: InteractionContext,
    last_report: InteractionReport,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Scene {
    /// Creates an empty scene.
    pub fn new(options: Options) -> Self {
        let interaction = InteractionContext::new(&options);
        Self {
            registry: Registry::new(),
            options,
            interaction,
            last_report: InteractionReport::default(),
        }
    }

    /// Registers an entity. See [`Registry::register`].
    pub fn register(&mut self, desc: EntityDesc) -> Result<EntityId> {
        self.registry.register(desc)
    }

    /// Returns the entity registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the entity registry, mutably.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Returns the options the scene runs with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns the interaction state.
    pub fn interaction(&self) -> &InteractionContext {
        &self.interaction
    }

    /// Returns the report of the most recent frame.
    pub fn last_report(&self) -> &InteractionReport {
        &self.last_report
    }

    /// Recomputes every entity's final transform for time `now_ms`.
    pub fn compose(&mut self, now_ms: u64) {
        let params = self.interaction.compose_params(&self.options, now_ms);
        transform::compose_all(&mut self.registry, &params);
    }

    /// Runs one frame: compose, identity pass and readback, then the
    /// interaction step.
    ///
    /// The transforms left in the registry are the ones the identity pass
    /// used, so the regular pass drawn afterwards matches it exactly. A
    /// readback failure aborts the frame before any entity flag changes.
    pub fn frame(
        &mut self,
        input: &InputSnapshot,
        now_ms: u64,
        readback: &mut dyn PickReadback,
    ) -> Result<InteractionReport> {
        self.compose(now_ms);
        readback.prepare(&self.registry)?;
        let hit = if input.pointer_inside {
            pick::resolve(readback, &self.registry, input.pointer, input.window_size)?
        } else {
            PickHit::Nothing
        };

        let report = interaction::update(
            &mut self.registry,
            &mut self.interaction,
            &self.options,
            hit,
            input,
            now_ms,
        );
        self.last_report = report;
        Ok(report)
    }

    /// Human-readable summary of the current selection and animation state.
    pub fn status_line(&self) -> String {
        let selected = self.registry.selected_name().unwrap_or("nothing");
        let hovered = self.registry.hovered().map_or("-", |e| e.name());
        format!(
            "selected: {selected} | hover: {hovered} | breathing {} | spin {}",
            if self.interaction.breathing_enabled { "on" } else { "off" },
            if self.interaction.spin_enabled { "on" } else { "off" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Category;
    use crate::error::MedscopeError;
    use crate::pick::{encode_byte, BACKGROUND_CODE};
    use glam::{UVec2, Vec2};

    struct Canned {
        value: u8,
        prepared: usize,
        fail: bool,
    }

    impl PickReadback for Canned {
        fn prepare(&mut self, _registry: &Registry) -> Result<()> {
            self.prepared += 1;
            Ok(())
        }

        fn read_identity_pixel(&mut self, _x: u32, _y: u32) -> Result<u8> {
            if self.fail {
                return Err(MedscopeError::Readback("device lost".into()));
            }
            Ok(self.value)
        }

        fn target_size(&self) -> UVec2 {
            UVec2::new(64, 64)
        }
    }

    fn input(down: bool) -> InputSnapshot {
        InputSnapshot::at(Vec2::new(10.0, 10.0), UVec2::new(64, 64)).with_button(down)
    }

    #[test]
    fn test_frame_selects_entity_under_cursor() {
        let mut scene = Scene::default();
        let heart = scene.register(EntityDesc::new("heart", Category::Surface)).unwrap();
        let mut readback = Canned {
            value: encode_byte(heart),
            prepared: 0,
            fail: false,
        };

        let report = scene.frame(&input(true), 0, &mut readback).unwrap();
        assert_eq!(scene.last_report(), &report);
        assert_eq!(readback.prepared, 1);
        assert!(report.selection_changed);
        assert!(scene.registry().get(heart).unwrap().selected);
        assert!(scene.status_line().starts_with("selected: heart | hover: heart"));

        readback.value = BACKGROUND_CODE;
        scene.frame(&input(false), 16, &mut readback).unwrap();
        scene.frame(&input(true), 32, &mut readback).unwrap();
        assert!(scene.status_line().starts_with("selected: nothing | hover: -"));
    }

    #[test]
    fn test_readback_failure_leaves_flags_untouched() {
        let mut scene = Scene::default();
        let heart = scene.register(EntityDesc::new("heart", Category::Surface)).unwrap();
        let mut readback = Canned {
            value: encode_byte(heart),
            prepared: 0,
            fail: true,
        };

        let err = scene.frame(&input(true), 0, &mut readback).unwrap_err();
        assert!(matches!(err, MedscopeError::Readback(_)));
        assert!(!scene.registry().get(heart).unwrap().selected);
    }

    #[test]
    fn test_pointer_outside_window_hits_nothing() {
        let mut scene = Scene::default();
        let heart = scene.register(EntityDesc::new("heart", Category::Surface)).unwrap();
        let mut readback = Canned {
            value: encode_byte(heart),
            prepared: 0,
            fail: false,
        };

        scene.frame(&input(false), 0, &mut readback).unwrap();
        assert!(scene.registry().get(heart).unwrap().hovering);

        // The last real position still lies over the heart.
        let outside = input(false).with_pointer_inside(false);
        let report = scene.frame(&outside, 16, &mut readback).unwrap();
        assert_eq!(report.hit, PickHit::Nothing);
        assert!(!scene.registry().get(heart).unwrap().hovering);
        assert_eq!(readback.prepared, 2);
    }

    #[test]
    fn test_compose_uses_frame_clock() {
        let mut scene = Scene::default();
        let heart = scene.register(EntityDesc::new("heart", Category::Surface)).unwrap();
        scene.compose(0);
        let a = scene.registry().get(heart).unwrap().final_transform();
        scene.compose(400);
        let b = scene.registry().get(heart).unwrap().final_transform();
        assert_ne!(a, b);
    }
}
