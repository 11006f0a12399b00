//! Hover, selection and drag state machine.
//!
//! Runs once per frame after the identity readback. Per entity the states
//! are `Idle`, `Hovering`, `Selected` and `Dragging` (selected while the
//! primary button is held), tracked independently per [`Group`]. Everything
//! that outlives a frame lives in [`InteractionContext`], which is passed in
//! explicitly so the step stays a plain function of its inputs.

use glam::Vec2;

use crate::entity::{Category, Group};
use crate::input::{ClickLatch, InputSnapshot, PointerTracker};
use crate::options::{BackgroundDeselect, KeyAction, Options};
use crate::pick::PickHit;
use crate::registry::Registry;
use crate::transform::{Breathing, ComposeParams, RotationFrame};

/// Scene state carried from one frame to the next.
#[derive(Debug, Clone)]
pub struct InteractionContext {
    /// Shared rotation frame (widgets and spin).
    pub rotation: RotationFrame,
    /// Whether surfaces breathe.
    pub breathing_enabled: bool,
    /// Whether the Y accumulator free-runs.
    pub spin_enabled: bool,
    latch: ClickLatch,
    pointer: PointerTracker,
    last_activity_ms: Option<u64>,
    last_time_ms: Option<u64>,
    dragging_widget: bool,
}

impl InteractionContext {
    /// Creates a context with the animation flags from `options`.
    pub fn new(options: &Options) -> Self {
        Self {
            rotation: RotationFrame::default(),
            breathing_enabled: options.breathing_enabled,
            spin_enabled: options.spin_enabled,
            latch: ClickLatch::default(),
            pointer: PointerTracker::default(),
            last_activity_ms: None,
            last_time_ms: None,
            dragging_widget: false,
        }
    }

    /// Returns whether a widget is being dragged right now.
    pub fn is_dragging_widget(&self) -> bool {
        self.dragging_widget
    }

    /// Returns the composition parameters for time `now_ms`.
    pub fn compose_params(&self, options: &Options, now_ms: u64) -> ComposeParams {
        #[allow(clippy::cast_precision_loss)]
        let time_s = now_ms as f32 / 1000.0;
        ComposeParams {
            time_s,
            breathing: Breathing {
                enabled: self.breathing_enabled,
                amplitude: options.breathing_amplitude,
                frequency: options.breathing_frequency,
            },
            rotation: self.rotation,
        }
    }
}

/// What happened during one interaction step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InteractionReport {
    /// The pick result the step ran with.
    pub hit: PickHit,
    /// Whether this frame carried a fresh press.
    pub clicked: bool,
    /// Whether any `selected` flag changed.
    pub selection_changed: bool,
    /// Pointer motion since the previous frame.
    pub pointer_delta: Vec2,
    /// Whether the user asked to close the viewer.
    pub quit_requested: bool,
}

/// Advances the state machine by one frame.
///
/// `hit` is this frame's picking result and `now_ms` the frame clock.
pub fn update(
    registry: &mut Registry,
    ctx: &mut InteractionContext,
    options: &Options,
    hit: PickHit,
    input: &InputSnapshot,
    now_ms: u64,
) -> InteractionReport {
    let mut report = InteractionReport {
        hit,
        ..InteractionReport::default()
    };
    let before = selection_flags(registry);

    // Hover
    let hovered = hit.entity();
    for entity in registry.iter_mut() {
        entity.hovering = Some(entity.id()) == hovered;
    }

    // Click
    report.clicked = ctx.latch.press(input.primary_down);
    if report.clicked {
        apply_click(registry, options, hit);
    }

    // Drag
    let delta = ctx
        .pointer
        .update(input.pointer, input.focused && input.pointer_inside);
    report.pointer_delta = delta;
    ctx.dragging_widget = false;
    if input.primary_down && delta.x != 0.0 {
        let amount = delta.x * options.drag_sensitivity;
        for entity in registry.iter_mut().filter(|e| e.selected) {
            match entity.category() {
                Category::ClipPlane { .. } => entity.apply_offset_delta(amount),
                Category::RotationWidget { axis } => *ctx.rotation.angle_mut(axis) += amount,
                Category::Surface => {}
            }
        }
    }
    if input.primary_down && registry.selected_in(Group::Widgets).is_some() {
        ctx.dragging_widget = true;
    }

    update_widget_visibility(registry, ctx, options, delta != Vec2::ZERO, now_ms);

    // Spin
    let dt_ms = ctx
        .last_time_ms
        .map_or(0, |last| now_ms.saturating_sub(last));
    ctx.last_time_ms = Some(now_ms);
    if ctx.spin_enabled && !ctx.dragging_widget {
        #[allow(clippy::cast_precision_loss)]
        let dt_s = dt_ms as f32 / 1000.0;
        ctx.rotation.y += options.spin_speed * dt_s;
    }

    for action in &input.pressed_actions {
        apply_action(registry, ctx, *action, &mut report);
    }

    report.selection_changed = before != selection_flags(registry);
    if report.selection_changed {
        log::debug!(
            "selection now: {}",
            registry.selected_name().unwrap_or("<none>")
        );
    }
    report
}

fn selection_flags(registry: &Registry) -> Vec<bool> {
    registry.iter().map(|e| e.selected).collect()
}

fn apply_click(registry: &mut Registry, options: &Options, hit: PickHit) {
    match hit {
        PickHit::Entity(id) => {
            let Some(group) = registry.get(id).map(|e| e.category().group()) else {
                return;
            };
            for entity in registry.group_mut(group) {
                entity.selected = entity.id() == id;
            }
        }
        PickHit::Background => {
            let groups: &[Group] = match options.background_deselect {
                BackgroundDeselect::SurfacesAndWidgets => &[Group::Surfaces, Group::Widgets],
                BackgroundDeselect::All => &[Group::Surfaces, Group::Widgets, Group::Planes],
            };
            for entity in registry.iter_mut() {
                if groups.contains(&entity.category().group()) {
                    entity.selected = false;
                }
            }
        }
        PickHit::Nothing => {}
    }
}

fn update_widget_visibility(
    registry: &mut Registry,
    ctx: &mut InteractionContext,
    options: &Options,
    moved: bool,
    now_ms: u64,
) {
    let widget_selected = registry.selected_in(Group::Widgets).is_some();
    let last_activity = *ctx.last_activity_ms.get_or_insert(now_ms);

    if moved || widget_selected {
        ctx.last_activity_ms = Some(now_ms);
        for widget in registry.group_mut(Group::Widgets) {
            widget.visible = true;
        }
    } else if now_ms.saturating_sub(last_activity) > options.widget_idle_timeout_ms {
        for widget in registry.group_mut(Group::Widgets) {
            if widget.visible {
                log::debug!("hiding idle widget '{}'", widget.name());
            }
            widget.visible = false;
            widget.hovering = false;
        }
    }
}

fn apply_action(
    registry: &mut Registry,
    ctx: &mut InteractionContext,
    action: KeyAction,
    report: &mut InteractionReport,
) {
    match action {
        KeyAction::ToggleBreathing => {
            ctx.breathing_enabled = !ctx.breathing_enabled;
            log::info!("breathing {}", on_off(ctx.breathing_enabled));
        }
        KeyAction::ToggleSpin => {
            ctx.spin_enabled = !ctx.spin_enabled;
            log::info!("spin {}", on_off(ctx.spin_enabled));
        }
        KeyAction::ResetView => {
            ctx.rotation = RotationFrame::default();
            for entity in registry.iter_mut() {
                entity.reset_offset();
            }
        }
        KeyAction::ClearSelection => {
            for entity in registry.iter_mut() {
                entity.selected = false;
            }
        }
        KeyAction::Quit => report.quit_requested = true,
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
