//! Per-frame input snapshot and edge detection.

use glam::{UVec2, Vec2};

use crate::options::KeyAction;

/// Everything the interaction step needs to know about the user this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    /// Pointer position in window pixels, top-left origin.
    ///
    /// Only meaningful while `pointer_inside` is set; the viewer keeps the
    /// last real position after the cursor leaves.
    pub pointer: Vec2,
    /// Whether the pointer is over the window.
    pub pointer_inside: bool,
    /// Window size in pixels.
    pub window_size: UVec2,
    /// Whether the primary pointer button is currently held.
    pub primary_down: bool,
    /// Whether the window has input focus.
    pub focused: bool,
    /// Actions whose key went down since the previous frame.
    pub pressed_actions: Vec<KeyAction>,
}

impl InputSnapshot {
    /// Creates a focused snapshot with the pointer at `pointer`.
    pub fn at(pointer: Vec2, window_size: UVec2) -> Self {
        Self {
            pointer,
            window_size,
            pointer_inside: true,
            focused: true,
            ..Self::default()
        }
    }

    /// Sets the primary button state.
    #[must_use]
    pub fn with_button(mut self, down: bool) -> Self {
        self.primary_down = down;
        self
    }

    /// Marks the pointer as having left (`false`) or entered the window.
    #[must_use]
    pub fn with_pointer_inside(mut self, inside: bool) -> Self {
        self.pointer_inside = inside;
        self
    }

    /// Adds a key action edge.
    #[must_use]
    pub fn with_action(mut self, action: KeyAction) -> Self {
        self.pressed_actions.push(action);
        self
    }
}

/// Turns a held button into a single press event.
///
/// `press` reports `true` only on the frame the button goes from up to down.
/// While the button stays held the latch stays set; releasing clears it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickLatch {
    latched: bool,
}

impl ClickLatch {
    /// Feeds the current button state; returns whether this is a fresh press.
    pub fn press(&mut self, down: bool) -> bool {
        if !down {
            self.latched = false;
            return false;
        }
        if self.latched {
            return false;
        }
        self.latched = true;
        true
    }

    /// Returns whether the current press has already been acted on.
    pub fn is_latched(&self) -> bool {
        self.latched
    }
}

/// Tracks the pointer across frames and yields motion deltas.
///
/// The first sample after creation, after focus loss, or after the pointer
/// left the window only seeds the position, so re-entering never produces a
/// jump.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerTracker {
    last: Option<Vec2>,
}

impl PointerTracker {
    /// Feeds this frame's pointer; returns the delta since the previous frame.
    ///
    /// `tracking` is false while the window is unfocused or the pointer is
    /// outside it; no delta is produced then.
    pub fn update(&mut self, pointer: Vec2, tracking: bool) -> Vec2 {
        if !tracking {
            self.last = None;
            return Vec2::ZERO;
        }
        let delta = self.last.map_or(Vec2::ZERO, |last| pointer - last);
        self.last = Some(pointer);
        delta
    }

    /// Returns the last seen pointer position.
    pub fn last(&self) -> Option<Vec2> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_fires_once_per_press() {
        let mut latch = ClickLatch::default();
        assert!(!latch.press(false));
        assert!(latch.press(true));
        assert!(!latch.press(true));
        assert!(latch.is_latched());
        assert!(!latch.press(false));
        assert!(latch.press(true));
    }

    #[test]
    fn test_pointer_seeds_without_delta() {
        let mut tracker = PointerTracker::default();
        assert_eq!(tracker.update(Vec2::new(100.0, 50.0), true), Vec2::ZERO);
        assert_eq!(tracker.update(Vec2::new(110.0, 40.0), true), Vec2::new(10.0, -10.0));
    }

    #[test]
    fn test_focus_loss_reseeds() {
        let mut tracker = PointerTracker::default();
        tracker.update(Vec2::ZERO, true);
        assert_eq!(tracker.update(Vec2::new(500.0, 0.0), false), Vec2::ZERO);
        assert_eq!(tracker.last(), None);
        assert_eq!(tracker.update(Vec2::new(500.0, 0.0), true), Vec2::ZERO);
        assert_eq!(tracker.update(Vec2::new(505.0, 0.0), true), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_snapshot_defaults_inside() {
        let input = InputSnapshot::at(Vec2::ONE, UVec2::splat(10));
        assert!(input.pointer_inside && input.focused);
        assert!(!input.with_pointer_inside(false).pointer_inside);
    }
}
