//! Configuration options for medscope.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables for picking, dragging and animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Drag gain per pixel of horizontal pointer motion.
    ///
    /// Radians for rotation widgets, normalized volume extent for clip planes.
    pub drag_sensitivity: f32,

    /// Widgets hide after this long without pointer movement (milliseconds).
    pub widget_idle_timeout_ms: u64,

    /// Breathing pulse amplitude `k` (fraction of full scale).
    pub breathing_amplitude: f32,

    /// Breathing pulse angular frequency `ω` (radians per second).
    pub breathing_frequency: f32,

    /// Free-running spin speed about Y (radians per second).
    pub spin_speed: f32,

    /// Whether breathing starts enabled.
    pub breathing_enabled: bool,

    /// Whether spin starts enabled.
    pub spin_enabled: bool,

    /// Which groups a click on empty background deselects.
    pub background_deselect: BackgroundDeselect,

    /// Keyboard bindings.
    pub keybindings: KeybindingOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.005,
            widget_idle_timeout_ms: 2000,
            breathing_amplitude: 0.03,
            breathing_frequency: 2.0,
            spin_speed: 0.5,
            breathing_enabled: true,
            spin_enabled: false,
            background_deselect: BackgroundDeselect::SurfacesAndWidgets,
            keybindings: KeybindingOptions::default(),
        }
    }
}

impl Options {
    /// Parses options from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut options: Self = serde_json::from_str(json)?;
        options.keybindings.rebuild_reverse_map();
        Ok(options)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let options = Self::from_json_str(&text)?;
        log::info!("loaded options from {}", path.as_ref().display());
        Ok(options)
    }

    /// Serializes options to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Which selections a click on empty background clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BackgroundDeselect {
    /// Surfaces and widgets are cleared; clip planes keep their selection.
    #[default]
    SurfacesAndWidgets,
    /// Every group is cleared.
    All,
}

/// A keyboard-triggered scene action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAction {
    /// Toggle the breathing pulse on surfaces.
    ToggleBreathing,
    /// Toggle the free-running spin.
    ToggleSpin,
    /// Zero rotation accumulators and clip-plane offsets.
    ResetView,
    /// Clear every selection.
    ClearSelection,
    /// Close the viewer.
    Quit,
}

/// Configurable keyboard bindings mapping actions to key names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeybindingOptions {
    /// Maps action to key name (e.g. `ToggleSpin` to `"Space"`).
    pub bindings: HashMap<KeyAction, String>,
    #[serde(skip)]
    key_to_action: HashMap<String, KeyAction>,
}

impl Default for KeybindingOptions {
    fn default() -> Self {
        let bindings = HashMap::from([
            (KeyAction::ToggleBreathing, "KeyB".into()),
            (KeyAction::ToggleSpin, "Space".into()),
            (KeyAction::ResetView, "KeyR".into()),
            (KeyAction::ClearSelection, "KeyC".into()),
            (KeyAction::Quit, "Escape".into()),
        ]);

        let mut opts = Self {
            bindings,
            key_to_action: HashMap::new(),
        };
        opts.rebuild_reverse_map();
        opts
    }
}

impl KeybindingOptions {
    /// Rebuild the reverse lookup map (key name to action).
    pub fn rebuild_reverse_map(&mut self) {
        self.key_to_action.clear();
        for (action, key) in &self.bindings {
            self.key_to_action.insert(key.clone(), *action);
        }
    }

    /// Look up the action bound to a key name.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<KeyAction> {
        self.key_to_action.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behaviour() {
        let o = Options::default();
        assert_eq!(o.widget_idle_timeout_ms, 2000);
        assert_eq!(o.background_deselect, BackgroundDeselect::SurfacesAndWidgets);
        assert_eq!(o.keybindings.lookup("Space"), Some(KeyAction::ToggleSpin));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let o = Options::from_json_str(r#"{ "drag_sensitivity": 0.01, "background_deselect": "All" }"#)
            .unwrap();
        assert!((o.drag_sensitivity - 0.01).abs() < f32::EPSILON);
        assert_eq!(o.background_deselect, BackgroundDeselect::All);
        assert_eq!(o.widget_idle_timeout_ms, 2000);
        assert_eq!(o.keybindings.lookup("KeyB"), Some(KeyAction::ToggleBreathing));
    }

    #[test]
    fn test_custom_bindings_rebuild_lookup() {
        let o = Options::from_json_str(
            r#"{ "keybindings": { "bindings": { "ToggleSpin": "KeyS" } } }"#,
        )
        .unwrap();
        assert_eq!(o.keybindings.lookup("KeyS"), Some(KeyAction::ToggleSpin));
        assert_eq!(o.keybindings.lookup("Space"), None);
    }

    #[test]
    fn test_json_roundtrip() {
        let o = Options::default();
        let text = o.to_json_string().unwrap();
        assert_eq!(Options::from_json_str(&text).unwrap(), o);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(Options::from_json_str("{ nope").is_err());
    }

    #[test]
    fn test_load_reads_file_and_reports_missing() {
        let path = std::env::temp_dir().join(format!("medscope-options-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "spin_enabled": true }"#).unwrap();
        let o = Options::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(o.spin_enabled);

        assert!(matches!(
            Options::load(&path),
            Err(crate::error::MedscopeError::IoError(_))
        ));
    }
}
