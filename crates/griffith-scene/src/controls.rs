//! Scene controls and the key names that trigger them.
//!
//! Keys are identified by name (`"KeyT"`, `"Shift+KeyT"`, `"Equal"`), the
//! same spelling the config file uses. Overrides in
//! [`InputConfig::keybindings`] map a control name to a key name and replace
//! the default binding of that control.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use griffith_config::InputConfig;
use tracing::warn;

/// A user-triggerable change to the running scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneControl {
    SpeedUpDay,
    SlowDownDay,
    ToggleCamera,
    ResetCamera,
    RespawnBuildings,
    MoreBuildings,
    FewerBuildings,
    ToggleRain,
    ToggleSnow,
    ToggleFog,
    SpeedUpWeather,
    SlowDownWeather,
}

impl SceneControl {
    pub const ALL: [SceneControl; 12] = [
        SceneControl::SpeedUpDay,
        SceneControl::SlowDownDay,
        SceneControl::ToggleCamera,
        SceneControl::ResetCamera,
        SceneControl::RespawnBuildings,
        SceneControl::MoreBuildings,
        SceneControl::FewerBuildings,
        SceneControl::ToggleRain,
        SceneControl::ToggleSnow,
        SceneControl::ToggleFog,
        SceneControl::SpeedUpWeather,
        SceneControl::SlowDownWeather,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SceneControl::SpeedUpDay => "SpeedUpDay",
            SceneControl::SlowDownDay => "SlowDownDay",
            SceneControl::ToggleCamera => "ToggleCamera",
            SceneControl::ResetCamera => "ResetCamera",
            SceneControl::RespawnBuildings => "RespawnBuildings",
            SceneControl::MoreBuildings => "MoreBuildings",
            SceneControl::FewerBuildings => "FewerBuildings",
            SceneControl::ToggleRain => "ToggleRain",
            SceneControl::ToggleSnow => "ToggleSnow",
            SceneControl::ToggleFog => "ToggleFog",
            SceneControl::SpeedUpWeather => "SpeedUpWeather",
            SceneControl::SlowDownWeather => "SlowDownWeather",
        }
    }

    /// Key bound to this control when the config does not override it.
    pub fn default_key(self) -> &'static str {
        match self {
            SceneControl::SpeedUpDay => "Equal",
            SceneControl::SlowDownDay => "Minus",
            SceneControl::ToggleCamera => "KeyC",
            SceneControl::ResetCamera => "KeyV",
            SceneControl::RespawnBuildings => "KeyB",
            SceneControl::MoreBuildings => "Period",
            SceneControl::FewerBuildings => "Comma",
            SceneControl::ToggleRain => "KeyT",
            SceneControl::ToggleSnow => "KeyY",
            SceneControl::ToggleFog => "KeyU",
            SceneControl::SpeedUpWeather => "Shift+KeyT",
            SceneControl::SlowDownWeather => "KeyG",
        }
    }
}

impl fmt::Display for SceneControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scene control: {0}")]
pub struct UnknownControl(pub String);

impl FromStr for SceneControl {
    type Err = UnknownControl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SceneControl::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownControl(s.to_string()))
    }
}

/// Key name to control lookup.
#[derive(Debug, Clone)]
pub struct ControlBindings {
    by_key: HashMap<String, SceneControl>,
}

impl Default for ControlBindings {
    fn default() -> Self {
        Self {
            by_key: SceneControl::ALL
                .into_iter()
                .map(|c| (c.default_key().to_string(), c))
                .collect(),
        }
    }
}

impl ControlBindings {
    /// Defaults with the config's overrides applied. Unknown control names
    /// are skipped with a warning.
    pub fn from_config(input: &InputConfig) -> Self {
        let mut bindings = Self::default();
        // Sorted so conflicting overrides resolve the same way every run.
        let mut overrides: Vec<_> = input.keybindings.iter().collect();
        overrides.sort();
        for (control, key) in overrides {
            match control.parse::<SceneControl>() {
                Ok(control) => bindings.bind(key, control),
                Err(e) => warn!("Ignoring keybinding {control} = {key}: {e}"),
            }
        }
        bindings
    }

    /// Bind `key` to `control`, dropping the control's previous key. A key
    /// already bound to another control is taken over.
    pub fn bind(&mut self, key: &str, control: SceneControl) {
        self.by_key.retain(|_, c| *c != control);
        if let Some(previous) = self.by_key.insert(key.to_string(), control)
            && previous != control
        {
            warn!("Key {key} rebound from {previous} to {control}; {previous} is now unbound");
        }
    }

    pub fn control_for(&self, key: &str) -> Option<SceneControl> {
        self.by_key.get(key).copied()
    }

    pub fn key_for(&self, control: SceneControl) -> Option<&str> {
        self.by_key
            .iter()
            .find(|(_, c)| **c == control)
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
