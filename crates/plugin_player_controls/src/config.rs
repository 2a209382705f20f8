//! Plugin configuration, read from the host's `[controls]` table.

use serde::{Deserialize, Serialize};
use waypoint_events::MoveType;

/// Default number of positions kept per player
fn default_history_capacity() -> usize {
    8
}

fn default_max_level() -> u32 {
    4
}

fn default_move_types() -> Vec<MoveType> {
    vec![MoveType::Run, MoveType::Swim]
}

fn default_persist() -> bool {
    true
}

/// Settings for the player controls plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlsConfig {
    /// Positions kept per player before the oldest is evicted
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Speed command settings
    #[serde(default)]
    pub speed: SpeedSettings,
}

/// Settings for the `s<level>` commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedSettings {
    /// Highest accepted level; `s<level>` sets a rate of `level`
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    /// Movement kinds scaled by the command
    #[serde(default = "default_move_types")]
    pub move_types: Vec<MoveType>,
    /// Re-apply the chosen rate on ticks when something reset it
    #[serde(default = "default_persist")]
    pub persist: bool,
}

impl Default for SpeedSettings {
    fn default() -> Self {
        Self {
            max_level: default_max_level(),
            move_types: default_move_types(),
            persist: default_persist(),
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            speed: SpeedSettings::default(),
        }
    }
}

impl ControlsConfig {
    /// Checks the settings for values the plugin cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.history_capacity == 0 {
            return Err("history_capacity must be at least 1".to_string());
        }
        if self.speed.max_level == 0 {
            return Err("speed.max_level must be at least 1".to_string());
        }
        if self.speed.move_types.is_empty() {
            return Err("speed.move_types cannot be empty".to_string());
        }
        Ok(())
    }
}
