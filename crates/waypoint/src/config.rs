//! Configuration management for the Waypoint host.
//!
//! This module handles loading and validation of the host configuration from
//! TOML files. The `[controls]` table is handed to the player controls plugin
//! untouched; the `[world]` tables seed the simulated world.

use anyhow::Context;
use plugin_player_controls::ControlsConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;
use waypoint_events::{MapId, PlayerId, WorldPosition};

/// Default tick interval for serde deserialization
fn default_tick_interval() -> u64 {
    100 // 10 ticks per second
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Host loop settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Player controls plugin settings
    #[serde(default)]
    pub controls: ControlsConfig,
    /// Contents of the simulated world
    #[serde(default)]
    pub world: WorldSettings,
}

/// Host loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Simulation tick interval in milliseconds (0 to disable)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

/// A row of the named teleport location table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub name: String,
    pub map_id: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub orientation: f32,
}

impl LocationEntry {
    pub fn position(&self) -> WorldPosition {
        WorldPosition::new(MapId(self.map_id), self.x, self.y, self.z, self.orientation)
    }
}

/// A named rectangle on a map, used to label positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaEntry {
    pub name: String,
    pub map_id: u32,
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl AreaEntry {
    pub fn contains(&self, position: &WorldPosition) -> bool {
        position.map_id == MapId(self.map_id)
            && (self.min_x..=self.max_x).contains(&position.x)
            && (self.min_y..=self.max_y).contains(&position.y)
    }
}

/// A character that is online when the host starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub id: u64,
    pub name: String,
    pub map_id: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub orientation: f32,
}

impl PlayerEntry {
    pub fn player_id(&self) -> PlayerId {
        PlayerId(self.id)
    }

    pub fn position(&self) -> WorldPosition {
        WorldPosition::new(MapId(self.map_id), self.x, self.y, self.z, self.orientation)
    }
}

/// Seed data for the simulated world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSettings {
    #[serde(default)]
    pub locations: Vec<LocationEntry>,
    #[serde(default)]
    pub areas: Vec<AreaEntry>,
    #[serde(default)]
    pub players: Vec<PlayerEntry>,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            locations: vec![
                LocationEntry {
                    name: "Stormwind".to_string(),
                    map_id: 0,
                    x: -8913.2,
                    y: 554.6,
                    z: 93.8,
                    orientation: 0.6,
                },
                LocationEntry {
                    name: "Goldshire".to_string(),
                    map_id: 0,
                    x: -9464.0,
                    y: 62.0,
                    z: 56.0,
                    orientation: 0.0,
                },
                LocationEntry {
                    name: "Orgrimmar".to_string(),
                    map_id: 1,
                    x: 1629.4,
                    y: -4373.4,
                    z: 31.3,
                    orientation: 3.5,
                },
            ],
            areas: vec![
                AreaEntry {
                    name: "Stormwind City".to_string(),
                    map_id: 0,
                    min_x: -9100.0,
                    max_x: -8500.0,
                    min_y: 300.0,
                    max_y: 1000.0,
                },
                AreaEntry {
                    name: "Elwynn Forest".to_string(),
                    map_id: 0,
                    min_x: -10000.0,
                    max_x: -9100.0,
                    min_y: -1500.0,
                    max_y: 1000.0,
                },
                AreaEntry {
                    name: "Orgrimmar".to_string(),
                    map_id: 1,
                    min_x: 1300.0,
                    max_x: 2100.0,
                    min_y: -4800.0,
                    max_y: -4100.0,
                },
            ],
            players: vec![
                PlayerEntry {
                    id: 1,
                    name: "Alice".to_string(),
                    map_id: 0,
                    x: -9460.0,
                    y: 60.0,
                    z: 56.0,
                    orientation: 0.0,
                },
                PlayerEntry {
                    id: 2,
                    name: "Bob".to_string(),
                    map_id: 1,
                    x: 1600.0,
                    y: -4400.0,
                    z: 10.0,
                    orientation: 1.0,
                },
            ],
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the
    /// specified path and returns the default configuration.
    pub async fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: AppConfig =
                toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        self.controls
            .validate()
            .map_err(|e| format!("Invalid controls settings: {e}"))?;

        let mut names = HashSet::new();
        for location in &self.world.locations {
            if location.name.trim().is_empty() {
                return Err("Location names cannot be empty".to_string());
            }
            if !names.insert(location.name.to_ascii_lowercase()) {
                return Err(format!("Duplicate location name: {}", location.name));
            }
        }

        for area in &self.world.areas {
            if area.min_x >= area.max_x || area.min_y >= area.max_y {
                return Err(format!("Area {} has inverted bounds", area.name));
            }
        }

        let mut ids = HashSet::new();
        let mut player_names = HashSet::new();
        for player in &self.world.players {
            if !ids.insert(player.id) {
                return Err(format!("Duplicate player id: {}", player.id));
            }
            if !player_names.insert(player.name.to_ascii_lowercase()) {
                return Err(format!("Duplicate player name: {}", player.name));
            }
        }

        Ok(())
    }
}
