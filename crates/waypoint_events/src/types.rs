//! # Core Type Definitions
//!
//! Identity and spatial types shared by the host and its plugins.
//!
//! ## Key Types
//!
//! - [`PlayerId`] - Stable 64-bit key for a connected player
//! - [`MapId`] - Identifier of a world map
//! - [`WorldPosition`] - A point on a map plus a facing angle
//! - [`MoveType`] - Movement kinds whose speed the host can scale

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Unique identifier for a player in the game world.
///
/// The host hands out one raw 64-bit value per character and never reuses
/// it while the process is alive, so it is safe to key per-player state on it.
///
/// # Examples
///
/// ```rust
/// use waypoint_events::PlayerId;
///
/// let player_id: PlayerId = "42".parse().unwrap();
/// assert_eq!(player_id, PlayerId(42));
/// println!("Player ID: {}", player_id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl FromStr for PlayerId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a world map (continent, instance, battleground...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MapId(pub u32);

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A location in the world: map, coordinates and facing.
///
/// Coordinates use single precision because that is what the simulation
/// stores for units; converting back and forth would only add drift.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPosition {
    /// Map the coordinates belong to
    pub map_id: MapId,
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
    /// Z coordinate (height)
    pub z: f32,
    /// Facing angle in radians
    pub orientation: f32,
}

impl WorldPosition {
    /// Creates a new position with the specified map, coordinates and facing.
    pub fn new(map_id: MapId, x: f32, y: f32, z: f32, orientation: f32) -> Self {
        Self {
            map_id,
            x,
            y,
            z,
            orientation,
        }
    }
}

/// Movement kinds that carry an independent speed rate on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveType {
    Run,
    Swim,
}

impl fmt::Display for MoveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveType::Run => write!(f, "run"),
            MoveType::Swim => write!(f, "swim"),
        }
    }
}
