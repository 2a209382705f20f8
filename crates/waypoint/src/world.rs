//! In-memory world used by the reference host.
//!
//! Holds the online characters, the named location table and the area boxes
//! from the configuration, and implements [`WorldAccess`] over them. System
//! messages are pushed onto a channel so the console can print them.

use crate::config::{AreaEntry, WorldSettings};
use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use waypoint_events::{MoveType, PlayerId, WorldAccess, WorldError, WorldPosition};

/// Coordinates beyond this magnitude are off every map.
const WORLD_LIMIT: f32 = 20_000.0;

/// A system message on its way to a player.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemMessage {
    pub player_id: PlayerId,
    pub player_name: String,
    pub text: String,
}

#[derive(Debug, Clone)]
struct SimPlayer {
    name: String,
    position: WorldPosition,
    speeds: HashMap<MoveType, f32>,
    speed_aura: bool,
}

/// World state for the reference host.
#[derive(Debug)]
pub struct SimulatedWorld {
    players: DashMap<PlayerId, SimPlayer>,
    locations: HashMap<String, WorldPosition>,
    areas: Vec<AreaEntry>,
    spawn: WorldPosition,
    outbox: mpsc::UnboundedSender<SystemMessage>,
}

impl SimulatedWorld {
    /// Builds the world from configuration. The receiver yields every system
    /// message sent to players.
    pub fn from_settings(settings: &WorldSettings) -> (Self, mpsc::UnboundedReceiver<SystemMessage>) {
        let (outbox, inbox) = mpsc::unbounded_channel();

        let locations = settings
            .locations
            .iter()
            .map(|entry| (entry.name.to_ascii_lowercase(), entry.position()))
            .collect();

        let spawn = settings
            .locations
            .first()
            .map(|entry| entry.position())
            .unwrap_or_default();

        let world = Self {
            players: DashMap::new(),
            locations,
            areas: settings.areas.clone(),
            spawn,
            outbox,
        };
        for player in &settings.players {
            world.login(player.player_id(), &player.name, player.position());
        }

        (world, inbox)
    }

    /// Where characters logging in from the console appear: the first
    /// configured location, or the origin of map 0.
    pub fn spawn_point(&self) -> WorldPosition {
        self.spawn
    }

    /// Puts a character into the world at `position`.
    pub fn login(&self, id: PlayerId, name: &str, position: WorldPosition) {
        self.players.insert(
            id,
            SimPlayer {
                name: name.to_string(),
                position,
                speeds: HashMap::new(),
                speed_aura: false,
            },
        );
        debug!("👤 {} ({}) entered the world", name, id);
    }

    /// Removes a character from the world. Returns its name if it was online.
    pub fn logout(&self, id: PlayerId) -> Option<String> {
        self.players.remove(&id).map(|(_, player)| player.name)
    }

    /// Online characters as `(id, name)`, ordered by id.
    pub fn online_players(&self) -> Vec<(PlayerId, String)> {
        let mut players: Vec<(PlayerId, String)> = self
            .players
            .iter()
            .map(|entry| (*entry.key(), entry.value().name.clone()))
            .collect();
        players.sort_by_key(|(id, _)| *id);
        players
    }

    /// Resets every speed rate to normal, as zoning does on a real server.
    pub fn reset_speeds(&self, id: PlayerId) -> bool {
        match self.players.get_mut(&id) {
            Some(mut player) => {
                player.speeds.clear();
                true
            }
            None => false,
        }
    }

    /// Toggles the speed-changing aura flag.
    pub fn set_speed_aura(&self, id: PlayerId, active: bool) -> bool {
        match self.players.get_mut(&id) {
            Some(mut player) => {
                player.speed_aura = active;
                true
            }
            None => false,
        }
    }

    fn resolve_area(&self, position: &WorldPosition) -> Option<String> {
        self.areas
            .iter()
            .find(|area| area.contains(position))
            .map(|area| area.name.clone())
    }
}

impl WorldAccess for SimulatedWorld {
    fn player_position(&self, player: PlayerId) -> Option<WorldPosition> {
        self.players.get(&player).map(|p| p.position)
    }

    fn area_name(&self, player: PlayerId) -> Option<String> {
        let position = self.player_position(player)?;
        self.resolve_area(&position)
    }

    fn find_location(&self, name: &str) -> Option<WorldPosition> {
        self.locations.get(&name.trim().to_ascii_lowercase()).copied()
    }

    fn find_online_player(&self, name: &str) -> Option<PlayerId> {
        let name = name.trim();
        self.players
            .iter()
            .find(|entry| entry.value().name.eq_ignore_ascii_case(name))
            .map(|entry| *entry.key())
    }

    fn teleport(&self, player: PlayerId, destination: &WorldPosition) -> Result<(), WorldError> {
        let coordinates = [destination.x, destination.y, destination.z];
        if coordinates.iter().any(|c| !c.is_finite() || c.abs() > WORLD_LIMIT) {
            return Err(WorldError::InvalidDestination(format!(
                "({}, {}, {}) is outside the world",
                destination.x, destination.y, destination.z
            )));
        }

        let mut target = self
            .players
            .get_mut(&player)
            .ok_or(WorldError::PlayerOffline(player))?;
        target.position = *destination;
        Ok(())
    }

    fn set_speed(&self, player: PlayerId, move_type: MoveType, rate: f32) -> Result<(), WorldError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(WorldError::Rejected(format!("speed rate {rate} is not positive")));
        }
        let mut target = self
            .players
            .get_mut(&player)
            .ok_or(WorldError::PlayerOffline(player))?;
        target.speeds.insert(move_type, rate);
        Ok(())
    }

    fn current_speed(&self, player: PlayerId, move_type: MoveType) -> Option<f32> {
        self.players
            .get(&player)
            .map(|p| p.speeds.get(&move_type).copied().unwrap_or(1.0))
    }

    fn has_speed_aura(&self, player: PlayerId) -> bool {
        self.players.get(&player).map(|p| p.speed_aura).unwrap_or(false)
    }

    fn send_system_message(&self, player: PlayerId, text: &str) {
        let Some(player_name) = self.players.get(&player).map(|p| p.name.clone()) else {
            debug!("Dropping message for offline player {}", player);
            return;
        };
        let message = SystemMessage {
            player_id: player,
            player_name,
            text: text.to_string(),
        };
        if self.outbox.send(message).is_err() {
            warn!("⚠️ Message outbox closed, dropping message for player {}", player);
        }
    }
}
