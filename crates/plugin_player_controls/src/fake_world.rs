//! In-memory [`WorldAccess`] used by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use waypoint_events::{MoveType, PlayerId, WorldAccess, WorldError, WorldPosition};

#[derive(Debug, Clone)]
struct FakePlayer {
    name: String,
    position: WorldPosition,
    area: Option<String>,
    speeds: HashMap<MoveType, f32>,
    speed_aura: bool,
    messages: Vec<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    players: HashMap<PlayerId, FakePlayer>,
    locations: HashMap<String, WorldPosition>,
    reject_teleports: Option<String>,
    reject_speed: Option<(MoveType, String)>,
}

#[derive(Debug, Default)]
pub struct FakeWorld {
    state: Mutex<FakeState>,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&self, id: PlayerId, name: &str, position: WorldPosition, area: Option<&str>) {
        self.state.lock().unwrap().players.insert(
            id,
            FakePlayer {
                name: name.to_string(),
                position,
                area: area.map(str::to_string),
                speeds: HashMap::new(),
                speed_aura: false,
                messages: Vec::new(),
            },
        );
    }

    pub fn remove_player(&self, id: PlayerId) {
        self.state.lock().unwrap().players.remove(&id);
    }

    pub fn add_location(&self, name: &str, position: WorldPosition) {
        self.state
            .lock()
            .unwrap()
            .locations
            .insert(name.to_ascii_lowercase(), position);
    }

    pub fn set_area(&self, id: PlayerId, area: Option<&str>) {
        if let Some(player) = self.state.lock().unwrap().players.get_mut(&id) {
            player.area = area.map(str::to_string);
        }
    }

    pub fn set_speed_aura(&self, id: PlayerId, active: bool) {
        if let Some(player) = self.state.lock().unwrap().players.get_mut(&id) {
            player.speed_aura = active;
        }
    }

    pub fn force_speed(&self, id: PlayerId, move_type: MoveType, rate: f32) {
        if let Some(player) = self.state.lock().unwrap().players.get_mut(&id) {
            player.speeds.insert(move_type, rate);
        }
    }

    pub fn reject_teleports(&self, reason: &str) {
        self.state.lock().unwrap().reject_teleports = Some(reason.to_string());
    }

    pub fn reject_speed(&self, move_type: MoveType, reason: &str) {
        self.state.lock().unwrap().reject_speed = Some((move_type, reason.to_string()));
    }

    pub fn allow_speeds(&self) {
        self.state.lock().unwrap().reject_speed = None;
    }

    pub fn position(&self, id: PlayerId) -> WorldPosition {
        self.state.lock().unwrap().players[&id].position
    }

    pub fn speed(&self, id: PlayerId, move_type: MoveType) -> f32 {
        self.state.lock().unwrap().players[&id]
            .speeds
            .get(&move_type)
            .copied()
            .unwrap_or(1.0)
    }

    pub fn last_message(&self, id: PlayerId) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .players
            .get(&id)
            .and_then(|player| player.messages.last().cloned())
    }
}

impl WorldAccess for FakeWorld {
    fn player_position(&self, player: PlayerId) -> Option<WorldPosition> {
        self.state.lock().unwrap().players.get(&player).map(|p| p.position)
    }

    fn area_name(&self, player: PlayerId) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .players
            .get(&player)
            .and_then(|p| p.area.clone())
    }

    fn find_location(&self, name: &str) -> Option<WorldPosition> {
        self.state
            .lock()
            .unwrap()
            .locations
            .get(&name.to_ascii_lowercase())
            .copied()
    }

    fn find_online_player(&self, name: &str) -> Option<PlayerId> {
        self.state
            .lock()
            .unwrap()
            .players
            .iter()
            .find(|(_, p)| p.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| *id)
    }

    fn teleport(&self, player: PlayerId, destination: &WorldPosition) -> Result<(), WorldError> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.reject_teleports.clone() {
            return Err(WorldError::Rejected(reason));
        }
        let target = state
            .players
            .get_mut(&player)
            .ok_or(WorldError::PlayerOffline(player))?;
        target.position = *destination;
        Ok(())
    }

    fn set_speed(&self, player: PlayerId, move_type: MoveType, rate: f32) -> Result<(), WorldError> {
        let mut state = self.state.lock().unwrap();
        if let Some((rejected, reason)) = &state.reject_speed {
            if *rejected == move_type {
                return Err(WorldError::Rejected(reason.clone()));
            }
        }
        let target = state
            .players
            .get_mut(&player)
            .ok_or(WorldError::PlayerOffline(player))?;
        target.speeds.insert(move_type, rate);
        Ok(())
    }

    fn current_speed(&self, player: PlayerId, move_type: MoveType) -> Option<f32> {
        self.state
            .lock()
            .unwrap()
            .players
            .get(&player)
            .map(|p| p.speeds.get(&move_type).copied().unwrap_or(1.0))
    }

    fn has_speed_aura(&self, player: PlayerId) -> bool {
        self.state
            .lock()
            .unwrap()
            .players
            .get(&player)
            .map(|p| p.speed_aura)
            .unwrap_or(false)
    }

    fn send_system_message(&self, player: PlayerId, text: &str) {
        if let Some(target) = self.state.lock().unwrap().players.get_mut(&player) {
            target.messages.push(text.to_string());
        }
    }
}
