//! Remembers the speed each player picked and puts it back after the host
//! resets it (zoning, dismounting, a buff running out).

use dashmap::DashMap;
use tracing::{debug, warn};
use waypoint_events::{MoveType, PlayerId, WorldAccess, WorldError};

/// Normal movement rate.
pub const NORMAL_SPEED: f32 = 1.0;

const RATE_EPSILON: f32 = 0.001;

/// Per-player chosen speed rates.
#[derive(Debug)]
pub struct SpeedKeeper {
    chosen: DashMap<PlayerId, f32>,
    move_types: Vec<MoveType>,
}

impl SpeedKeeper {
    pub fn new(move_types: Vec<MoveType>) -> Self {
        Self {
            chosen: DashMap::new(),
            move_types,
        }
    }

    /// Applies `rate` to every configured movement kind and remembers it.
    /// Normal speed is applied but not remembered.
    ///
    /// All or nothing: if the host rejects one movement kind, the kinds
    /// already changed are put back and the remembered rate is untouched.
    pub fn apply(&self, world: &dyn WorldAccess, player: PlayerId, rate: f32) -> Result<(), WorldError> {
        let mut changed: Vec<(MoveType, f32)> = Vec::with_capacity(self.move_types.len());
        for move_type in &self.move_types {
            let previous = world.current_speed(player, *move_type).unwrap_or(NORMAL_SPEED);
            if let Err(e) = world.set_speed(player, *move_type, rate) {
                Self::roll_back(world, player, changed);
                return Err(e);
            }
            changed.push((*move_type, previous));
        }

        if (rate - NORMAL_SPEED).abs() < RATE_EPSILON {
            self.chosen.remove(&player);
        } else {
            self.chosen.insert(player, rate);
        }
        Ok(())
    }

    /// Drops whatever was remembered for `player`.
    pub fn forget(&self, player: PlayerId) {
        self.chosen.remove(&player);
    }

    /// The rate remembered for `player`, if any.
    pub fn chosen_rate(&self, player: PlayerId) -> Option<f32> {
        self.chosen.get(&player).map(|rate| *rate)
    }

    /// Re-applies remembered rates that drifted. Players who are offline or
    /// under a speed-changing aura are left alone this round.
    ///
    /// Returns the number of players whose speed was restored.
    pub fn reconcile(&self, world: &dyn WorldAccess) -> usize {
        // Snapshot first so no shard lock is held across host calls.
        let snapshot: Vec<(PlayerId, f32)> = self
            .chosen
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();

        let mut restored = 0;
        for (player, rate) in snapshot {
            if world.player_position(player).is_none() || world.has_speed_aura(player) {
                continue;
            }

            let drifted = self.move_types.iter().any(|move_type| {
                world
                    .current_speed(player, *move_type)
                    .map(|current| (current - rate).abs() >= RATE_EPSILON)
                    .unwrap_or(false)
            });
            if !drifted {
                continue;
            }

            let mut failed = false;
            for move_type in &self.move_types {
                if let Err(e) = world.set_speed(player, *move_type, rate) {
                    warn!("⚠️ Could not restore {} speed for player {}: {}", move_type, player, e);
                    failed = true;
                    break;
                }
            }
            if !failed {
                debug!("🏃 Restored speed {:.1}x for player {}", rate, player);
                restored += 1;
            }
        }
        restored
    }

    fn roll_back(world: &dyn WorldAccess, player: PlayerId, changed: Vec<(MoveType, f32)>) {
        for (move_type, previous) in changed.into_iter().rev() {
            if let Err(e) = world.set_speed(player, move_type, previous) {
                warn!("⚠️ Could not roll back {} speed for player {}: {}", move_type, player, e);
            }
        }
    }
}
