//! Command execution against the host world.

use crate::commands::{help_text, parse_command, CommandLimits, ControlCommand};
use crate::config::ControlsConfig;
use crate::error::ControlsError;
use crate::history::{PositionHistory, PositionRecord};
use crate::speed::SpeedKeeper;
use tracing::{debug, info};
use waypoint_events::{PlayerId, WorldAccess, WorldPosition};

/// What the plugin did with a chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Not a command; the line is ordinary chat
    Ignored,
    /// A command ran (successfully or not) and a reply was sent
    Handled,
}

/// Chat-driven teleport and speed controls.
///
/// Owns the position history and the speed keeper. One instance is shared by
/// every handler the plugin registers.
#[derive(Debug)]
pub struct PlayerControls {
    history: PositionHistory,
    speed: SpeedKeeper,
    limits: CommandLimits,
    persist_speed: bool,
}

impl PlayerControls {
    pub fn new(config: &ControlsConfig) -> Self {
        Self {
            history: PositionHistory::new(config.history_capacity),
            speed: SpeedKeeper::new(config.speed.move_types.clone()),
            limits: CommandLimits {
                max_rank: config.history_capacity.max(1),
                max_speed_level: config.speed.max_level,
            },
            persist_speed: config.speed.persist,
        }
    }

    pub fn history(&self) -> &PositionHistory {
        &self.history
    }

    pub fn speed(&self) -> &SpeedKeeper {
        &self.speed
    }

    /// Parses and runs a chat line, replying to the player with the result.
    pub fn handle_chat(&self, world: &dyn WorldAccess, player: PlayerId, message: &str) -> ChatOutcome {
        let command = match parse_command(message, &self.limits) {
            None => return ChatOutcome::Ignored,
            Some(Err(usage)) => {
                world.send_system_message(player, &usage.to_string());
                return ChatOutcome::Handled;
            }
            Some(Ok(command)) => command,
        };

        debug!("💬 Player {} issued {:?}", player, command);
        let reply = match self.execute(world, player, command) {
            Ok(reply) => reply,
            Err(e) => {
                debug!("Command from player {} failed: {:?}", player, e);
                e.to_string()
            }
        };
        world.send_system_message(player, &reply);
        ChatOutcome::Handled
    }

    /// Runs a parsed command and returns the reply text.
    pub fn execute(
        &self,
        world: &dyn WorldAccess,
        player: PlayerId,
        command: ControlCommand,
    ) -> Result<String, ControlsError> {
        match command {
            ControlCommand::Help => Ok(help_text(&self.limits)),
            ControlCommand::ListHistory => Ok(self.render_history(player)),
            ControlCommand::Teleport { location } => {
                let destination = world
                    .find_location(&location)
                    .ok_or(ControlsError::UnknownLocation(location))?;
                self.teleport_recording(world, player, &destination)?;
                Ok("Teleported successfully.".to_string())
            }
            ControlCommand::Back { rank } => {
                // Resolve before recording, or the new entry would shift the ranks.
                let target = self.history.get(player, rank)?;
                self.teleport_recording(world, player, &target.destination())?;
                Ok("Teleported to a previous position.".to_string())
            }
            ControlCommand::Appear { player_name } => {
                let target = world
                    .find_online_player(&player_name)
                    .ok_or_else(|| ControlsError::PlayerNotFound(player_name.clone()))?;
                if target == player {
                    return Err(ControlsError::SelfTarget);
                }
                let destination = world
                    .player_position(target)
                    .ok_or(ControlsError::PlayerNotFound(player_name))?;
                self.teleport_recording(world, player, &destination)?;
                Ok("Teleported to the target player.".to_string())
            }
            ControlCommand::Speed { level } => {
                let rate = level as f32;
                self.speed.apply(world, player, rate)?;
                if !self.persist_speed {
                    self.speed.forget(player);
                }
                info!("🏃 Player {} set speed to {}x", player, level);
                Ok(format!("Speed set to {level}x."))
            }
        }
    }

    /// Re-applies remembered speeds; called once per host tick.
    pub fn on_tick(&self, world: &dyn WorldAccess) -> usize {
        if !self.persist_speed {
            return 0;
        }
        self.speed.reconcile(world)
    }

    /// A new session starts at normal speed, even if no disconnect was seen.
    pub fn on_connect(&self, player: PlayerId) {
        if self.speed.chosen_rate(player).is_some() {
            debug!("Player {} reconnected, dropping remembered speed", player);
        }
        self.speed.forget(player);
    }

    /// Forgets transient per-player state. History is kept.
    pub fn on_disconnect(&self, player: PlayerId) {
        self.speed.forget(player);
    }

    /// Captures where the player stands, teleports, and records the captured
    /// position only once the teleport went through.
    fn teleport_recording(
        &self,
        world: &dyn WorldAccess,
        player: PlayerId,
        destination: &WorldPosition,
    ) -> Result<(), ControlsError> {
        let origin = world
            .player_position(player)
            .ok_or(ControlsError::NoPosition(player))?;
        let origin = PositionRecord::capture(origin, world.area_name(player));

        world.teleport(player, destination)?;

        info!(
            "✨ Player {} teleported from '{}' to map {} ({:.1}, {:.1}, {:.1})",
            player, origin.location_name, destination.map_id, destination.x, destination.y, destination.z
        );
        self.history.record(player, origin);
        Ok(())
    }

    fn render_history(&self, player: PlayerId) -> String {
        let records = self.history.list(player);
        if records.is_empty() {
            return "No saved positions available.".to_string();
        }

        let mut text = String::from("Saved Positions:\n");
        for (index, record) in records.iter().enumerate() {
            text.push_str(&format!("tb{}: {}\n", index + 1, record.location_name));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_world::FakeWorld;
    use waypoint_events::{MapId, MoveType, WorldError};

    const ALICE: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);

    fn setup() -> (PlayerControls, FakeWorld) {
        let world = FakeWorld::new();
        world.add_player(ALICE, "Alice", WorldPosition::new(MapId(0), 1.0, 1.0, 1.0, 0.0), Some("Goldshire"));
        world.add_player(BOB, "Bob", WorldPosition::new(MapId(1), 50.0, 60.0, 70.0, 1.5), Some("Orgrimmar"));
        world.add_location("Stormwind", WorldPosition::new(MapId(0), 100.0, 200.0, 10.0, 3.0));
        world.add_location("Ironforge", WorldPosition::new(MapId(0), 300.0, 400.0, 20.0, 0.0));
        (PlayerControls::new(&ControlsConfig::default()), world)
    }

    #[test]
    fn teleport_records_origin_and_replies() {
        let (controls, world) = setup();

        assert_eq!(controls.handle_chat(&world, ALICE, "t stormwind"), ChatOutcome::Handled);

        assert_eq!(world.position(ALICE).x, 100.0);
        assert_eq!(world.last_message(ALICE).as_deref(), Some("Teleported successfully."));

        let saved = controls.history().get(ALICE, 1).unwrap();
        assert_eq!(saved.location_name, "Goldshire");
        assert_eq!(saved.x, 1.0);
    }

    #[test]
    fn unknown_location_leaves_history_untouched() {
        let (controls, world) = setup();

        controls.handle_chat(&world, ALICE, "t atlantis");

        assert_eq!(
            world.last_message(ALICE).as_deref(),
            Some("Invalid location. Teleportation failed.")
        );
        assert_eq!(controls.history().len(ALICE), 0);
        assert_eq!(world.position(ALICE).x, 1.0);
    }

    #[test]
    fn failed_teleport_is_not_recorded() {
        let (controls, world) = setup();
        world.reject_teleports("instance is full");

        controls.handle_chat(&world, ALICE, "t Stormwind");

        assert_eq!(controls.history().len(ALICE), 0);
        assert_eq!(
            world.last_message(ALICE).as_deref(),
            Some("Request failed: Request rejected by host: instance is full")
        );
    }

    #[test]
    fn teleport_back_uses_rank_before_recording() {
        let (controls, world) = setup();

        controls.handle_chat(&world, ALICE, "t Stormwind"); // history: [Goldshire]
        world.set_area(ALICE, Some("Stormwind City"));
        controls.handle_chat(&world, ALICE, "t Ironforge"); // history: [Stormwind City, Goldshire]
        world.set_area(ALICE, Some("Ironforge"));

        controls.handle_chat(&world, ALICE, "tb2");

        assert_eq!(world.position(ALICE).x, 1.0, "tb2 should land in Goldshire");
        assert_eq!(
            world.last_message(ALICE).as_deref(),
            Some("Teleported to a previous position.")
        );

        let names: Vec<String> = controls
            .history()
            .list(ALICE)
            .into_iter()
            .map(|r| r.location_name)
            .collect();
        assert_eq!(names, vec!["Ironforge", "Stormwind City", "Goldshire"]);
    }

    #[test]
    fn teleport_back_without_history() {
        let (controls, world) = setup();

        controls.handle_chat(&world, ALICE, "tb");

        assert_eq!(
            world.last_message(ALICE).as_deref(),
            Some("No position stored for the requested index.")
        );
        assert_eq!(world.position(ALICE).x, 1.0);
    }

    #[test]
    fn list_history_renders_ranks() {
        let (controls, world) = setup();

        controls.handle_chat(&world, ALICE, "tb list");
        assert_eq!(world.last_message(ALICE).as_deref(), Some("No saved positions available."));

        controls.handle_chat(&world, ALICE, "t Stormwind");
        world.set_area(ALICE, None);
        controls.handle_chat(&world, ALICE, "t Ironforge");
        controls.handle_chat(&world, ALICE, "tb list");

        assert_eq!(
            world.last_message(ALICE).as_deref(),
            Some("Saved Positions:\ntb1: Unknown\ntb2: Goldshire\n")
        );
    }

    #[test]
    fn appear_moves_to_target_player() {
        let (controls, world) = setup();

        controls.handle_chat(&world, ALICE, "app bob");

        let position = world.position(ALICE);
        assert_eq!(position.map_id, MapId(1));
        assert_eq!((position.x, position.y, position.z), (50.0, 60.0, 70.0));
        assert_eq!(world.last_message(ALICE).as_deref(), Some("Teleported to the target player."));
        assert_eq!(controls.history().len(ALICE), 1);
    }

    #[test]
    fn appear_rejects_offline_and_self() {
        let (controls, world) = setup();

        controls.handle_chat(&world, ALICE, "app Nobody");
        assert_eq!(world.last_message(ALICE).as_deref(), Some("Player not found or not online."));

        controls.handle_chat(&world, ALICE, "app alice");
        assert_eq!(world.last_message(ALICE).as_deref(), Some("You are already there."));

        assert_eq!(controls.history().len(ALICE), 0);
    }

    #[test]
    fn speed_sets_run_and_swim() {
        let (controls, world) = setup();

        controls.handle_chat(&world, ALICE, "s3");

        assert_eq!(world.speed(ALICE, MoveType::Run), 3.0);
        assert_eq!(world.speed(ALICE, MoveType::Swim), 3.0);
        assert_eq!(world.last_message(ALICE).as_deref(), Some("Speed set to 3x."));
        assert_eq!(controls.speed().chosen_rate(ALICE), Some(3.0));

        controls.handle_chat(&world, ALICE, "s1");
        assert_eq!(world.speed(ALICE, MoveType::Run), 1.0);
        assert_eq!(controls.speed().chosen_rate(ALICE), None);
    }

    #[test]
    fn usage_is_sent_for_bad_arguments() {
        let (controls, world) = setup();

        assert_eq!(controls.handle_chat(&world, ALICE, "s9"), ChatOutcome::Handled);
        assert_eq!(world.last_message(ALICE).as_deref(), Some("Usage: s<level>"));
        assert_eq!(world.speed(ALICE, MoveType::Run), 1.0);
    }

    #[test]
    fn plain_chat_is_ignored() {
        let (controls, world) = setup();

        assert_eq!(controls.handle_chat(&world, ALICE, "anyone up for a dungeon?"), ChatOutcome::Ignored);
        assert!(world.last_message(ALICE).is_none());
    }

    #[test]
    fn tick_restores_drifted_speed_unless_aura() {
        let (controls, world) = setup();
        controls.handle_chat(&world, ALICE, "s4");

        world.force_speed(ALICE, MoveType::Run, 1.0);
        world.set_speed_aura(ALICE, true);
        assert_eq!(controls.on_tick(&world), 0);
        assert_eq!(world.speed(ALICE, MoveType::Run), 1.0);

        world.set_speed_aura(ALICE, false);
        assert_eq!(controls.on_tick(&world), 1);
        assert_eq!(world.speed(ALICE, MoveType::Run), 4.0);

        // Nothing drifted, nothing to do.
        assert_eq!(controls.on_tick(&world), 0);
    }

    #[test]
    fn disconnect_forgets_speed_but_keeps_history() {
        let (controls, world) = setup();
        controls.handle_chat(&world, ALICE, "s2");
        controls.handle_chat(&world, ALICE, "t Stormwind");

        controls.on_disconnect(ALICE);

        assert_eq!(controls.speed().chosen_rate(ALICE), None);
        assert_eq!(controls.history().len(ALICE), 1);
    }

    #[test]
    fn speed_not_remembered_when_persist_disabled() {
        let mut config = ControlsConfig::default();
        config.speed.persist = false;
        let controls = PlayerControls::new(&config);
        let (_, world) = setup();

        controls.handle_chat(&world, ALICE, "s2");
        world.force_speed(ALICE, MoveType::Run, 1.0);

        assert_eq!(controls.speed().chosen_rate(ALICE), None);
        assert_eq!(controls.on_tick(&world), 0);
    }

    #[test]
    fn speed_failure_is_reported() {
        let (controls, world) = setup();
        world.remove_player(ALICE);

        let result = controls.execute(&world, ALICE, ControlCommand::Speed { level: 2 });
        assert_eq!(result, Err(ControlsError::World(WorldError::PlayerOffline(ALICE))));
    }

    #[test]
    fn partially_rejected_speed_changes_nothing() {
        let (controls, world) = setup();
        world.reject_speed(MoveType::Swim, "no swim");

        controls.handle_chat(&world, ALICE, "s3");

        assert_eq!(
            world.last_message(ALICE).as_deref(),
            Some("Request failed: Request rejected by host: no swim")
        );
        assert_eq!(world.speed(ALICE, MoveType::Run), 1.0);
        assert_eq!(world.speed(ALICE, MoveType::Swim), 1.0);
        assert_eq!(controls.speed().chosen_rate(ALICE), None);
    }
}
