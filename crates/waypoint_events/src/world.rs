//! # World Access
//!
//! The synchronous surface through which plugins read and mutate the
//! simulation. The host owns the player objects, the named-location table,
//! the aura system and chat delivery; plugins only ever see them through
//! [`WorldAccess`].
//!
//! Calls are expected to run on the host's simulation thread, in the same
//! callback that delivered the event, which is why nothing here is async.

use crate::types::{MoveType, PlayerId, WorldPosition};

/// Errors reported by world mutations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// The player is not in the world (logged out, loading screen...)
    #[error("Player {0} is not online")]
    PlayerOffline(PlayerId),
    /// The destination is not a valid place to put a unit
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),
    /// The host refused the request for its own reasons
    #[error("Request rejected by host: {0}")]
    Rejected(String),
}

/// Host services consumed by plugins.
///
/// # Examples
///
/// ```rust,ignore
/// fn greet(world: &dyn WorldAccess, player: PlayerId) {
///     let area = world.area_name(player).unwrap_or_else(|| "somewhere".to_string());
///     world.send_system_message(player, &format!("Welcome to {area}!"));
/// }
/// ```
pub trait WorldAccess: Send + Sync {
    /// Current position of an online player.
    fn player_position(&self, player: PlayerId) -> Option<WorldPosition>;

    /// Display name of the area the player is standing in, if the host can
    /// resolve one.
    fn area_name(&self, player: PlayerId) -> Option<String>;

    /// Looks up a named location in the host's teleport table.
    ///
    /// Matching is exact on the whole name and ignores ASCII case.
    fn find_location(&self, name: &str) -> Option<WorldPosition>;

    /// Finds an online player by character name, ignoring ASCII case.
    fn find_online_player(&self, name: &str) -> Option<PlayerId>;

    /// Moves a player to `destination`.
    fn teleport(&self, player: PlayerId, destination: &WorldPosition) -> Result<(), WorldError>;

    /// Sets the speed rate of one movement kind (1.0 is normal speed).
    fn set_speed(&self, player: PlayerId, move_type: MoveType, rate: f32) -> Result<(), WorldError>;

    /// Current speed rate of one movement kind.
    fn current_speed(&self, player: PlayerId, move_type: MoveType) -> Option<f32>;

    /// Whether an aura that changes movement speed (a slow, a root, a
    /// mount...) is currently applied to the player.
    fn has_speed_aura(&self, player: PlayerId) -> bool;

    /// Delivers a system chat message to a single player.
    fn send_system_message(&self, player: PlayerId, text: &str);
}
