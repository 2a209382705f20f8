//! Error types for the player controls plugin.
//!
//! None of these escalate past the plugin: every one ends up as a system
//! message to the player who typed the command.

use crate::history::HistoryError;
use thiserror::Error;
use waypoint_events::{PlayerId, WorldError};

/// A recognized command token with arguments it cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Usage: {usage}")]
pub struct CommandError {
    pub usage: &'static str,
}

/// Failures while executing a parsed command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlsError {
    #[error("Invalid location. Teleportation failed.")]
    UnknownLocation(String),

    #[error("Player not found or not online.")]
    PlayerNotFound(String),

    #[error("You are already there.")]
    SelfTarget,

    #[error("Your position could not be determined.")]
    NoPosition(PlayerId),

    #[error("No position stored for the requested index.")]
    History(#[from] HistoryError),

    #[error("Request failed: {0}")]
    World(#[from] WorldError),
}
