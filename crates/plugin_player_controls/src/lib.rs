//! # Player Controls Plugin
//!
//! Chat shortcuts for moving around the world:
//!
//! - `t <location>` teleports to a named location
//! - `tb`, `tb2` ... `tbN` teleport back through a short history of
//!   previous positions, `tb list` shows it
//! - `app <player>` teleports to another player
//! - `s1` ... `s4` scale run and swim speed
//! - `pc help` lists the commands
//!
//! The plugin listens on `client:chat:message`, `core:server_tick`,
//! `core:player_connected` and `core:player_disconnected`.

use async_trait::async_trait;
use std::sync::Arc;
use waypoint_events::{
    EventSystem, LogLevel, PlayerChatEvent, PlayerConnectedEvent, PlayerDisconnectedEvent, PluginError,
    ServerContext, ServerTickEvent, SimplePlugin,
};

pub mod commands;
pub mod config;
pub mod controls;
pub mod error;
pub mod history;
pub mod speed;

#[cfg(test)]
mod fake_world;

pub use commands::{parse_command, ControlCommand};
pub use config::{ControlsConfig, SpeedSettings};
pub use controls::{ChatOutcome, PlayerControls};
pub use error::{CommandError, ControlsError};
pub use history::{HistoryError, PositionHistory, PositionRecord, UNKNOWN_LOCATION};

/// Teleport and speed controls driven by chat.
pub struct PlayerControlsPlugin {
    name: String,
    controls: Arc<PlayerControls>,
}

impl PlayerControlsPlugin {
    pub fn new(config: &ControlsConfig) -> Self {
        Self {
            name: "player_controls".to_string(),
            controls: Arc::new(PlayerControls::new(config)),
        }
    }

    /// Shared handle to the controls, for hosts that want to inspect state.
    pub fn controls(&self) -> Arc<PlayerControls> {
        Arc::clone(&self.controls)
    }
}

impl Default for PlayerControlsPlugin {
    fn default() -> Self {
        Self::new(&ControlsConfig::default())
    }
}

#[async_trait]
impl SimplePlugin for PlayerControlsPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn register_handlers(
        &mut self,
        events: Arc<EventSystem>,
        context: Arc<dyn ServerContext>,
    ) -> Result<(), PluginError> {
        context.log(LogLevel::Info, "🧭 PlayerControls: Registering chat handlers...");

        let controls = Arc::clone(&self.controls);
        let world = context.world();
        events
            .on_client("chat", "message", move |event: PlayerChatEvent| {
                controls.handle_chat(world.as_ref(), event.player_id, &event.message);
                Ok(())
            })
            .await
            .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;

        let controls = Arc::clone(&self.controls);
        let world = context.world();
        events
            .on_core("server_tick", move |_event: ServerTickEvent| {
                controls.on_tick(world.as_ref());
                Ok(())
            })
            .await
            .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;

        let controls = Arc::clone(&self.controls);
        events
            .on_core("player_connected", move |event: PlayerConnectedEvent| {
                controls.on_connect(event.player_id);
                Ok(())
            })
            .await
            .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;

        let controls = Arc::clone(&self.controls);
        events
            .on_core("player_disconnected", move |event: PlayerDisconnectedEvent| {
                controls.on_disconnect(event.player_id);
                Ok(())
            })
            .await
            .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;

        context.log(LogLevel::Info, "🧭 PlayerControls: ✅ Handlers registered");
        Ok(())
    }

    async fn on_init(&mut self, context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        context.log(
            LogLevel::Info,
            &format!(
                "🧭 PlayerControls: Ready, keeping {} positions per player",
                self.controls.history().capacity()
            ),
        );
        Ok(())
    }

    async fn on_shutdown(&mut self, context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        context.log(
            LogLevel::Info,
            &format!(
                "🧭 PlayerControls: Shutting down. {} players had saved positions",
                self.controls.history().player_count()
            ),
        );
        Ok(())
    }
}
