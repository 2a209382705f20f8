//! Line-oriented console that stands in for game clients.
//!
//! Each line is either `<player name>: <chat text>` or a host command
//! starting with `/`.

use crate::world::SimulatedWorld;
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use waypoint_events::{
    current_timestamp, EventSystem, PlayerChatEvent, PlayerConnectedEvent, PlayerDisconnectedEvent, PlayerId,
    WorldAccess,
};

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Empty,
    Quit,
    Who,
    /// Drop a character's speed back to normal
    Reset { player_name: String },
    /// Toggle a character's speed aura
    Aura { player_name: String, active: bool },
    Login { player_id: PlayerId, player_name: String },
    Logout { player_name: String },
    Chat { player_name: String, text: String },
    Invalid(String),
}

/// Parses one console line.
pub fn parse_line(line: &str) -> ConsoleInput {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleInput::Empty;
    }

    if let Some(command) = line.strip_prefix('/') {
        let mut words = command.split_whitespace();
        let name = words.next().map(str::to_ascii_lowercase);
        let arg = words.next().map(str::to_string);
        let flag = words.next().map(str::to_string);
        if words.next().is_some() {
            return ConsoleInput::Invalid(format!("Too many arguments: /{command}"));
        }

        return match (name.as_deref(), arg, flag) {
            (Some("quit"), None, None) => ConsoleInput::Quit,
            (Some("who"), None, None) => ConsoleInput::Who,
            (Some("reset"), Some(player_name), None) => ConsoleInput::Reset { player_name },
            (Some("aura"), Some(player_name), Some(flag)) => match flag.to_ascii_lowercase().as_str() {
                "on" => ConsoleInput::Aura { player_name, active: true },
                "off" => ConsoleInput::Aura { player_name, active: false },
                _ => ConsoleInput::Invalid("Usage: /aura <name> on|off".to_string()),
            },
            (Some("login"), Some(id), Some(player_name)) => match id.parse() {
                Ok(player_id) => ConsoleInput::Login { player_id, player_name },
                Err(_) => ConsoleInput::Invalid("Usage: /login <id> <name>".to_string()),
            },
            (Some("logout"), Some(player_name), None) => ConsoleInput::Logout { player_name },
            _ => ConsoleInput::Invalid(format!("Unknown console command: /{command}")),
        };
    }

    match line.split_once(':') {
        Some((name, text)) if !name.trim().is_empty() && !text.trim().is_empty() => ConsoleInput::Chat {
            player_name: name.trim().to_string(),
            text: text.trim().to_string(),
        },
        _ => ConsoleInput::Invalid("Expected `<player name>: <text>`".to_string()),
    }
}

/// Reads stdin on a dedicated thread and forwards each line.
///
/// The thread is detached: a read still pending at shutdown does not hold
/// the runtime open.
pub fn spawn_stdin_reader() -> anyhow::Result<mpsc::UnboundedReceiver<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("console-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("❌ Failed to read console input: {}", e);
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

/// Emits `core:player_connected` for every character currently online.
pub async fn announce_online_players(events: &EventSystem, world: &SimulatedWorld) {
    for (player_id, name) in world.online_players() {
        announce_connected(events, player_id, name).await;
    }
}

async fn announce_connected(events: &EventSystem, player_id: PlayerId, name: String) {
    let event = PlayerConnectedEvent {
        player_id,
        name,
        timestamp: current_timestamp(),
    };
    if let Err(e) = events.emit_core("player_connected", &event).await {
        warn!("⚠️ Failed to announce login of {}: {}", event.name, e);
    }
}

/// Feeds console lines into the event system.
pub struct Console {
    events: Arc<EventSystem>,
    world: Arc<SimulatedWorld>,
}

impl Console {
    pub fn new(events: Arc<EventSystem>, world: Arc<SimulatedWorld>) -> Self {
        Self { events, world }
    }

    /// Handles lines until `/quit` or until the sender side closes.
    pub async fn run(&self, mut lines: mpsc::UnboundedReceiver<String>) {
        while let Some(line) = lines.recv().await {
            if !self.handle_line(&line).await {
                info!("👋 Console closed by /quit");
                return;
            }
        }
        info!("👋 Console input ended");
    }

    /// Handles one line. Returns `false` when the console should stop.
    pub async fn handle_line(&self, line: &str) -> bool {
        match parse_line(line) {
            ConsoleInput::Empty => {}
            ConsoleInput::Quit => return false,
            ConsoleInput::Who => {
                for (id, name) in self.world.online_players() {
                    println!("  {id}: {name}");
                }
            }
            ConsoleInput::Reset { player_name } => {
                match self.world.find_online_player(&player_name) {
                    Some(id) if self.world.reset_speeds(id) => info!("🔄 Reset speeds for {}", player_name),
                    _ => warn!("⚠️ {} is not online", player_name),
                }
            }
            ConsoleInput::Aura { player_name, active } => {
                match self.world.find_online_player(&player_name) {
                    Some(id) if self.world.set_speed_aura(id, active) => {
                        info!("✨ Speed aura for {} is now {}", player_name, if active { "on" } else { "off" })
                    }
                    _ => warn!("⚠️ {} is not online", player_name),
                }
            }
            ConsoleInput::Login { player_id, player_name } => self.login(player_id, player_name).await,
            ConsoleInput::Logout { player_name } => self.logout(&player_name).await,
            ConsoleInput::Chat { player_name, text } => self.chat(&player_name, text).await,
            ConsoleInput::Invalid(reason) => warn!("⚠️ {}", reason),
        }
        true
    }

    async fn chat(&self, player_name: &str, message: String) {
        let Some(player_id) = self.world.find_online_player(player_name) else {
            warn!("⚠️ {} is not online", player_name);
            return;
        };
        debug!("💬 {} ({}): {}", player_name, player_id, message);

        let event = PlayerChatEvent {
            player_id,
            message,
            channel: "say".to_string(),
        };
        if let Err(e) = self.events.emit_client("chat", "message", &event).await {
            warn!("⚠️ Failed to deliver chat from {}: {}", player_name, e);
        }
    }

    async fn login(&self, player_id: PlayerId, player_name: String) {
        if self.world.player_position(player_id).is_some() {
            warn!("⚠️ Player {} is already online", player_id);
            return;
        }
        if self.world.find_online_player(&player_name).is_some() {
            warn!("⚠️ A character named {} is already online", player_name);
            return;
        }

        self.world.login(player_id, &player_name, self.world.spawn_point());
        info!("👤 {} joined the world", player_name);
        announce_connected(&self.events, player_id, player_name).await;
    }

    async fn logout(&self, player_name: &str) {
        let Some(player_id) = self.world.find_online_player(player_name) else {
            warn!("⚠️ {} is not online", player_name);
            return;
        };
        self.world.logout(player_id);

        let event = PlayerDisconnectedEvent {
            player_id,
            timestamp: current_timestamp(),
        };
        if let Err(e) = self.events.emit_core("player_disconnected", &event).await {
            warn!("⚠️ Failed to announce logout of {}: {}", player_name, e);
        }
        info!("👋 {} left the world", player_name);
    }
}
