//! Waypoint reference host
//!
//! Loads the configuration, builds a simulated world, starts the player
//! controls plugin and drives it from a stdin console plus a tick task.

mod cli;
mod config;
mod console;
mod context;
mod logging;
mod signals;
mod world;

use anyhow::{anyhow, Context as _};
use cli::CliArgs;
use config::AppConfig;
use console::Console;
use context::HostContext;
use plugin_player_controls::PlayerControlsPlugin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};
use waypoint_events::{
    create_event_system, current_timestamp, EventSystem, ServerContext, ServerTickEvent, SimplePlugin,
};
use world::{SimulatedWorld, SystemMessage};

/// Main application state
pub struct Application {
    config: AppConfig,
    events: Arc<EventSystem>,
    world: Arc<SimulatedWorld>,
    context: Arc<dyn ServerContext>,
    plugin: PlayerControlsPlugin,
    inbox: mpsc::UnboundedReceiver<SystemMessage>,
}

impl Application {
    /// Loads configuration, sets up logging and starts the plugin.
    pub async fn new(args: CliArgs) -> anyhow::Result<Self> {
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        config
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        logging::setup_logging(&config.logging)?;
        display_banner();

        let events = create_event_system();
        let (world, inbox) = SimulatedWorld::from_settings(&config.world);
        let world = Arc::new(world);
        let context: Arc<dyn ServerContext> = Arc::new(HostContext::new(Arc::clone(&world)));

        let mut plugin = PlayerControlsPlugin::new(&config.controls);
        let plugin_name = plugin.name().to_string();
        plugin
            .register_handlers(Arc::clone(&events), Arc::clone(&context))
            .await
            .with_context(|| format!("Failed to register handlers for {plugin_name}"))?;
        plugin
            .on_init(Arc::clone(&context))
            .await
            .with_context(|| format!("Failed to initialize {plugin_name}"))?;
        console::announce_online_players(&events, &world).await;

        info!(
            "🔌 Loaded plugin {} v{} | 📂 Config: {}",
            plugin_name,
            plugin.version(),
            args.config_path.display()
        );

        Ok(Self {
            config,
            events,
            world,
            context,
            plugin,
            inbox,
        })
    }

    /// Runs until the console closes or a shutdown signal arrives.
    pub async fn run(self) -> anyhow::Result<()> {
        let Self {
            config,
            events,
            world,
            context,
            mut plugin,
            mut inbox,
        } = self;

        info!("📋 Configuration Summary:");
        info!("  ⏱️ Tick interval: {}ms", config.server.tick_interval_ms);
        info!("  🧭 History capacity: {}", config.controls.history_capacity);
        info!(
            "  🗺️ {} locations, {} areas, {} players online",
            config.world.locations.len(),
            config.world.areas.len(),
            world.online_players().len()
        );

        // The world keeps the outbox sender alive, so the printer is told to
        // stop and drains whatever is still queued.
        let (stop_printer, mut printer_stopped) = oneshot::channel::<()>();
        let printer_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    message = inbox.recv() => match message {
                        Some(message) => print_message(&message),
                        None => break,
                    },
                    _ = &mut printer_stopped => {
                        while let Ok(message) = inbox.try_recv() {
                            print_message(&message);
                        }
                        break;
                    }
                }
            }
        });

        let tick_handle = match config.server.tick_interval_ms {
            0 => {
                info!("⏸️ Server tick disabled");
                None
            }
            interval_ms => Some(spawn_tick_task(Arc::clone(&events), interval_ms)),
        };

        info!("✅ Waypoint is running. Type `<player>: <command>`, /who or /quit");

        let console = Console::new(Arc::clone(&events), Arc::clone(&world));
        let lines = console::spawn_stdin_reader()?;

        tokio::select! {
            _ = console.run(lines) => {}
            result = signals::wait_for_shutdown_signal() => {
                match result {
                    Ok(()) => info!("🛑 Shutdown signal received, initiating graceful shutdown..."),
                    Err(e) => error!("❌ Signal handling failed: {:?}", e),
                }
            }
        }

        if let Some(handle) = tick_handle {
            handle.abort();
        }

        if let Err(e) = plugin.on_shutdown(Arc::clone(&context)).await {
            warn!("⚠️ Plugin {} failed to shut down cleanly: {}", plugin.name(), e);
        }
        let _ = stop_printer.send(());
        if let Err(e) = printer_handle.await {
            warn!("⚠️ Message printer ended abnormally: {}", e);
        }

        let final_stats = events.get_stats().await;
        info!("📊 Final Statistics:");
        info!("  - Total events processed: {}", final_stats.events_emitted);
        info!("  - Handlers registered: {}", final_stats.total_handlers);
        info!("👋 Waypoint shutdown complete");

        Ok(())
    }
}

fn print_message(message: &SystemMessage) {
    println!("[to {}] {}", message.player_name, message.text);
}

/// Emits `core:server_tick` every `interval_ms` milliseconds.
fn spawn_tick_task(events: Arc<EventSystem>, interval_ms: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut tick = 0u64;

        loop {
            interval.tick().await;
            tick += 1;

            let event = ServerTickEvent {
                tick,
                timestamp: current_timestamp(),
            };
            if let Err(e) = events.emit_core("server_tick", &event).await {
                error!("❌ Failed to emit server tick {}: {}", tick, e);
            }
        }
    })
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("❌ Failed to start application: {:?}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Display startup banner
fn display_banner() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("UNK");
    info!("╔══════════════════════════════════════════╗");
    info!("║            🧭 WAYPOINT HOST 🧭            ║");
    info!("║                 v{:<8}                ║", version);
    info!("║                                          ║");
    info!("║  Teleport history and speed controls     ║");
    info!("║  driven by player chat                   ║");
    info!("╚══════════════════════════════════════════╝");
}
