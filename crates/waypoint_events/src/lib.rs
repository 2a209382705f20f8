//! # Waypoint Event System
//!
//! The seam between the Waypoint host and its plugins. The host owns the
//! world simulation and message dispatch; plugins register typed handlers on
//! the [`EventSystem`] and act on the world through [`WorldAccess`].
//!
//! ## Architecture Overview
//!
//! Events are routed by string key in three categories:
//!
//! ### Core Events (`core:*`)
//! Server infrastructure events such as player connections and the periodic
//! simulation tick.
//!
//! ### Client Events (`client:namespace:event`)
//! Events originating from players, grouped by namespace (`chat`, `movement`...).
//!
//! ### Plugin Events (`plugin:plugin_name:event`)
//! Inter-plugin communication without direct coupling.
//!
//! ## Plugin Development
//!
//! ```rust,ignore
//! use waypoint_events::*;
//!
//! struct MotdPlugin;
//!
//! #[async_trait]
//! impl SimplePlugin for MotdPlugin {
//!     fn name(&self) -> &str { "motd" }
//!     fn version(&self) -> &str { "1.0.0" }
//!
//!     async fn register_handlers(
//!         &mut self,
//!         events: Arc<EventSystem>,
//!         context: Arc<dyn ServerContext>,
//!     ) -> Result<(), PluginError> {
//!         let world = context.world();
//!         events
//!             .on_core("player_connected", move |event: PlayerConnectedEvent| {
//!                 world.send_system_message(event.player_id, "Welcome!");
//!                 Ok(())
//!             })
//!             .await
//!             .map_err(|e| PluginError::InitializationFailed(e.to_string()))
//!     }
//! }
//! ```

pub use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

pub mod system;
pub mod types;
pub mod world;

pub use system::{EventSystem, EventSystemStats};
pub use types::{MapId, MoveType, PlayerId, WorldPosition};
pub use world::{WorldAccess, WorldError};

// ============================================================================
// Event Traits
// ============================================================================

/// Core trait for all events in the system.
///
/// Any type that is `Serialize + DeserializeOwned + Send + Sync + Debug`
/// gets this implementation for free, with JSON as the wire format.
pub trait Event: Send + Sync + Any + std::fmt::Debug {
    /// Returns the type name of this event for debugging and routing.
    fn type_name() -> &'static str
    where
        Self: Sized;

    /// Serializes the event to bytes.
    fn serialize(&self) -> Result<Vec<u8>, EventError>;

    /// Deserializes an event from bytes.
    fn deserialize(data: &[u8]) -> Result<Self, EventError>
    where
        Self: Sized;
}

impl<T> Event for T
where
    T: Serialize + DeserializeOwned + Send + Sync + Any + std::fmt::Debug + 'static,
{
    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn serialize(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(EventError::Serialization)
    }

    fn deserialize(data: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(data).map_err(EventError::Deserialization)
    }
}

/// Handler trait for processing serialized events.
///
/// Most users register closures through [`EventSystem`] and never implement
/// this directly.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles a serialized event.
    async fn handle(&self, data: &[u8]) -> Result<(), EventError>;

    /// Human-readable name for logging.
    fn handler_name(&self) -> &str;
}

/// Bridges a typed closure to the byte-level [`EventHandler`] interface.
pub struct TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    handler: F,
    name: String,
    _phantom: std::marker::PhantomData<T>,
}

impl<T, F> TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    pub fn new(name: String, handler: F) -> Self {
        Self {
            handler,
            name,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T, F> EventHandler for TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    async fn handle(&self, data: &[u8]) -> Result<(), EventError> {
        let event = T::deserialize(data)?;
        (self.handler)(event)
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// Errors that can occur during event system operations.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Serialization failed when converting event to bytes
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Deserialization failed when converting bytes to event
    #[error("Deserialization error: {0}")]
    Deserialization(serde_json::Error),
    /// Handler execution failed during event processing
    #[error("Handler execution error: {0}")]
    HandlerExecution(String),
}

// ============================================================================
// Core and Client Events
// ============================================================================

/// Emitted when a player enters the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConnectedEvent {
    pub player_id: PlayerId,
    /// Character name
    pub name: String,
    pub timestamp: u64,
}

/// Emitted when a player leaves the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDisconnectedEvent {
    pub player_id: PlayerId,
    pub timestamp: u64,
}

/// Emitted by the host once per simulation tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerTickEvent {
    /// Monotonic tick counter, starting at 1
    pub tick: u64,
    pub timestamp: u64,
}

/// A chat line typed by a player, emitted as `client:chat:message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerChatEvent {
    pub player_id: PlayerId,
    pub message: String,
    /// Chat channel (say, party, guild...)
    pub channel: String,
}

/// Current UNIX timestamp in seconds.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Creates a new, empty event system behind an `Arc`.
pub fn create_event_system() -> Arc<EventSystem> {
    Arc::new(EventSystem::new())
}

// ============================================================================
// Plugin Lifecycle
// ============================================================================

/// Safe, high-level plugin interface.
///
/// # Lifecycle
///
/// 1. `register_handlers()` wires up event handlers
/// 2. `on_init()` runs once all plugins have registered
/// 3. the plugin reacts to events
/// 4. `on_shutdown()` runs before the host exits
#[async_trait]
pub trait SimplePlugin: Send + Sync + 'static {
    /// Unique, stable plugin name.
    fn name(&self) -> &str;

    /// Semantic version string.
    fn version(&self) -> &str;

    /// Registers event handlers. The plugin receives no events until this
    /// returns `Ok`.
    async fn register_handlers(
        &mut self,
        events: Arc<EventSystem>,
        context: Arc<dyn ServerContext>,
    ) -> Result<(), PluginError>;

    /// Initialize the plugin with server context.
    async fn on_init(&mut self, _context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        Ok(())
    }

    /// Shutdown the plugin gracefully. Errors are logged but do not prevent
    /// the host from exiting.
    async fn on_shutdown(&mut self, _context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Server context interface providing access to core server services.
pub trait ServerContext: Send + Sync {
    /// Logs a message through the host's logging pipeline.
    fn log(&self, level: LogLevel, message: &str);

    /// World services for reading and mutating the simulation.
    fn world(&self) -> Arc<dyn WorldAccess>;
}

/// Log levels understood by [`ServerContext::log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Critical errors that may affect system stability
    Error,
    /// Warning conditions that should be investigated
    Warn,
    /// General informational messages
    Info,
    /// Detailed information for debugging
    Debug,
    /// Very detailed trace information
    Trace,
}

/// Errors that can occur during plugin operations.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Plugin initialization failed during startup
    #[error("Plugin initialization failed: {0}")]
    InitializationFailed(String),
}
