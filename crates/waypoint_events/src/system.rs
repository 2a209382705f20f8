//! # Event System Core Implementation
//!
//! The [`EventSystem`] keeps a map from event key to handlers and dispatches
//! serialized events to them.
//!
//! - Handler lookup: O(1) using HashMap
//! - Sequential handler execution in registration order
//! - Failure isolation: one handler failure doesn't affect others

use crate::{Event, EventError, EventHandler, TypedEventHandler};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// The core event system that manages event routing and handler execution.
///
/// Shared across tasks as `Arc<EventSystem>`; registration and statistics
/// are guarded by async read-write locks.
pub struct EventSystem {
    /// Map of event keys to their registered handlers
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    /// System statistics for monitoring
    stats: RwLock<EventSystemStats>,
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem").finish_non_exhaustive()
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSystem {
    /// Creates a new event system with no registered handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            stats: RwLock::new(EventSystemStats::default()),
        }
    }

    /// Registers a handler for core server events (`core:<event_name>`).
    pub async fn on_core<T, F>(&self, event_name: &str, handler: F) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let event_key = format!("core:{event_name}");
        self.register_typed_handler(event_key, handler).await
    }

    /// Registers a handler for client events (`client:<namespace>:<event_name>`).
    pub async fn on_client<T, F>(
        &self,
        namespace: &str,
        event_name: &str,
        handler: F,
    ) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let event_key = format!("client:{namespace}:{event_name}");
        self.register_typed_handler(event_key, handler).await
    }

    /// Registers a handler for plugin events (`plugin:<plugin_name>:<event_name>`).
    pub async fn on_plugin<T, F>(
        &self,
        plugin_name: &str,
        event_name: &str,
        handler: F,
    ) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let event_key = format!("plugin:{plugin_name}:{event_name}");
        self.register_typed_handler(event_key, handler).await
    }

    async fn register_typed_handler<T, F>(&self, event_key: String, handler: F) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let handler_name = format!("{}::{}", event_key, T::type_name());
        let handler_arc: Arc<dyn EventHandler> = Arc::new(TypedEventHandler::new(handler_name, handler));

        let mut handlers = self.handlers.write().await;
        handlers
            .entry(event_key.clone())
            .or_insert_with(Vec::new)
            .push(handler_arc);

        let mut stats = self.stats.write().await;
        stats.total_handlers += 1;

        info!("📝 Registered handler for {}", event_key);
        Ok(())
    }

    /// Emits a core server event to all registered handlers.
    pub async fn emit_core<T>(&self, event_name: &str, event: &T) -> Result<(), EventError>
    where
        T: Event,
    {
        let event_key = format!("core:{event_name}");
        self.emit_event(&event_key, event).await
    }

    /// Emits a client event to all registered handlers.
    pub async fn emit_client<T>(&self, namespace: &str, event_name: &str, event: &T) -> Result<(), EventError>
    where
        T: Event,
    {
        let event_key = format!("client:{namespace}:{event_name}");
        self.emit_event(&event_key, event).await
    }

    /// Emits a plugin event to all registered handlers.
    pub async fn emit_plugin<T>(&self, plugin_name: &str, event_name: &str, event: &T) -> Result<(), EventError>
    where
        T: Event,
    {
        let event_key = format!("plugin:{plugin_name}:{event_name}");
        self.emit_event(&event_key, event).await
    }

    /// Serializes once, then runs every handler for `event_key`. Handler
    /// failures are logged and swallowed.
    async fn emit_event<T>(&self, event_key: &str, event: &T) -> Result<(), EventError>
    where
        T: Event,
    {
        let data = event.serialize()?;
        let handlers = self.handlers.read().await;

        if let Some(event_handlers) = handlers.get(event_key) {
            debug!("📤 Emitting {} to {} handlers", event_key, event_handlers.len());

            for handler in event_handlers {
                if let Err(e) = handler.handle(&data).await {
                    error!("❌ Handler {} failed: {}", handler.handler_name(), e);
                }
            }

            let mut stats = self.stats.write().await;
            stats.events_emitted += 1;
        } else {
            warn!("⚠️ No handlers for event: {}", event_key);
        }

        Ok(())
    }

    /// Returns a snapshot of the current statistics.
    pub async fn get_stats(&self) -> EventSystemStats {
        self.stats.read().await.clone()
    }
}

/// Usage statistics for the event system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventSystemStats {
    /// Total number of registered event handlers
    pub total_handlers: usize,
    /// Total number of dispatched events (events with at least one handler)
    pub events_emitted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlayerChatEvent, PlayerId, ServerTickEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_client_event_reaches_handler() {
        let events = EventSystem::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_in_handler = Arc::clone(&seen);
        events
            .on_client("chat", "message", move |event: PlayerChatEvent| {
                assert_eq!(event.message, "hello");
                seen_in_handler.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .expect("Failed to register chat handler");

        events
            .emit_client(
                "chat",
                "message",
                &PlayerChatEvent {
                    player_id: PlayerId(1),
                    message: "hello".to_string(),
                    channel: "say".to_string(),
                },
            )
            .await
            .expect("Failed to emit chat event");

        assert_eq!(seen.load(Ordering::SeqCst), 1);

        let stats = events.get_stats().await;
        assert_eq!(stats.total_handlers, 1);
        assert_eq!(stats.events_emitted, 1);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_others() {
        let events = EventSystem::new();
        let seen = Arc::new(AtomicUsize::new(0));

        events
            .on_core("server_tick", |_event: ServerTickEvent| {
                Err(EventError::HandlerExecution("boom".to_string()))
            })
            .await
            .unwrap();

        let seen_in_handler = Arc::clone(&seen);
        events
            .on_core("server_tick", move |event: ServerTickEvent| {
                seen_in_handler.fetch_add(event.tick as usize, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        events
            .emit_core("server_tick", &ServerTickEvent { tick: 3, timestamp: 0 })
            .await
            .expect("Handler failures must not fail the emit");

        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_emit_without_handlers_is_not_an_error() {
        let events = EventSystem::new();
        events
            .emit_plugin("nobody", "listening", &serde_json::json!({ "x": 1 }))
            .await
            .expect("Emitting to an empty key should succeed");

        assert_eq!(events.get_stats().await.events_emitted, 0);
    }

    #[tokio::test]
    async fn test_mismatched_payload_is_isolated() {
        let events = EventSystem::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_in_handler = Arc::clone(&seen);
        events
            .on_plugin("controls", "ping", move |_event: ServerTickEvent| {
                seen_in_handler.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        // A chat payload does not deserialize as a tick; the handler is skipped.
        events
            .emit_plugin(
                "controls",
                "ping",
                &PlayerChatEvent {
                    player_id: PlayerId(2),
                    message: "hi".to_string(),
                    channel: "say".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }
}
