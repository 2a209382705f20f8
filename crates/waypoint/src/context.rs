//! The [`ServerContext`] handed to plugins by the reference host.

use crate::world::SimulatedWorld;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};
use waypoint_events::{LogLevel, ServerContext, WorldAccess};

/// Routes plugin logging into `tracing` and exposes the simulated world.
pub struct HostContext {
    world: Arc<SimulatedWorld>,
}

impl HostContext {
    pub fn new(world: Arc<SimulatedWorld>) -> Self {
        Self { world }
    }
}

impl ServerContext for HostContext {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => error!(target: "plugin", "{}", message),
            LogLevel::Warn => warn!(target: "plugin", "{}", message),
            LogLevel::Info => info!(target: "plugin", "{}", message),
            LogLevel::Debug => debug!(target: "plugin", "{}", message),
            LogLevel::Trace => trace!(target: "plugin", "{}", message),
        }
    }

    fn world(&self) -> Arc<dyn WorldAccess> {
        self.world.clone()
    }
}
