//! Hook registry — active plugins' handlers by hook point, in priority order.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::definitions::HookPoint;
use super::table::HookTable;
use crate::traits::HookHandler;

/// Handler together with the plugin that owns it.
#[derive(Debug, Clone)]
pub struct RegisteredHandler {
    /// Owning plugin name.
    pub plugin: String,
    /// Priority (lower = earlier execution).
    pub priority: i32,
    /// The normalized handler.
    pub handler: Arc<dyn HookHandler>,
}

/// Entry in the hook registry.
#[derive(Debug)]
struct HookEntry {
    /// Handler and owner.
    registered: RegisteredHandler,
    /// Registration sequence, breaks priority ties.
    seq: u64,
}

/// Registry of hook handlers organized by hook point.
#[derive(Debug, Default)]
pub struct HookRegistry {
    /// Hook point → sorted list of handlers.
    handlers: RwLock<HashMap<HookPoint, Vec<HookEntry>>>,
    /// Monotonic registration counter.
    next_seq: AtomicU64,
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for a specific hook point.
    pub async fn register(
        &self,
        hook: HookPoint,
        plugin: &str,
        priority: i32,
        handler: Arc<dyn HookHandler>,
    ) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut handlers = self.handlers.write().await;
        let entries = handlers.entry(hook).or_default();

        entries.push(HookEntry {
            registered: RegisteredHandler {
                plugin: plugin.to_string(),
                priority,
                handler,
            },
            seq,
        });
        entries.sort_by_key(|e| (e.registered.priority, e.seq));

        debug!(hook = %hook, plugin = %plugin, priority, "Hook handler registered");
    }

    /// Registers every handler of a plugin's hook table.
    pub async fn install(&self, plugin: &str, priority: i32, table: &HookTable) {
        for (hook, handler) in table.iter() {
            self.register(hook, plugin, priority, Arc::clone(handler))
                .await;
        }

        info!(plugin = %plugin, hooks = table.len(), "Hook table installed");
    }

    /// Unregisters all handlers for a specific plugin.
    pub async fn unregister_plugin(&self, plugin: &str) {
        let mut handlers = self.handlers.write().await;

        for entries in handlers.values_mut() {
            entries.retain(|e| e.registered.plugin != plugin);
        }

        handlers.retain(|_, entries| !entries.is_empty());

        info!(plugin = %plugin, "All hooks unregistered for plugin");
    }

    /// Returns all handlers for a specific hook point, sorted by priority.
    pub async fn get_handlers(&self, hook: HookPoint) -> Vec<RegisteredHandler> {
        let handlers = self.handlers.read().await;
        handlers
            .get(&hook)
            .map(|entries| entries.iter().map(|e| e.registered.clone()).collect())
            .unwrap_or_default()
    }

    /// Returns the number of handlers registered for a hook point.
    pub async fn handler_count(&self, hook: HookPoint) -> usize {
        let handlers = self.handlers.read().await;
        handlers.get(&hook).map(|entries| entries.len()).unwrap_or(0)
    }

    /// Returns all hook points with at least one handler.
    pub async fn registered_hooks(&self) -> Vec<HookPoint> {
        let handlers = self.handlers.read().await;
        let mut hooks: Vec<HookPoint> = handlers.keys().copied().collect();
        hooks.sort();
        hooks
    }
}
