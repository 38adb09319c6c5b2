//! Plugin registry — plugin descriptors, the `Plugin` trait, and loaded instances.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use starrelay_core::error::AppError;
use starrelay_core::result::AppResult;

use crate::api::activation::ActivationContext;
use crate::hooks::table::HookTable;

/// Default priority for plugins that do not set one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Static description of a plugin type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Unique plugin name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Free-form version string.
    pub version: String,
    /// Plugins that must be active before this one activates.
    pub depends: Vec<String>,
    /// Whether the manager activates this plugin without being asked.
    pub auto_activate: bool,
    /// Dispatch priority (lower = sees events first).
    pub priority: i32,
}

impl PluginDescriptor {
    /// Creates a descriptor with default metadata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: "0.1".to_string(),
            depends: Vec::new(),
            auto_activate: true,
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Adds a dependency.
    pub fn depends_on(mut self, plugin: impl Into<String>) -> Self {
        self.depends.push(plugin.into());
        self
    }

    /// Sets whether the plugin activates automatically.
    pub fn with_auto_activate(mut self, auto_activate: bool) -> Self {
        self.auto_activate = auto_activate;
        self
    }

    /// Sets the dispatch priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Checks that the plugin has a usable identity.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("plugin name must not be empty"));
        }
        if self.name.trim() != self.name {
            return Err(AppError::validation(format!(
                "plugin name '{}' must not have surrounding whitespace",
                self.name
            )));
        }
        if self.depends.iter().any(|dep| dep == &self.name) {
            return Err(AppError::dependency(format!(
                "plugin '{}' depends on itself",
                self.name
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (version {})", self.name, self.version)
    }
}

/// Lifecycle state of a plugin instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    /// Instantiated and registered, not yet activated.
    Loaded,
    /// `activate()` is running.
    Activating,
    /// Receiving events.
    Active,
    /// `deactivate()` is running.
    Deactivating,
    /// Deactivated; the instance will not be activated again.
    Inactive,
    /// `activate()` failed; the instance never became active.
    Failed,
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Loaded => "loaded",
            Self::Activating => "activating",
            Self::Active => "active",
            Self::Deactivating => "deactivating",
            Self::Inactive => "inactive",
            Self::Failed => "failed",
        };
        f.pad(name)
    }
}

/// Trait that all plugins must implement.
///
/// Exactly one instance of each plugin exists per process and it is shared
/// by every connection. State that belongs to a single client must be kept
/// in a [`ConnectionState`](crate::api::context::ConnectionState) map.
#[async_trait::async_trait]
pub trait Plugin: Send + Sync + std::fmt::Debug {
    /// Returns plugin metadata.
    fn descriptor(&self) -> &PluginDescriptor;

    /// Called once, after every dependency is active.
    async fn activate(&self, _ctx: &ActivationContext) -> AppResult<()> {
        Ok(())
    }

    /// Called once when the plugin is unloaded or the relay shuts down.
    async fn deactivate(&self, _ctx: &ActivationContext) -> AppResult<()> {
        Ok(())
    }

    /// Returns the hooks this plugin overrides.
    fn hooks(self: Arc<Self>) -> HookTable {
        HookTable::new()
    }
}

/// Snapshot of a loaded plugin for listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Plugin descriptor.
    #[serde(flatten)]
    pub descriptor: PluginDescriptor,
    /// Current lifecycle state.
    pub state: PluginState,
}

impl std::fmt::Display for PluginInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.descriptor, self.state)
    }
}

/// Entry in the plugin registry.
#[derive(Debug)]
struct PluginEntry {
    /// The plugin instance.
    plugin: Arc<dyn Plugin>,
    /// Current lifecycle state.
    state: PluginState,
    /// Position in load order.
    load_index: usize,
}

/// Registry of all loaded plugins.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    /// Plugin name → entry.
    plugins: RwLock<HashMap<String, PluginEntry>>,
}

impl PluginRegistry {
    /// Creates a new empty plugin registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin in the `Loaded` state.
    pub async fn register(&self, plugin: Arc<dyn Plugin>) -> AppResult<()> {
        let descriptor = plugin.descriptor();
        descriptor.validate()?;
        let name = descriptor.name.clone();

        let mut plugins = self.plugins.write().await;

        if plugins.contains_key(&name) {
            return Err(AppError::conflict(format!(
                "plugin '{name}' is already loaded"
            )));
        }

        info!(
            plugin = %name,
            version = %descriptor.version,
            auto_activate = descriptor.auto_activate,
            "Registering plugin"
        );

        let load_index = plugins.len();
        plugins.insert(
            name,
            PluginEntry {
                plugin,
                state: PluginState::Loaded,
                load_index,
            },
        );

        Ok(())
    }

    /// Gets a plugin by name.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        let plugins = self.plugins.read().await;
        plugins.get(name).map(|entry| Arc::clone(&entry.plugin))
    }

    /// Returns the state of a plugin.
    pub async fn state(&self, name: &str) -> Option<PluginState> {
        let plugins = self.plugins.read().await;
        plugins.get(name).map(|entry| entry.state)
    }

    /// Moves a plugin to a new state.
    pub async fn set_state(&self, name: &str, state: PluginState) -> AppResult<()> {
        let mut plugins = self.plugins.write().await;
        let entry = plugins
            .get_mut(name)
            .ok_or_else(|| AppError::not_found(format!("plugin '{name}' is not loaded")))?;
        entry.state = state;
        Ok(())
    }

    /// Returns every plugin in load order.
    pub async fn all_plugins(&self) -> Vec<Arc<dyn Plugin>> {
        let plugins = self.plugins.read().await;
        let mut entries: Vec<&PluginEntry> = plugins.values().collect();
        entries.sort_by_key(|entry| entry.load_index);
        entries
            .into_iter()
            .map(|entry| Arc::clone(&entry.plugin))
            .collect()
    }

    /// Lists all loaded plugins in load order.
    pub async fn list(&self) -> Vec<PluginInfo> {
        let plugins = self.plugins.read().await;
        let mut entries: Vec<&PluginEntry> = plugins.values().collect();
        entries.sort_by_key(|entry| entry.load_index);
        entries
            .into_iter()
            .map(|entry| PluginInfo {
                descriptor: entry.plugin.descriptor().clone(),
                state: entry.state,
            })
            .collect()
    }

    /// Returns plugin count.
    pub async fn count(&self) -> usize {
        let plugins = self.plugins.read().await;
        plugins.len()
    }

    /// Checks whether a plugin is loaded.
    pub async fn contains(&self, name: &str) -> bool {
        let plugins = self.plugins.read().await;
        plugins.contains_key(name)
    }
}
