//! Context handed to `activate()` / `deactivate()`.

use std::sync::Arc;

use starrelay_core::config::plugin::PluginConfig;

use crate::commands::dispatcher::CommandDispatcher;
use crate::registry::{Plugin, PluginRegistry, PluginState};

/// Collaborators a plugin may reach while activating or deactivating.
#[derive(Debug, Clone)]
pub struct ActivationContext {
    /// Command dispatcher shared by all command plugins.
    commands: Arc<dyn CommandDispatcher>,
    /// Every loaded plugin.
    plugins: Arc<PluginRegistry>,
    /// Plugin system settings.
    config: Arc<PluginConfig>,
}

impl ActivationContext {
    /// Creates a new activation context.
    pub fn new(
        commands: Arc<dyn CommandDispatcher>,
        plugins: Arc<PluginRegistry>,
        config: Arc<PluginConfig>,
    ) -> Self {
        Self {
            commands,
            plugins,
            config,
        }
    }

    /// Context with only a command dispatcher, for activating a plugin in isolation.
    pub fn for_dispatcher(commands: Arc<dyn CommandDispatcher>) -> Self {
        Self::new(
            commands,
            Arc::new(PluginRegistry::new()),
            Arc::new(PluginConfig::default()),
        )
    }

    /// Returns the command dispatcher.
    pub fn command_dispatcher(&self) -> &Arc<dyn CommandDispatcher> {
        &self.commands
    }

    /// Looks up another loaded plugin by name.
    pub async fn plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(name).await
    }

    /// Returns the lifecycle state of another plugin.
    pub async fn plugin_state(&self, name: &str) -> Option<PluginState> {
        self.plugins.state(name).await
    }

    /// Returns the plugin system settings.
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }
}
