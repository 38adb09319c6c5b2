//! Plugin manager — lifecycle management for all plugins.
//!
//! Plugins are loaded in any order, then activated in dependency order.
//! Lifecycle operations are serialized; only one activation or
//! deactivation runs at a time.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use starrelay_core::config::plugin::PluginConfig;
use starrelay_core::error::AppError;
use starrelay_core::result::AppResult;

use crate::api::activation::ActivationContext;
use crate::commands::dispatcher::{ChatCommandDispatcher, CommandDispatcher};
use crate::hooks::dispatcher::HookDispatcher;
use crate::hooks::registry::HookRegistry;
use crate::registry::{Plugin, PluginInfo, PluginRegistry, PluginState};

/// Manages the full lifecycle of plugins: load, activate, deactivate.
#[derive(Debug)]
pub struct PluginManager {
    /// Plugin system settings.
    config: Arc<PluginConfig>,
    /// Plugin registry.
    plugin_registry: Arc<PluginRegistry>,
    /// Hook registry.
    hook_registry: Arc<HookRegistry>,
    /// Hook dispatcher.
    hook_dispatcher: Arc<HookDispatcher>,
    /// Command dispatcher handed to plugins on activation.
    commands: Arc<dyn CommandDispatcher>,
    /// Names of active plugins in activation order. Held for the whole
    /// of every lifecycle operation.
    lifecycle: Mutex<Vec<String>>,
}

impl PluginManager {
    /// Creates a new plugin manager around an existing command dispatcher.
    pub fn new(config: PluginConfig, commands: Arc<dyn CommandDispatcher>) -> Self {
        let hook_registry = Arc::new(HookRegistry::new());
        let hook_dispatcher = Arc::new(
            HookDispatcher::new(Arc::clone(&hook_registry)).with_timeout(config.hook_timeout()),
        );

        Self {
            config: Arc::new(config),
            plugin_registry: Arc::new(PluginRegistry::new()),
            hook_registry,
            hook_dispatcher,
            commands,
            lifecycle: Mutex::new(Vec::new()),
        }
    }

    /// Creates a manager with the default chat command dispatcher already loaded.
    pub async fn with_chat_dispatcher(config: PluginConfig) -> AppResult<Self> {
        let dispatcher = Arc::new(ChatCommandDispatcher::new(config.command_prefix.clone()));
        let manager = Self::new(config, dispatcher.clone());
        manager.load(dispatcher).await?;
        Ok(manager)
    }

    /// Loads a plugin. It stays dormant until activated.
    pub async fn load(&self, plugin: Arc<dyn Plugin>) -> AppResult<()> {
        self.plugin_registry.register(plugin).await
    }

    /// Computes the activation order of every loaded plugin.
    ///
    /// Dependencies come before their dependents; otherwise load order is kept.
    pub async fn resolve_order(&self) -> AppResult<Vec<String>> {
        let infos = self.plugin_registry.list().await;
        let index: HashMap<&str, usize> = infos
            .iter()
            .enumerate()
            .map(|(i, info)| (info.descriptor.name.as_str(), i))
            .collect();

        let mut missing = Vec::new();
        for info in &infos {
            for dep in &info.descriptor.depends {
                if !index.contains_key(dep.as_str()) {
                    missing.push(format!("'{}' requires '{}'", info.descriptor.name, dep));
                }
            }
        }
        if !missing.is_empty() {
            return Err(AppError::dependency(format!(
                "missing plugin dependencies: {}",
                missing.join(", ")
            )));
        }

        let mut pending: Vec<usize> = infos
            .iter()
            .map(|info| info.descriptor.depends.len())
            .collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); infos.len()];
        for (i, info) in infos.iter().enumerate() {
            for dep in &info.descriptor.depends {
                dependents[index[dep.as_str()]].push(i);
            }
        }

        let mut ready: BTreeSet<usize> = (0..infos.len()).filter(|&i| pending[i] == 0).collect();
        let mut order = Vec::with_capacity(infos.len());

        while let Some(next) = ready.pop_first() {
            order.push(infos[next].descriptor.name.clone());
            for &dependent in &dependents[next] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() < infos.len() {
            let stuck: Vec<&str> = infos
                .iter()
                .enumerate()
                .filter(|(i, _)| pending[*i] > 0)
                .map(|(_, info)| info.descriptor.name.as_str())
                .collect();
            return Err(AppError::dependency(format!(
                "dependency cycle between plugins: {}",
                stuck.join(", ")
            )));
        }

        Ok(order)
    }

    /// Activates every auto-activating plugin and every plugin listed in
    /// `plugins.activate`, dependencies first.
    pub async fn activate_all(&self) -> AppResult<()> {
        let mut active = self.lifecycle.lock().await;
        let order = self.resolve_order().await?;

        let mut requested = Vec::new();
        for info in self.plugin_registry.list().await {
            if info.descriptor.auto_activate {
                requested.push(info.descriptor.name);
            } else if !self.config.activate.contains(&info.descriptor.name) {
                info!(plugin = %info.descriptor.name, "Plugin left dormant");
            }
        }
        for name in &self.config.activate {
            if !self.plugin_registry.contains(name).await {
                return Err(AppError::not_found(format!(
                    "plugin '{name}' is configured for activation but not loaded"
                )));
            }
            requested.push(name.clone());
        }

        let wanted = self.with_dependencies(&requested).await;
        for name in order.iter().filter(|name| wanted.contains(*name)) {
            self.activate_one(name, &mut active).await?;
        }

        info!(active = active.len(), "Plugins activated");
        Ok(())
    }

    /// Activates one plugin, and the plugins it depends on.
    pub async fn activate(&self, name: &str) -> AppResult<()> {
        let mut active = self.lifecycle.lock().await;

        if !self.plugin_registry.contains(name).await {
            return Err(AppError::not_found(format!("plugin '{name}' is not loaded")));
        }

        let order = self.resolve_order().await?;
        let wanted = self.with_dependencies(&[name.to_string()]).await;
        for name in order.iter().filter(|name| wanted.contains(*name)) {
            self.activate_one(name, &mut active).await?;
        }

        Ok(())
    }

    /// Deactivates one plugin. Refused while an active plugin depends on it.
    pub async fn deactivate(&self, name: &str) -> AppResult<()> {
        let mut active = self.lifecycle.lock().await;

        match self.plugin_registry.state(name).await {
            None => return Err(AppError::not_found(format!("plugin '{name}' is not loaded"))),
            Some(PluginState::Active) => {}
            Some(state) => {
                return Err(AppError::conflict(format!(
                    "plugin '{name}' is {state}, not active"
                )));
            }
        }

        let mut dependents = Vec::new();
        for other in active.iter() {
            let Some(plugin) = self.plugin_registry.get(other).await else {
                continue;
            };
            if plugin.descriptor().depends.iter().any(|dep| dep == name) {
                dependents.push(other.clone());
            }
        }
        if !dependents.is_empty() {
            return Err(AppError::conflict(format!(
                "plugin '{name}' is required by active plugins: {}",
                dependents.join(", ")
            )));
        }

        self.deactivate_one(name, &mut active).await
    }

    /// Deactivates every active plugin in reverse activation order.
    ///
    /// Failures are logged and do not stop the remaining plugins.
    pub async fn deactivate_all(&self) -> AppResult<()> {
        let mut active = self.lifecycle.lock().await;
        let names: Vec<String> = active.iter().rev().cloned().collect();

        for name in &names {
            if let Err(e) = self.deactivate_one(name, &mut active).await {
                error!(plugin = %name, error = %e, "Error deactivating plugin");
            }
        }

        info!("All plugins deactivated");
        Ok(())
    }

    /// Returns the lifecycle state of a plugin.
    pub async fn state(&self, name: &str) -> Option<PluginState> {
        self.plugin_registry.state(name).await
    }

    /// Gets a loaded plugin by name.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugin_registry.get(name).await
    }

    /// Lists all loaded plugins in load order.
    pub async fn list(&self) -> Vec<PluginInfo> {
        self.plugin_registry.list().await
    }

    /// Names of active plugins in activation order.
    pub async fn activation_order(&self) -> Vec<String> {
        self.lifecycle.lock().await.clone()
    }

    /// Returns the hook dispatcher for firing hooks.
    pub fn dispatcher(&self) -> &Arc<HookDispatcher> {
        &self.hook_dispatcher
    }

    /// Returns the hook registry.
    pub fn hook_registry(&self) -> &Arc<HookRegistry> {
        &self.hook_registry
    }

    /// Returns the plugin registry.
    pub fn plugin_registry(&self) -> &Arc<PluginRegistry> {
        &self.plugin_registry
    }

    /// Returns the command dispatcher.
    pub fn command_dispatcher(&self) -> &Arc<dyn CommandDispatcher> {
        &self.commands
    }

    /// Returns the plugin system settings.
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    fn activation_context(&self) -> ActivationContext {
        ActivationContext::new(
            Arc::clone(&self.commands),
            Arc::clone(&self.plugin_registry),
            Arc::clone(&self.config),
        )
    }

    /// Expands `names` with everything they transitively depend on.
    async fn with_dependencies(&self, names: &[String]) -> HashSet<String> {
        let mut wanted = HashSet::new();
        let mut stack: Vec<String> = names.to_vec();

        while let Some(name) = stack.pop() {
            if !wanted.insert(name.clone()) {
                continue;
            }
            if let Some(plugin) = self.plugin_registry.get(&name).await {
                stack.extend(plugin.descriptor().depends.iter().cloned());
            }
        }

        wanted
    }

    async fn activate_one(&self, name: &str, active: &mut Vec<String>) -> AppResult<()> {
        let plugin = self
            .plugin_registry
            .get(name)
            .await
            .ok_or_else(|| AppError::not_found(format!("plugin '{name}' is not loaded")))?;
        let descriptor = plugin.descriptor().clone();

        match self.plugin_registry.state(name).await {
            Some(PluginState::Active) => return Ok(()),
            Some(PluginState::Loaded) => {}
            Some(state) => {
                return Err(AppError::conflict(format!(
                    "plugin '{name}' is {state} and cannot be activated"
                )));
            }
            None => return Err(AppError::not_found(format!("plugin '{name}' is not loaded"))),
        }

        for dep in &descriptor.depends {
            if self.plugin_registry.state(dep).await != Some(PluginState::Active) {
                return Err(AppError::dependency(format!(
                    "plugin '{name}' requires '{dep}', which is not active"
                )));
            }
        }

        self.plugin_registry
            .set_state(name, PluginState::Activating)
            .await?;

        if let Err(e) = plugin.activate(&self.activation_context()).await {
            error!(plugin = %name, error = %e, "Plugin activation failed");
            self.plugin_registry
                .set_state(name, PluginState::Failed)
                .await?;
            return Err(e);
        }

        let hooks = Arc::clone(&plugin).hooks();
        self.hook_registry
            .install(name, descriptor.priority, &hooks)
            .await;
        self.plugin_registry
            .set_state(name, PluginState::Active)
            .await?;
        active.push(name.to_string());

        info!(
            plugin = %name,
            version = %descriptor.version,
            hooks = hooks.len(),
            priority = descriptor.priority,
            "Plugin activated"
        );

        Ok(())
    }

    async fn deactivate_one(&self, name: &str, active: &mut Vec<String>) -> AppResult<()> {
        let plugin = self
            .plugin_registry
            .get(name)
            .await
            .ok_or_else(|| AppError::not_found(format!("plugin '{name}' is not loaded")))?;

        self.plugin_registry
            .set_state(name, PluginState::Deactivating)
            .await?;
        self.hook_registry.unregister_plugin(name).await;
        active.retain(|n| n != name);

        let result = plugin.deactivate(&self.activation_context()).await;

        self.plugin_registry
            .set_state(name, PluginState::Inactive)
            .await?;

        match result {
            Ok(()) => {
                info!(plugin = %name, "Plugin deactivated");
                Ok(())
            }
            Err(e) => {
                warn!(plugin = %name, error = %e, "Plugin deactivate returned error");
                Err(e)
            }
        }
    }
}
