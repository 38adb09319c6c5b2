//! Plugin system configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Plugin system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Dormant plugins (`auto_activate = false`) to activate at startup.
    #[serde(default)]
    pub activate: Vec<String>,
    /// Plugins that must not be loaded at all.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Per-handler time budget in milliseconds. No limit when unset.
    #[serde(default)]
    pub hook_timeout_ms: Option<u64>,
    /// Prefix that marks an outgoing chat line as a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

impl PluginConfig {
    /// Returns the configured hook timeout, if any.
    pub fn hook_timeout(&self) -> Option<Duration> {
        self.hook_timeout_ms.map(Duration::from_millis)
    }

    /// Returns whether the named plugin is disabled.
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d == name)
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            activate: Vec::new(),
            disabled: Vec::new(),
            hook_timeout_ms: None,
            command_prefix: default_command_prefix(),
        }
    }
}

fn default_command_prefix() -> String {
    "/".to_string()
}
