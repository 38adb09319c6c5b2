//! In-memory stand-ins for the transport layer and the command dispatcher,
//! for development and testing.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use starrelay_core::result::AppResult;
use starrelay_core::types::id::ConnectionId;

use crate::api::context::Protocol;
use crate::commands::dispatcher::{COMMAND_DISPATCHER, CommandDispatcher};
use crate::commands::error::CommandError;
use crate::commands::handler::CommandHandler;
use crate::registry::{Plugin, PluginDescriptor};

/// Connection handle that records every message sent to it.
#[derive(Debug)]
pub struct MockProtocol {
    /// Connection identifier.
    id: ConnectionId,
    /// Player name.
    player: String,
    /// Messages sent to the client.
    sent: Mutex<Vec<String>>,
}

impl MockProtocol {
    /// Creates a mock connection for `player`.
    pub fn new(player: &str) -> Self {
        Self {
            id: ConnectionId::new(),
            player: player.to_string(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Messages sent so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Protocol for MockProtocol {
    fn connection_id(&self) -> ConnectionId {
        self.id
    }

    fn player_name(&self) -> Option<String> {
        Some(self.player.clone())
    }

    async fn send_message(&self, message: &str) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
        Ok(())
    }
}

/// Command dispatcher that records every call it receives.
///
/// Loadable as the `command_dispatcher` plugin that command plugins depend on.
#[derive(Debug)]
pub struct RecordingDispatcher {
    descriptor: PluginDescriptor,
    /// Every `register` call, in order, including rejected ones.
    calls: Mutex<Vec<(String, String)>>,
    /// Alias → command.
    aliases: Mutex<BTreeMap<String, String>>,
    /// Command → owner.
    commands: Mutex<BTreeMap<String, String>>,
}

impl Default for RecordingDispatcher {
    fn default() -> Self {
        Self {
            descriptor: PluginDescriptor::new(COMMAND_DISPATCHER)
                .with_description("Records command registrations."),
            calls: Mutex::default(),
            aliases: Mutex::default(),
            commands: Mutex::default(),
        }
    }
}

impl RecordingDispatcher {
    /// Creates an empty recording dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(alias, command)` passed to `register`.
    pub fn register_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Aliases currently registered, sorted.
    pub fn registered_aliases(&self) -> Vec<String> {
        let aliases = self.aliases.lock().unwrap_or_else(|e| e.into_inner());
        aliases.keys().cloned().collect()
    }

    /// Commands currently registered, sorted.
    pub fn registered_commands(&self) -> Vec<String> {
        let commands = self.commands.lock().unwrap_or_else(|e| e.into_inner());
        commands.keys().cloned().collect()
    }
}

impl CommandDispatcher for RecordingDispatcher {
    fn register(&self, alias: &str, command: &str) -> Result<(), CommandError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((alias.to_string(), command.to_string()));

        let mut aliases = self.aliases.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = aliases.get(alias) {
            return Err(CommandError::DuplicateAlias {
                alias: alias.to_string(),
                existing: existing.clone(),
            });
        }
        aliases.insert(alias.to_string(), command.to_string());
        Ok(())
    }

    fn unregister(&self, alias: &str) -> bool {
        let mut aliases = self.aliases.lock().unwrap_or_else(|e| e.into_inner());
        aliases.remove(alias).is_some()
    }

    fn register_command(
        &self,
        command: &str,
        owner: &str,
        _handler: Arc<dyn CommandHandler>,
    ) -> Result<(), CommandError> {
        let mut commands = self.commands.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = commands.get(command) {
            return Err(CommandError::DuplicateCommand {
                command: command.to_string(),
                owner: existing.clone(),
            });
        }
        commands.insert(command.to_string(), owner.to_string());
        Ok(())
    }

    fn unregister_command(&self, command: &str) -> bool {
        let mut commands = self.commands.lock().unwrap_or_else(|e| e.into_inner());
        commands.remove(command).is_some()
    }

    fn command_names(&self) -> Vec<String> {
        self.registered_commands()
    }
}

#[async_trait]
impl Plugin for RecordingDispatcher {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }
}
