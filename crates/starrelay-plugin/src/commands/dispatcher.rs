//! Command dispatcher boundary and the default chat-driven dispatcher.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info, warn};

use starrelay_core::error::ErrorKind;
use starrelay_core::result::AppResult;

use super::error::CommandError;
use super::handler::{CommandHandler, CommandInvocation};
use crate::api::context::HookContext;
use crate::hooks::definitions::{HookAction, HookPoint};
use crate::hooks::table::HookTable;
use crate::registry::{Plugin, PluginDescriptor};

/// Name under which the default dispatcher is loaded as a plugin.
pub const COMMAND_DISPATCHER: &str = "command_dispatcher";

/// Dispatch priority of the default dispatcher. Every other plugin sees
/// outgoing chat before commands are parsed.
pub const COMMAND_DISPATCH_PRIORITY: i32 = i32::MAX;

/// Owner of the command-name → handler table.
pub trait CommandDispatcher: Send + Sync + std::fmt::Debug {
    /// Maps `alias` to the canonical `command`.
    fn register(&self, alias: &str, command: &str) -> Result<(), CommandError>;

    /// Removes an alias. Returns whether it existed.
    fn unregister(&self, alias: &str) -> bool;

    /// Binds a canonical command to its handler.
    fn register_command(
        &self,
        command: &str,
        owner: &str,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), CommandError>;

    /// Removes a canonical command. Returns whether it existed.
    fn unregister_command(&self, command: &str) -> bool;

    /// Lists canonical command names, sorted.
    fn command_names(&self) -> Vec<String>;
}

/// Entry in the command table.
#[derive(Debug, Clone)]
struct CommandEntry {
    /// Plugin that provides the command.
    owner: String,
    /// Bound handler.
    handler: Arc<dyn CommandHandler>,
}

/// Default dispatcher: parses outgoing chat lines that start with the
/// command prefix and routes them to registered commands.
#[derive(Debug)]
pub struct ChatCommandDispatcher {
    descriptor: PluginDescriptor,
    /// Prefix marking a chat line as a command.
    prefix: String,
    /// Canonical command → entry.
    commands: DashMap<String, CommandEntry>,
    /// Alias → canonical command.
    aliases: DashMap<String, String>,
}

impl ChatCommandDispatcher {
    /// Creates a dispatcher recognising lines that start with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            descriptor: PluginDescriptor::new(COMMAND_DISPATCHER)
                .with_description("Routes chat commands to the plugins that provide them.")
                .with_version("1.0")
                .with_priority(COMMAND_DISPATCH_PRIORITY),
            prefix: prefix.into(),
            commands: DashMap::new(),
            aliases: DashMap::new(),
        }
    }

    /// Splits a chat line into command name and arguments.
    pub fn parse(&self, line: &str) -> Option<(String, Vec<String>)> {
        let body = line.trim_start().strip_prefix(self.prefix.as_str())?;
        let mut parts = body.split_whitespace();
        let name = parts.next()?;
        if body.starts_with(char::is_whitespace) {
            return None;
        }
        Some((name.to_string(), parts.map(str::to_string).collect()))
    }

    /// Resolves a typed name (alias or command) to the canonical command and handler.
    pub fn resolve(&self, name: &str) -> Option<(String, Arc<dyn CommandHandler>)> {
        let canonical = self
            .aliases
            .get(name)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| name.to_string());
        let handler = self
            .commands
            .get(&canonical)
            .map(|entry| Arc::clone(&entry.handler))?;
        Some((canonical, handler))
    }

    /// Returns the aliases registered for `command`, sorted.
    pub fn aliases_for(&self, command: &str) -> Vec<String> {
        let mut aliases: Vec<String> = self
            .aliases
            .iter()
            .filter(|entry| entry.value() == command)
            .map(|entry| entry.key().clone())
            .collect();
        aliases.sort();
        aliases
    }

    /// Handles one outgoing chat event.
    pub async fn handle_chat(&self, ctx: &HookContext) -> AppResult<HookAction> {
        let Some(line) = ctx.data.get_string("message") else {
            return Ok(HookAction::Continue);
        };
        let Some((name, args)) = self.parse(line) else {
            return Ok(HookAction::Continue);
        };

        let Some((command, handler)) = self.resolve(&name) else {
            debug!(command = %name, connection = %ctx.connection_id(), "Unknown command");
            ctx.protocol
                .send_message(&format!("Command {}{} not found.", self.prefix, name))
                .await?;
            return Ok(HookAction::Stop);
        };

        info!(
            command = %command,
            alias = %name,
            connection = %ctx.connection_id(),
            "Running chat command"
        );

        let invocation = CommandInvocation {
            command,
            alias: name,
            args,
            context: ctx.clone(),
        };

        match handler.run(&invocation).await {
            Ok(Some(reply)) => invocation.reply(&reply).await?,
            Ok(None) => {}
            Err(e) if e.kind == ErrorKind::Validation => {
                warn!(command = %invocation.command, error = %e, "Command rejected input");
                invocation.reply(&e.message).await?;
            }
            Err(e) => return Err(e),
        }

        Ok(HookAction::Stop)
    }
}

impl Default for ChatCommandDispatcher {
    fn default() -> Self {
        Self::new("/")
    }
}

impl CommandDispatcher for ChatCommandDispatcher {
    fn register(&self, alias: &str, command: &str) -> Result<(), CommandError> {
        match self.aliases.entry(alias.to_string()) {
            Entry::Occupied(existing) => Err(CommandError::DuplicateAlias {
                alias: alias.to_string(),
                existing: existing.get().clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(command.to_string());
                debug!(alias = %alias, command = %command, "Alias registered");
                Ok(())
            }
        }
    }

    fn unregister(&self, alias: &str) -> bool {
        self.aliases.remove(alias).is_some()
    }

    fn register_command(
        &self,
        command: &str,
        owner: &str,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), CommandError> {
        match self.commands.entry(command.to_string()) {
            Entry::Occupied(existing) => Err(CommandError::DuplicateCommand {
                command: command.to_string(),
                owner: existing.get().owner.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(CommandEntry {
                    owner: owner.to_string(),
                    handler,
                });
                debug!(command = %command, plugin = %owner, "Command registered");
                Ok(())
            }
        }
    }

    fn unregister_command(&self, command: &str) -> bool {
        self.commands.remove(command).is_some()
    }

    fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .commands
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl Plugin for ChatCommandDispatcher {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn hooks(self: Arc<Self>) -> HookTable {
        HookTable::builder()
            .on_async(HookPoint::OnChatSent, move |ctx: HookContext| {
                let dispatcher = Arc::clone(&self);
                async move { dispatcher.handle_chat(&ctx).await }
            })
            .build()
    }
}
