//! `SimpleCommandPlugin` — a plugin that exposes named chat commands.
//!
//! Commands are declared by name and bound to typed handlers when the
//! plugin is built. Activation checks that every declared name is bound
//! before anything reaches the dispatcher, then registers the commands
//! and their aliases.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{error, info};

use starrelay_core::result::AppResult;

use super::dispatcher::{COMMAND_DISPATCHER, CommandDispatcher};
use super::error::CommandError;
use super::handler::{CommandHandler, IntoCommandHandler};
use crate::api::activation::ActivationContext;
use crate::api::context::HookContext;
use crate::hooks::definitions::HookPoint;
use crate::hooks::table::HookTable;
use crate::registry::{Plugin, PluginDescriptor};
use crate::traits::{FnHandler, IntoHookHandler};

/// What this plugin put into the dispatcher.
#[derive(Debug, Default)]
struct Registration {
    commands: Vec<String>,
    aliases: Vec<String>,
}

/// A plugin providing chat commands.
#[derive(Debug)]
pub struct SimpleCommandPlugin {
    descriptor: PluginDescriptor,
    /// Declared command names.
    commands: Vec<String>,
    /// Command name → bound handler.
    bound: HashMap<String, Arc<dyn CommandHandler>>,
    /// Canonical command → aliases.
    command_aliases: BTreeMap<String, Vec<String>>,
    /// Hooks the plugin overrides.
    hooks: HookTable,
    /// Entries currently registered with the dispatcher.
    registered: Mutex<Registration>,
}

impl SimpleCommandPlugin {
    /// Starts building a command plugin.
    pub fn builder(descriptor: PluginDescriptor) -> SimpleCommandPluginBuilder {
        SimpleCommandPluginBuilder {
            descriptor,
            commands: Vec::new(),
            bound: HashMap::new(),
            command_aliases: BTreeMap::new(),
            hooks: HookTable::new(),
        }
    }

    /// Declared command names.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Canonical command → aliases.
    pub fn command_aliases(&self) -> &BTreeMap<String, Vec<String>> {
        &self.command_aliases
    }

    /// Checks that every declared command has a bound handler.
    pub fn validate_commands(&self) -> Result<(), CommandError> {
        match self.commands.iter().find(|name| !self.bound.contains_key(*name)) {
            Some(name) => Err(CommandError::CommandName {
                plugin: self.descriptor.name.clone(),
                name: name.clone(),
            }),
            None => Ok(()),
        }
    }

    fn register_all(
        &self,
        dispatcher: &dyn CommandDispatcher,
        registration: &mut Registration,
    ) -> Result<(), CommandError> {
        for command in &self.commands {
            if let Some(handler) = self.bound.get(command) {
                dispatcher.register_command(command, &self.descriptor.name, Arc::clone(handler))?;
                registration.commands.push(command.clone());
            }
        }

        for (command, aliases) in &self.command_aliases {
            for alias in aliases {
                dispatcher.register(alias, command)?;
                registration.aliases.push(alias.clone());
            }
        }

        Ok(())
    }

    fn release(dispatcher: &dyn CommandDispatcher, registration: &Registration) {
        for alias in &registration.aliases {
            dispatcher.unregister(alias);
        }
        for command in &registration.commands {
            dispatcher.unregister_command(command);
        }
    }
}

#[async_trait]
impl Plugin for SimpleCommandPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn activate(&self, ctx: &ActivationContext) -> AppResult<()> {
        if let Err(e) = self.validate_commands() {
            error!(plugin = %self.descriptor.name, error = %e, "Command validation failed");
            return Err(e.into());
        }

        let dispatcher = ctx.command_dispatcher();
        let mut registration = Registration::default();

        if let Err(e) = self.register_all(dispatcher.as_ref(), &mut registration) {
            error!(plugin = %self.descriptor.name, error = %e, "Command registration failed");
            Self::release(dispatcher.as_ref(), &registration);
            return Err(e.into());
        }

        info!(
            plugin = %self.descriptor.name,
            commands = registration.commands.len(),
            aliases = registration.aliases.len(),
            "Commands registered"
        );

        *self.registered.lock().unwrap_or_else(|e| e.into_inner()) = registration;
        Ok(())
    }

    async fn deactivate(&self, ctx: &ActivationContext) -> AppResult<()> {
        let registration =
            std::mem::take(&mut *self.registered.lock().unwrap_or_else(|e| e.into_inner()));
        Self::release(ctx.command_dispatcher().as_ref(), &registration);
        Ok(())
    }

    fn hooks(self: Arc<Self>) -> HookTable {
        self.hooks.clone()
    }
}

/// Builder for [`SimpleCommandPlugin`].
#[derive(Debug)]
pub struct SimpleCommandPluginBuilder {
    descriptor: PluginDescriptor,
    commands: Vec<String>,
    bound: HashMap<String, Arc<dyn CommandHandler>>,
    command_aliases: BTreeMap<String, Vec<String>>,
    hooks: HookTable,
}

impl SimpleCommandPluginBuilder {
    /// Declares a command name.
    pub fn command(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.commands.contains(&name) {
            self.commands.push(name);
        }
        self
    }

    /// Binds a handler to a command name.
    pub fn bind(mut self, name: impl Into<String>, handler: impl IntoCommandHandler) -> Self {
        self.bound.insert(name.into(), handler.into_command_handler());
        self
    }

    /// Declares a command and binds its handler in one step.
    pub fn command_with(self, name: impl Into<String>, handler: impl IntoCommandHandler) -> Self {
        let name = name.into();
        self.command(name.clone()).bind(name, handler)
    }

    /// Adds aliases for a canonical command.
    pub fn alias<I, S>(mut self, command: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command_aliases
            .entry(command.into())
            .or_default()
            .extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Overrides the outgoing-chat hook, which runs before commands are parsed.
    pub fn on_chat_sent(mut self, handler: impl IntoHookHandler) -> Self {
        self.hooks.insert(HookPoint::OnChatSent, handler);
        self
    }

    /// Overrides any other hook.
    pub fn hook(mut self, hook: HookPoint, handler: impl IntoHookHandler) -> Self {
        self.hooks.insert(hook, handler);
        self
    }

    /// Builds the plugin. It depends on the command dispatcher plugin, so
    /// the dispatcher cannot be deactivated while the commands are live.
    pub fn build(mut self) -> SimpleCommandPlugin {
        if !self.descriptor.depends.iter().any(|dep| dep == COMMAND_DISPATCHER) {
            self.descriptor.depends.push(COMMAND_DISPATCHER.to_string());
        }
        self.hooks.insert_default(
            HookPoint::OnChatSent,
            FnHandler::from_sync(|_ctx: &HookContext| ()),
        );

        SimpleCommandPlugin {
            descriptor: self.descriptor,
            commands: self.commands,
            bound: self.bound,
            command_aliases: self.command_aliases,
            hooks: self.hooks,
            registered: Mutex::new(Registration::default()),
        }
    }
}
