//! Command registration and resolution errors.

use thiserror::Error;

use starrelay_core::error::{AppError, ErrorKind};

/// Errors raised while wiring or resolving chat commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// A declared command has no bound handler on the plugin.
    #[error("plugin '{plugin}': could not find a method called {name}")]
    CommandName {
        /// Plugin declaring the command.
        plugin: String,
        /// The command name that did not resolve.
        name: String,
    },

    /// The alias is already mapped to a command.
    #[error("alias '{alias}' is already registered for command '{existing}'")]
    DuplicateAlias {
        /// Alias being registered.
        alias: String,
        /// Command the alias already points to.
        existing: String,
    },

    /// Another plugin already provides the command.
    #[error("command '{command}' is already provided by plugin '{owner}'")]
    DuplicateCommand {
        /// Command being registered.
        command: String,
        /// Plugin that registered it first.
        owner: String,
    },

    /// No command or alias with this name exists.
    #[error("command '{0}' not found")]
    UnknownCommand(String),
}

impl CommandError {
    /// Returns the offending command name for a `CommandName` error.
    pub fn missing_command(&self) -> Option<&str> {
        match self {
            Self::CommandName { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        AppError::with_source(ErrorKind::Command, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_name_message_names_plugin_and_method() {
        let err = CommandError::CommandName {
            plugin: "warps".to_string(),
            name: "warp".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "plugin 'warps': could not find a method called warp"
        );
        assert_eq!(err.missing_command(), Some("warp"));

        let app: AppError = err.into();
        assert_eq!(app.kind, ErrorKind::Command);
    }
}
