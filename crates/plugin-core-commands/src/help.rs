//! The `/help` command.

use std::sync::Arc;

use starrelay_plugin::commands::dispatcher::CommandDispatcher;
use starrelay_plugin::commands::handler::{CommandInvocation, FnCommand};
use starrelay_plugin::commands::simple::SimpleCommandPlugin;
use starrelay_plugin::registry::PluginDescriptor;

/// Plugin name.
pub const NAME: &str = "help";

/// Builds the `help` plugin. It lists whatever `commands` holds at the
/// time it is asked, so commands registered later are included.
pub fn help_plugin(commands: Arc<dyn CommandDispatcher>, prefix: &str) -> SimpleCommandPlugin {
    let prefix = prefix.to_string();

    SimpleCommandPlugin::builder(
        PluginDescriptor::new(NAME)
            .with_description("Lists the available chat commands.")
            .with_version("1.0"),
    )
    .command_with(
        "help",
        FnCommand::from_sync(move |_inv: &CommandInvocation| {
            let names: Vec<String> = commands
                .command_names()
                .into_iter()
                .map(|name| format!("{prefix}{name}"))
                .collect();
            format!("Available commands: {}", names.join(", "))
        }),
    )
    .alias("help", ["?", "commands"])
    .build()
}
