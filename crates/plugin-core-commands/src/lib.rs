//! Built-in plugins shipped with StarRelay.
//!
//! - `players` keeps a roster of connected players and answers `/who`
//! - `help` lists every registered chat command
//! - `motd` greets new connections; dormant unless configured

pub mod help;
pub mod motd;
pub mod players;

use std::sync::Arc;

use starrelay_plugin::commands::dispatcher::CommandDispatcher;
use starrelay_plugin::registry::Plugin;

pub use help::help_plugin;
pub use motd::MotdPlugin;
pub use players::{Roster, players_plugin};

/// Greeting used by the built-in `motd` plugin.
pub const DEFAULT_MOTD: &str = "Welcome to StarRelay.";

/// Instantiates every built-in plugin, in load order.
pub fn builtin_plugins(commands: Arc<dyn CommandDispatcher>, prefix: &str) -> Vec<Arc<dyn Plugin>> {
    let roster = Arc::new(Roster::new());

    vec![
        Arc::new(players_plugin(Arc::clone(&roster))),
        Arc::new(help_plugin(commands, prefix)),
        Arc::new(MotdPlugin::new(DEFAULT_MOTD, roster)),
    ]
}
