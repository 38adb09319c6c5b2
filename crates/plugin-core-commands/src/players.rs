//! Player roster and the `/who` command.

use std::sync::Arc;

use starrelay_plugin::api::context::{ConnectionState, HookContext};
use starrelay_plugin::commands::handler::{CommandInvocation, FnCommand};
use starrelay_plugin::commands::simple::SimpleCommandPlugin;
use starrelay_plugin::hooks::definitions::HookPoint;
use starrelay_plugin::registry::PluginDescriptor;
use starrelay_plugin::traits::FnHandler;

/// Plugin name.
pub const NAME: &str = "players";

/// Names of the players currently connected, keyed by connection.
#[derive(Debug, Default)]
pub struct Roster {
    names: ConnectionState<String>,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the player behind a newly connected client.
    pub fn join(&self, ctx: &HookContext) {
        let name = ctx
            .protocol
            .player_name()
            .or_else(|| ctx.data.get_string("player").map(str::to_string))
            .unwrap_or_else(|| format!("guest-{}", ctx.connection_id()));
        self.names.insert(ctx.connection_id(), name);
    }

    /// Forgets a disconnected client.
    pub fn leave(&self, ctx: &HookContext) {
        self.names.remove(&ctx.connection_id());
    }

    /// Connected player names, sorted.
    pub fn online(&self) -> Vec<String> {
        let mut names = self.names.values();
        names.sort();
        names
    }

    /// Number of connected players.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns whether nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Builds the `players` plugin around a shared roster.
pub fn players_plugin(roster: Arc<Roster>) -> SimpleCommandPlugin {
    let joined = Arc::clone(&roster);
    let left = Arc::clone(&roster);

    SimpleCommandPlugin::builder(
        PluginDescriptor::new(NAME)
            .with_description("Tracks connected players and lists them.")
            .with_version("1.0"),
    )
    .hook(
        HookPoint::OnClientConnect,
        FnHandler::from_sync(move |ctx: &HookContext| joined.join(ctx)),
    )
    .hook(
        HookPoint::OnClientDisconnect,
        FnHandler::from_sync(move |ctx: &HookContext| left.leave(ctx)),
    )
    .command_with(
        "who",
        FnCommand::from_sync(move |_inv: &CommandInvocation| {
            let online = roster.online();
            format!("{} player(s) online: {}", online.len(), online.join(", "))
        }),
    )
    .alias("who", ["players", "online"])
    .build()
}
