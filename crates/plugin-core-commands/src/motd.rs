//! Message of the day, sent to every client as it connects.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use starrelay_plugin::api::context::HookContext;
use starrelay_plugin::hooks::definitions::HookPoint;
use starrelay_plugin::hooks::table::HookTable;
use starrelay_plugin::registry::{Plugin, PluginDescriptor};

use crate::players::{self, Roster};

/// Plugin name.
pub const NAME: &str = "motd";

/// Greets new connections. Dormant until listed in `plugins.activate`.
#[derive(Debug)]
pub struct MotdPlugin {
    descriptor: PluginDescriptor,
    /// Greeting text.
    message: String,
    /// Roster kept by the `players` plugin.
    roster: Arc<Roster>,
}

impl MotdPlugin {
    /// Creates the plugin.
    pub fn new(message: impl Into<String>, roster: Arc<Roster>) -> Self {
        Self {
            descriptor: PluginDescriptor::new(NAME)
                .with_description("Greets players when they connect.")
                .with_version("1.0")
                .depends_on(players::NAME)
                .with_auto_activate(false)
                .with_priority(150),
            message: message.into(),
            roster,
        }
    }

    async fn greet(&self, ctx: &HookContext) -> starrelay_core::AppResult<()> {
        debug!(connection = %ctx.connection_id(), "Sending message of the day");
        ctx.protocol.send_message(&self.message).await?;
        ctx.protocol
            .send_message(&format!("{} player(s) online.", self.roster.len()))
            .await
    }
}

#[async_trait]
impl Plugin for MotdPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn hooks(self: Arc<Self>) -> HookTable {
        HookTable::builder()
            .on_async(HookPoint::OnClientConnect, move |ctx: HookContext| {
                let plugin = Arc::clone(&self);
                async move { plugin.greet(&ctx).await }
            })
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starrelay_plugin::hooks::definitions::{HookAction, HookPayload};
    use starrelay_plugin::mock::MockProtocol;

    #[test]
    fn test_descriptor_is_dormant_and_depends_on_players() {
        let plugin = MotdPlugin::new("hi", Arc::new(Roster::new()));
        assert!(!plugin.descriptor().auto_activate);
        assert_eq!(plugin.descriptor().depends, [players::NAME]);
    }

    #[tokio::test]
    async fn test_greets_on_connect() {
        let plugin = Arc::new(MotdPlugin::new("Welcome!", Arc::new(Roster::new())));
        let protocol = Arc::new(MockProtocol::new("alice"));
        let ctx = HookContext::new(HookPoint::OnClientConnect, HookPayload::new(), protocol.clone());

        let action = plugin
            .hooks()
            .invoke(HookPoint::OnClientConnect, &ctx)
            .await
            .unwrap();

        assert_eq!(action, HookAction::Continue);
        assert_eq!(protocol.sent(), ["Welcome!", "0 player(s) online."]);
    }
}
