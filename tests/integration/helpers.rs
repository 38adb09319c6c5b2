//! Shared test helpers for integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use starrelay_core::config::plugin::PluginConfig;
use starrelay_core::error::AppError;
use starrelay_core::result::AppResult;
use starrelay_plugin::api::activation::ActivationContext;
use starrelay_plugin::api::context::HookContext;
use starrelay_plugin::hooks::definitions::{HookPayload, HookPoint};
use starrelay_plugin::manager::PluginManager;
use starrelay_plugin::mock::{MockProtocol, RecordingDispatcher};
use starrelay_plugin::registry::{Plugin, PluginDescriptor};

/// Ordered record of lifecycle events shared by witness plugins.
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Plugin that records when its `activate()` starts and finishes.
#[derive(Debug)]
pub struct Witness {
    descriptor: PluginDescriptor,
    journal: Journal,
}

impl Witness {
    /// Creates a witness writing into `journal`.
    pub fn new(descriptor: PluginDescriptor, journal: &Journal) -> Arc<dyn Plugin> {
        Arc::new(Self {
            descriptor,
            journal: Arc::clone(journal),
        })
    }
}

#[async_trait]
impl Plugin for Witness {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn activate(&self, _ctx: &ActivationContext) -> AppResult<()> {
        let name = &self.descriptor.name;
        self.journal.lock().unwrap().push(format!("start {name}"));
        tokio::task::yield_now().await;
        self.journal.lock().unwrap().push(format!("end {name}"));
        Ok(())
    }

    async fn deactivate(&self, _ctx: &ActivationContext) -> AppResult<()> {
        Err(AppError::plugin("witness refuses to stop cleanly"))
    }
}

/// Snapshot of a journal.
pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Manager backed by a recording command dispatcher.
pub fn recording_manager() -> (PluginManager, Arc<RecordingDispatcher>) {
    let recording = Arc::new(RecordingDispatcher::new());
    let manager = PluginManager::new(PluginConfig::default(), recording.clone());
    (manager, recording)
}

/// Manager with a recording command dispatcher loaded as the
/// `command_dispatcher` plugin that command plugins depend on.
pub async fn command_manager() -> (PluginManager, Arc<RecordingDispatcher>) {
    let (manager, recording) = recording_manager();
    manager.load(recording.clone()).await.unwrap();
    (manager, recording)
}

/// Outgoing chat event from `protocol`.
pub fn chat(protocol: &Arc<MockProtocol>, line: &str) -> HookContext {
    HookContext::new(
        HookPoint::OnChatSent,
        HookPayload::new().with_string("message", line),
        protocol.clone(),
    )
}

/// Event with a payload no handler expects.
pub fn arbitrary_event(hook: HookPoint, protocol: &Arc<MockProtocol>) -> HookContext {
    HookContext::new(
        hook,
        HookPayload::from_json(serde_json::json!({
            "entity_id": 42,
            "blob": [1, 2, 3],
            "nested": { "ok": true },
        })),
        protocol.clone(),
    )
}
