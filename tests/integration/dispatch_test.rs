//! Integration tests for hook defaults, normalization, and propagation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use starrelay_core::error::{AppError, ErrorKind};
use starrelay_plugin::api::context::HookContext;
use starrelay_plugin::hooks::definitions::{HookAction, HookPoint};
use starrelay_plugin::hooks::table::HookTable;
use starrelay_plugin::mock::MockProtocol;
use starrelay_plugin::registry::{Plugin, PluginDescriptor};
use starrelay_plugin::traits::{FnHandler, HookHandler, normalize};

use crate::helpers;

/// Plugin whose hook table is supplied by the test.
#[derive(Debug)]
struct Scripted {
    descriptor: PluginDescriptor,
    table: HookTable,
}

#[async_trait::async_trait]
impl Plugin for Scripted {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn hooks(self: Arc<Self>) -> HookTable {
        self.table.clone()
    }
}

fn scripted(name: &str, priority: i32, table: HookTable) -> Arc<dyn Plugin> {
    Arc::new(Scripted {
        descriptor: PluginDescriptor::new(name).with_priority(priority),
        table,
    })
}

#[tokio::test]
async fn test_every_unhandled_hook_continues() {
    let protocol = Arc::new(MockProtocol::new("alice"));
    let bare = Arc::new(Scripted {
        descriptor: PluginDescriptor::new("bare"),
        table: HookTable::new(),
    });
    let table = bare.hooks();

    for hook in HookPoint::ALL {
        let ctx = helpers::arbitrary_event(hook, &protocol);
        let action = table.invoke(hook, &ctx).await.unwrap();
        assert_eq!(action, HookAction::Continue, "{hook}");
    }
    assert!(protocol.sent().is_empty());
}

#[tokio::test]
async fn test_dispatch_with_no_overrides_forwards_everything() {
    let (manager, _) = helpers::recording_manager();
    manager
        .load(scripted("bare", 100, HookTable::new()))
        .await
        .unwrap();
    manager.activate_all().await.unwrap();
    let protocol = Arc::new(MockProtocol::new("alice"));

    for hook in HookPoint::ALL {
        let result = manager
            .dispatcher()
            .dispatch(&helpers::arbitrary_event(hook, &protocol))
            .await
            .unwrap();
        assert!(result.should_forward(), "{hook}");
        assert_eq!(result.stopped_by, None);
    }
}

#[tokio::test]
async fn test_plain_and_async_handlers_are_awaited_alike() {
    let protocol = Arc::new(MockProtocol::new("alice"));
    let ctx = helpers::chat(&protocol, "hello");

    let plain = normalize(FnHandler::from_sync(|ctx: &HookContext| {
        ctx.data.get_string("message") != Some("hello")
    }));
    let suspending = normalize(FnHandler::from_async(|ctx: HookContext| async move {
        ctx.protocol.send_message("seen").await?;
        Ok::<_, AppError>(HookAction::Stop)
    }));

    assert_eq!(plain.handle(&ctx).await.unwrap(), HookAction::Stop);
    assert_eq!(suspending.handle(&ctx).await.unwrap(), HookAction::Stop);
    assert_eq!(protocol.sent(), ["seen"]);

    let again = normalize(Arc::clone(&plain));
    assert!(Arc::ptr_eq(&plain, &again));
}

#[tokio::test]
async fn test_named_registration_rejects_lifecycle_methods() {
    let handler = || FnHandler::from_sync(|_ctx: &HookContext| ());

    assert!(HookTable::builder().on_named("on_chat_sent", handler()).is_ok());
    let err = HookTable::builder()
        .on_named("activate", handler())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_stop_hides_event_from_later_plugins() {
    let (manager, _) = helpers::recording_manager();
    let late_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&late_calls);

    manager
        .load(scripted(
            "late",
            50,
            HookTable::builder()
                .on_sync(HookPoint::OnChatSent, move |_ctx: &HookContext| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .build(),
        ))
        .await
        .unwrap();
    manager
        .load(scripted(
            "early",
            10,
            HookTable::builder()
                .on_sync(HookPoint::OnChatSent, |_ctx: &HookContext| HookAction::Stop)
                .build(),
        ))
        .await
        .unwrap();
    manager.activate_all().await.unwrap();

    let protocol = Arc::new(MockProtocol::new("alice"));
    let result = manager
        .dispatcher()
        .dispatch(&helpers::chat(&protocol, "hi"))
        .await
        .unwrap();

    assert_eq!(result.action, HookAction::Stop);
    assert_eq!(result.stopped_by.as_deref(), Some("early"));
    assert_eq!(result.invoked, 1);
    assert_eq!(late_calls.load(Ordering::SeqCst), 0);

    let result = manager
        .dispatcher()
        .dispatch(&helpers::arbitrary_event(HookPoint::OnHeartbeat, &protocol))
        .await
        .unwrap();
    assert!(result.should_forward());
}

#[tokio::test]
async fn test_deactivated_plugin_stops_receiving_events() {
    let (manager, _) = helpers::recording_manager();
    manager
        .load(scripted(
            "blocker",
            10,
            HookTable::builder()
                .on_sync(HookPoint::OnChatSent, |_ctx: &HookContext| false)
                .build(),
        ))
        .await
        .unwrap();
    manager.activate_all().await.unwrap();
    let protocol = Arc::new(MockProtocol::new("alice"));
    let ctx = helpers::chat(&protocol, "hi");

    assert!(!manager.dispatcher().dispatch(&ctx).await.unwrap().should_forward());

    manager.deactivate("blocker").await.unwrap();
    assert!(manager.dispatcher().dispatch(&ctx).await.unwrap().should_forward());
}
