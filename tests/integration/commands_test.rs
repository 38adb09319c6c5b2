//! Integration tests for command plugins and the command dispatcher boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use starrelay_core::config::plugin::PluginConfig;
use starrelay_core::error::ErrorKind;
use starrelay_plugin::commands::dispatcher::{COMMAND_DISPATCHER, CommandDispatcher};
use starrelay_plugin::commands::error::CommandError;
use starrelay_plugin::commands::handler::{CommandInvocation, FnCommand};
use starrelay_plugin::commands::simple::SimpleCommandPlugin;
use starrelay_plugin::api::context::HookContext;
use starrelay_plugin::hooks::definitions::HookAction;
use starrelay_plugin::traits::FnHandler;
use starrelay_plugin::manager::PluginManager;
use starrelay_plugin::mock::{MockProtocol, RecordingDispatcher};
use starrelay_plugin::registry::{PluginDescriptor, PluginState};

use crate::helpers;

fn foo() -> FnCommand {
    FnCommand::from_async(|inv: CommandInvocation| async move { format!("foo {}", inv.rest()) })
}

#[tokio::test]
async fn test_unbound_command_fails_activation_without_aliases() {
    let (manager, recording) = helpers::command_manager().await;
    manager
        .load(Arc::new(
            SimpleCommandPlugin::builder(PluginDescriptor::new("fooer"))
                .command("foo")
                .alias("foo", ["f", "fo"])
                .build(),
        ))
        .await
        .unwrap();

    let err = manager.activate_all().await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Command);
    let cause = err
        .source
        .as_ref()
        .and_then(|source| source.downcast_ref::<CommandError>());
    assert_eq!(
        cause,
        Some(&CommandError::CommandName {
            plugin: "fooer".to_string(),
            name: "foo".to_string(),
        })
    );
    assert!(recording.register_calls().is_empty());
    assert!(recording.registered_aliases().is_empty());
    assert_eq!(manager.state("fooer").await, Some(PluginState::Failed));
}

#[tokio::test]
async fn test_bound_command_registers_each_alias_once() {
    let (manager, recording) = helpers::command_manager().await;
    manager
        .load(Arc::new(
            SimpleCommandPlugin::builder(PluginDescriptor::new("fooer"))
                .command("foo")
                .bind("foo", foo())
                .alias("foo", ["f", "fo"])
                .build(),
        ))
        .await
        .unwrap();

    manager.activate_all().await.unwrap();

    let mut calls = recording.register_calls();
    calls.sort();
    assert_eq!(
        calls,
        [
            ("f".to_string(), "foo".to_string()),
            ("fo".to_string(), "foo".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_duplicate_alias_is_distinguishable_at_the_boundary() {
    let recording = RecordingDispatcher::new();
    recording.register("f", "foo").unwrap();

    let err = recording.register("f", "foo").unwrap_err();

    assert!(matches!(err, CommandError::DuplicateAlias { ref alias, .. } if alias == "f"));
    assert_eq!(recording.register_calls().len(), 2);
}

#[tokio::test]
async fn test_second_plugin_claiming_an_alias_fails_cleanly() {
    let (manager, recording) = helpers::command_manager().await;
    manager
        .load(Arc::new(
            SimpleCommandPlugin::builder(PluginDescriptor::new("first"))
                .command_with("foo", foo())
                .alias("foo", ["f"])
                .build(),
        ))
        .await
        .unwrap();
    manager
        .load(Arc::new(
            SimpleCommandPlugin::builder(PluginDescriptor::new("second"))
                .command_with("fizz", foo())
                .alias("fizz", ["f"])
                .build(),
        ))
        .await
        .unwrap();

    let err = manager.activate_all().await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Command);
    assert_eq!(manager.state("first").await, Some(PluginState::Active));
    assert_eq!(manager.state("second").await, Some(PluginState::Failed));
    assert_eq!(recording.registered_commands(), ["foo"]);
    assert_eq!(recording.registered_aliases(), ["f"]);
}

#[tokio::test]
async fn test_chat_commands_end_to_end() {
    let manager = PluginManager::with_chat_dispatcher(PluginConfig::default())
        .await
        .unwrap();
    for plugin in plugin_core_commands::builtin_plugins(Arc::clone(manager.command_dispatcher()), "/")
    {
        manager.load(plugin).await.unwrap();
    }
    manager
        .load(Arc::new(
            SimpleCommandPlugin::builder(PluginDescriptor::new("fooer"))
                .command_with("foo", foo())
                .alias("foo", ["f"])
                .build(),
        ))
        .await
        .unwrap();
    manager.activate_all().await.unwrap();
    assert_eq!(manager.state("motd").await, Some(PluginState::Loaded));

    let protocol = Arc::new(MockProtocol::new("alice"));
    let dispatcher = manager.dispatcher();

    let result = dispatcher
        .dispatch(&helpers::chat(&protocol, "/f a b"))
        .await
        .unwrap();
    assert_eq!(result.action, HookAction::Stop);
    assert_eq!(result.stopped_by.as_deref(), Some("command_dispatcher"));

    let result = dispatcher
        .dispatch(&helpers::chat(&protocol, "/missing"))
        .await
        .unwrap();
    assert_eq!(result.action, HookAction::Stop);

    let result = dispatcher
        .dispatch(&helpers::chat(&protocol, "just talking"))
        .await
        .unwrap();
    assert!(result.should_forward());

    dispatcher
        .dispatch(&helpers::chat(&protocol, "/?"))
        .await
        .unwrap();

    assert_eq!(
        protocol.sent(),
        [
            "foo a b",
            "Command /missing not found.",
            "Available commands: /foo, /help, /who",
        ]
    );

    manager.deactivate("fooer").await.unwrap();
    let result = dispatcher
        .dispatch(&helpers::chat(&protocol, "/f"))
        .await
        .unwrap();
    assert_eq!(result.action, HookAction::Stop);
    assert_eq!(
        protocol.sent().last().map(String::as_str),
        Some("Command /f not found.")
    );
}

#[tokio::test]
async fn test_command_plugin_chat_override_sees_commands_first() {
    let manager = PluginManager::with_chat_dispatcher(PluginConfig::default())
        .await
        .unwrap();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    manager
        .load(Arc::new(
            SimpleCommandPlugin::builder(PluginDescriptor::new("fooer"))
                .command_with("foo", foo())
                .on_chat_sent(FnHandler::from_sync(move |_ctx: &HookContext| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
                .build(),
        ))
        .await
        .unwrap();
    manager.activate_all().await.unwrap();

    let protocol = Arc::new(MockProtocol::new("alice"));
    let result = manager
        .dispatcher()
        .dispatch(&helpers::chat(&protocol, "/foo bar"))
        .await
        .unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(result.action, HookAction::Stop);
    assert_eq!(result.stopped_by.as_deref(), Some(COMMAND_DISPATCHER));
    assert_eq!(protocol.sent(), ["foo bar"]);
}

#[tokio::test]
async fn test_command_plugin_can_intercept_its_own_command() {
    let manager = PluginManager::with_chat_dispatcher(PluginConfig::default())
        .await
        .unwrap();
    manager
        .load(Arc::new(
            SimpleCommandPlugin::builder(PluginDescriptor::new("muzzle"))
                .command_with("foo", foo())
                .on_chat_sent(FnHandler::from_sync(|ctx: &HookContext| {
                    !ctx.data
                        .get_string("message")
                        .is_some_and(|line| line.starts_with("/foo"))
                }))
                .build(),
        ))
        .await
        .unwrap();
    manager.activate_all().await.unwrap();

    let protocol = Arc::new(MockProtocol::new("alice"));
    let result = manager
        .dispatcher()
        .dispatch(&helpers::chat(&protocol, "/foo bar"))
        .await
        .unwrap();

    assert_eq!(result.stopped_by.as_deref(), Some("muzzle"));
    assert!(protocol.sent().is_empty());
}

#[tokio::test]
async fn test_dispatcher_cannot_be_deactivated_under_command_plugins() {
    let manager = PluginManager::with_chat_dispatcher(PluginConfig::default())
        .await
        .unwrap();
    for plugin in plugin_core_commands::builtin_plugins(Arc::clone(manager.command_dispatcher()), "/")
    {
        manager.load(plugin).await.unwrap();
    }
    manager.activate_all().await.unwrap();
    assert_eq!(manager.state("players").await, Some(PluginState::Active));

    let err = manager.deactivate(COMMAND_DISPATCHER).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(err.message.contains("players"));
    assert_eq!(
        manager.state(COMMAND_DISPATCHER).await,
        Some(PluginState::Active)
    );
    assert!(
        manager
            .command_dispatcher()
            .command_names()
            .contains(&"who".to_string())
    );

    let protocol = Arc::new(MockProtocol::new("alice"));
    let result = manager
        .dispatcher()
        .dispatch(&helpers::chat(&protocol, "/online"))
        .await
        .unwrap();
    assert_eq!(result.stopped_by.as_deref(), Some(COMMAND_DISPATCHER));
    assert_ne!(
        protocol.sent().last().map(String::as_str),
        Some("Command /online not found.")
    );
}
