//! Integration tests for plugin activation ordering and dormancy.

use starrelay_core::config::plugin::PluginConfig;
use starrelay_core::error::ErrorKind;
use starrelay_plugin::mock::RecordingDispatcher;
use starrelay_plugin::manager::PluginManager;
use starrelay_plugin::registry::{PluginDescriptor, PluginState};
use std::sync::Arc;

use crate::helpers::{self, Journal, Witness};

#[tokio::test]
async fn test_dependency_activates_before_dependent_in_any_load_order() {
    for a_first in [true, false] {
        let journal = Journal::default();
        let (manager, _) = helpers::recording_manager();
        let a = Witness::new(PluginDescriptor::new("a").depends_on("b"), &journal);
        let b = Witness::new(PluginDescriptor::new("b"), &journal);

        let loads = if a_first { [a, b] } else { [b, a] };
        for plugin in loads {
            manager.load(plugin).await.unwrap();
        }
        manager.activate_all().await.unwrap();

        assert_eq!(
            helpers::entries(&journal),
            ["start b", "end b", "start a", "end a"],
            "a loaded first: {a_first}"
        );
    }
}

#[tokio::test]
async fn test_chain_of_three_in_every_permutation() {
    let permutations = [
        ["x", "y", "z"],
        ["x", "z", "y"],
        ["y", "x", "z"],
        ["y", "z", "x"],
        ["z", "x", "y"],
        ["z", "y", "x"],
    ];

    for order in permutations {
        let journal = Journal::default();
        let (manager, _) = helpers::recording_manager();
        for name in order {
            let descriptor = match name {
                "x" => PluginDescriptor::new("x").depends_on("y"),
                "y" => PluginDescriptor::new("y").depends_on("z"),
                _ => PluginDescriptor::new("z"),
            };
            manager.load(Witness::new(descriptor, &journal)).await.unwrap();
        }

        manager.activate_all().await.unwrap();
        assert_eq!(manager.activation_order().await, ["z", "y", "x"], "{order:?}");
    }
}

#[tokio::test]
async fn test_dormant_plugin_waits_for_explicit_request() {
    let journal = Journal::default();
    let (manager, _) = helpers::recording_manager();
    manager
        .load(Witness::new(PluginDescriptor::new("base"), &journal))
        .await
        .unwrap();
    manager
        .load(Witness::new(
            PluginDescriptor::new("sleeper")
                .depends_on("base")
                .with_auto_activate(false),
            &journal,
        ))
        .await
        .unwrap();

    manager.activate_all().await.unwrap();
    assert_eq!(manager.state("base").await, Some(PluginState::Active));
    assert_eq!(manager.state("sleeper").await, Some(PluginState::Loaded));
    assert_eq!(helpers::entries(&journal), ["start base", "end base"]);

    manager.activate("sleeper").await.unwrap();
    assert_eq!(manager.state("sleeper").await, Some(PluginState::Active));
}

#[tokio::test]
async fn test_configured_activation_list() {
    let journal = Journal::default();
    let config = PluginConfig {
        activate: vec!["sleeper".to_string()],
        ..PluginConfig::default()
    };
    let manager = PluginManager::new(config, Arc::new(RecordingDispatcher::new()));
    manager
        .load(Witness::new(
            PluginDescriptor::new("sleeper").with_auto_activate(false),
            &journal,
        ))
        .await
        .unwrap();

    manager.activate_all().await.unwrap();
    assert_eq!(manager.state("sleeper").await, Some(PluginState::Active));
}

#[tokio::test]
async fn test_cycle_is_reported_before_anything_activates() {
    let journal = Journal::default();
    let (manager, _) = helpers::recording_manager();
    manager
        .load(Witness::new(PluginDescriptor::new("ok"), &journal))
        .await
        .unwrap();
    manager
        .load(Witness::new(PluginDescriptor::new("p").depends_on("q"), &journal))
        .await
        .unwrap();
    manager
        .load(Witness::new(PluginDescriptor::new("q").depends_on("p"), &journal))
        .await
        .unwrap();

    let err = manager.activate_all().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Dependency);
    assert!(helpers::entries(&journal).is_empty());
}

#[tokio::test]
async fn test_duplicate_and_blank_names_fail_at_load() {
    let journal = Journal::default();
    let (manager, _) = helpers::recording_manager();
    manager
        .load(Witness::new(PluginDescriptor::new("same"), &journal))
        .await
        .unwrap();

    let err = manager
        .load(Witness::new(PluginDescriptor::new("same"), &journal))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = manager
        .load(Witness::new(PluginDescriptor::new(""), &journal))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_shutdown_finishes_despite_deactivate_errors() {
    let journal = Journal::default();
    let (manager, _) = helpers::recording_manager();
    for name in ["one", "two"] {
        manager
            .load(Witness::new(PluginDescriptor::new(name), &journal))
            .await
            .unwrap();
    }
    manager.activate_all().await.unwrap();

    manager.deactivate_all().await.unwrap();

    assert_eq!(manager.state("one").await, Some(PluginState::Inactive));
    assert_eq!(manager.state("two").await, Some(PluginState::Inactive));
    assert!(manager.activation_order().await.is_empty());
}
