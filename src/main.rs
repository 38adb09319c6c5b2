//! StarRelay — plugin-driven game relay.
//!
//! Main entry point: loads configuration, wires the plugin manager and the
//! built-in plugins together, and drives a console session through the
//! hook pipeline.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt};

use starrelay_core::config::AppConfig;
use starrelay_core::result::AppResult;
use starrelay_core::types::id::ConnectionId;
use starrelay_plugin::api::context::{HookContext, Protocol};
use starrelay_plugin::hooks::definitions::{HookPayload, HookPoint};
use starrelay_plugin::manager::PluginManager;
use starrelay_plugin::registry::Plugin;

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "starrelay", version, about = "Plugin-driven game relay")]
struct Cli {
    /// Configuration overlay to load from `config/<env>`.
    #[arg(long, default_value = "development")]
    env: String,

    /// Print the loaded plugins and their states, then exit.
    #[arg(long)]
    list_plugins: bool,

    /// Player name for the console session.
    #[arg(long, default_value = "console")]
    player: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(cli, config).await {
        tracing::error!("Relay error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Console connection: messages for the client are printed to stdout.
#[derive(Debug)]
struct ConsoleProtocol {
    id: ConnectionId,
    player: String,
}

#[async_trait]
impl Protocol for ConsoleProtocol {
    fn connection_id(&self) -> ConnectionId {
        self.id
    }

    fn player_name(&self) -> Option<String> {
        Some(self.player.clone())
    }

    async fn send_message(&self, message: &str) -> AppResult<()> {
        println!("[relay] {message}");
        Ok(())
    }
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting StarRelay v{}", env!("CARGO_PKG_VERSION"));

    let prefix = config.plugins.command_prefix.clone();
    let manager = PluginManager::with_chat_dispatcher(config.plugins.clone())
        .await
        .context("failed to create plugin manager")?;

    for plugin in plugin_core_commands::builtin_plugins(
        Arc::clone(manager.command_dispatcher()),
        &prefix,
    ) {
        let name = plugin.descriptor().name.clone();
        if config.plugins.is_disabled(&name) {
            tracing::info!(plugin = %name, "Plugin disabled by configuration");
            continue;
        }
        manager
            .load(plugin)
            .await
            .with_context(|| format!("failed to load plugin '{name}'"))?;
    }

    manager
        .activate_all()
        .await
        .context("plugin activation failed")?;

    if cli.list_plugins {
        for info in manager.list().await {
            println!("{info}  {}", info.descriptor.description);
        }
        manager.deactivate_all().await?;
        return Ok(());
    }

    let protocol: Arc<dyn Protocol> = Arc::new(ConsoleProtocol {
        id: ConnectionId::new(),
        player: cli.player.clone(),
    });

    console_session(&manager, protocol).await;

    tracing::info!("Deactivating plugins...");
    manager.deactivate_all().await?;
    tracing::info!("StarRelay shut down gracefully");
    Ok(())
}

/// Feeds stdin lines through `on_chat_sent` until EOF or a shutdown signal.
async fn console_session(manager: &PluginManager, protocol: Arc<dyn Protocol>) {
    let dispatcher = manager.dispatcher();
    let player = protocol.player_name().unwrap_or_default();

    let connect = HookContext::new(
        HookPoint::OnClientConnect,
        HookPayload::new().with_string("player", &player),
        Arc::clone(&protocol),
    );
    if let Err(e) = dispatcher.dispatch(&connect).await {
        tracing::error!(error = %e, "on_client_connect failed");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                break;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read console input");
                break;
            }
        };

        let ctx = HookContext::new(
            HookPoint::OnChatSent,
            HookPayload::new().with_string("message", &line),
            Arc::clone(&protocol),
        );

        match dispatcher.dispatch(&ctx).await {
            Ok(result) if result.should_forward() => println!("<{player}> {line}"),
            Ok(result) => {
                tracing::debug!(stopped_by = ?result.stopped_by, "Chat line consumed by plugin");
            }
            Err(e) => tracing::error!(error = %e, "on_chat_sent failed"),
        }
    }

    let disconnect = connect.rebind(HookPoint::OnClientDisconnect);
    if let Err(e) = dispatcher.dispatch(&disconnect).await {
        tracing::error!(error = %e, "on_client_disconnect failed");
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
