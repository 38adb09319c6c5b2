//! Hook dispatcher — invokes active plugins' handlers for one event.
//!
//! - Handlers are awaited one at a time in priority order.
//! - The first handler returning `Stop` ends the event; later plugins never see it.
//! - A handler error aborts the event and is returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use starrelay_core::error::AppError;
use starrelay_core::result::AppResult;

use super::definitions::{HookAction, HookPoint};
use super::registry::HookRegistry;
use crate::api::context::HookContext;

/// Outcome of dispatching one event to all handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    /// Final propagation decision.
    pub action: HookAction,
    /// Plugin that stopped propagation (if stopped).
    pub stopped_by: Option<String>,
    /// Number of handlers that ran.
    pub invoked: usize,
}

impl DispatchResult {
    /// Returns whether the event should still be forwarded.
    pub fn should_forward(&self) -> bool {
        !self.action.is_stop()
    }
}

/// Dispatches hooks to all registered handlers.
#[derive(Debug)]
pub struct HookDispatcher {
    /// Hook registry.
    registry: Arc<HookRegistry>,
    /// Optional per-handler time budget.
    timeout: Option<Duration>,
}

impl HookDispatcher {
    /// Creates a new hook dispatcher without a time budget.
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self {
            registry,
            timeout: None,
        }
    }

    /// Sets the per-handler time budget.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Dispatches `ctx.hook` to every registered handler.
    pub async fn dispatch(&self, ctx: &HookContext) -> AppResult<DispatchResult> {
        let hook = ctx.hook;
        let handlers = self.registry.get_handlers(hook).await;

        debug!(
            hook = %hook,
            connection = %ctx.connection_id(),
            handler_count = handlers.len(),
            "Dispatching hook"
        );

        let mut invoked = 0;

        for registered in &handlers {
            invoked += 1;

            let outcome = match self.timeout {
                Some(limit) => tokio::time::timeout(limit, registered.handler.handle(ctx))
                    .await
                    .map_err(|_| {
                        error!(
                            hook = %hook,
                            plugin = %registered.plugin,
                            timeout = ?limit,
                            "Hook handler timed out"
                        );
                        AppError::timeout(format!(
                            "plugin '{}' did not finish {} within {} ms",
                            registered.plugin,
                            hook,
                            limit.as_millis()
                        ))
                    })?,
                None => registered.handler.handle(ctx).await,
            };

            let action = outcome.map_err(|e| handler_failed(hook, &registered.plugin, e))?;

            if action.is_stop() {
                debug!(hook = %hook, plugin = %registered.plugin, "Handler stopped propagation");
                return Ok(DispatchResult {
                    action,
                    stopped_by: Some(registered.plugin.clone()),
                    invoked,
                });
            }
        }

        Ok(DispatchResult {
            action: HookAction::Continue,
            stopped_by: None,
            invoked,
        })
    }

    /// Returns a reference to the hook registry.
    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    /// Returns whether any plugin handles `hook`.
    pub async fn is_observed(&self, hook: HookPoint) -> bool {
        self.registry.handler_count(hook).await > 0
    }
}

fn handler_failed(hook: HookPoint, plugin: &str, err: AppError) -> AppError {
    error!(hook = %hook, plugin = %plugin, error = %err, "Hook handler failed");
    let kind = err.kind;
    AppError::with_source(
        kind,
        format!("plugin '{plugin}' failed while handling {hook}: {}", err.message),
        err,
    )
}
