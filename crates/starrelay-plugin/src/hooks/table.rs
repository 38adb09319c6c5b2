//! Per-plugin hook table — the explicit map from hook point to handler.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use starrelay_core::error::AppError;
use starrelay_core::result::AppResult;

use super::definitions::{HookAction, HookPoint};
use crate::api::context::HookContext;
use crate::traits::{FnHandler, HookHandler, IntoHookAction, IntoHookHandler};

/// The set of hooks a plugin overrides.
///
/// Hooks absent from the table keep the default behavior: do nothing and
/// let the event continue.
#[derive(Debug, Clone, Default)]
pub struct HookTable {
    /// Hook point → normalized handler.
    handlers: HashMap<HookPoint, Arc<dyn HookHandler>>,
}

impl HookTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a table.
    pub fn builder() -> HookTableBuilder {
        HookTableBuilder::default()
    }

    /// Invokes the handler for `hook`, or returns the default `Continue`.
    pub async fn invoke(&self, hook: HookPoint, ctx: &HookContext) -> AppResult<HookAction> {
        match self.handlers.get(&hook) {
            Some(handler) => handler.handle(ctx).await,
            None => Ok(HookAction::Continue),
        }
    }

    /// Returns the handler registered for a hook, if any.
    pub fn get(&self, hook: HookPoint) -> Option<&Arc<dyn HookHandler>> {
        self.handlers.get(&hook)
    }

    /// Returns whether the table overrides `hook`.
    pub fn overrides(&self, hook: HookPoint) -> bool {
        self.handlers.contains_key(&hook)
    }

    /// Iterates over the overridden hooks in catalogue order.
    pub fn iter(&self) -> impl Iterator<Item = (HookPoint, &Arc<dyn HookHandler>)> {
        HookPoint::ALL
            .into_iter()
            .filter_map(|hook| self.handlers.get(&hook).map(|handler| (hook, handler)))
    }

    /// Number of overridden hooks.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns whether nothing is overridden.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Inserts a handler, replacing any earlier one for the same hook.
    pub fn insert(&mut self, hook: HookPoint, handler: impl IntoHookHandler) {
        if self
            .handlers
            .insert(hook, handler.into_hook_handler())
            .is_some()
        {
            warn!(hook = %hook, "Hook handler replaced in table");
        }
    }

    /// Inserts a handler only when the hook is not overridden yet.
    pub fn insert_default(&mut self, hook: HookPoint, handler: impl IntoHookHandler) {
        self.handlers
            .entry(hook)
            .or_insert_with(|| handler.into_hook_handler());
    }
}

/// Builder for [`HookTable`].
#[derive(Debug, Default)]
pub struct HookTableBuilder {
    table: HookTable,
}

impl HookTableBuilder {
    /// Registers any handler for a hook point.
    pub fn on(mut self, hook: HookPoint, handler: impl IntoHookHandler) -> Self {
        self.table.insert(hook, handler);
        self
    }

    /// Registers a plain function for a hook point.
    pub fn on_sync<F, R>(self, hook: HookPoint, handler: F) -> Self
    where
        F: Fn(&HookContext) -> R + Send + Sync + 'static,
        R: IntoHookAction,
    {
        self.on(hook, FnHandler::from_sync(handler))
    }

    /// Registers a suspending function for a hook point.
    pub fn on_async<F, Fut, R>(self, hook: HookPoint, handler: F) -> Self
    where
        F: Fn(HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHookAction,
    {
        self.on(hook, FnHandler::from_async(handler))
    }

    /// Registers a handler by hook name.
    ///
    /// Fails for names outside the catalogue, such as `activate`.
    pub fn on_named(self, name: &str, handler: impl IntoHookHandler) -> AppResult<Self> {
        let hook = HookPoint::from_name(name).ok_or_else(|| {
            AppError::validation(format!("'{name}' does not name a hook and cannot handle events"))
        })?;
        Ok(self.on(hook, handler))
    }

    /// Builds the table.
    pub fn build(self) -> HookTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::definitions::HookPayload;
    use crate::mock::MockProtocol;

    fn ctx(hook: HookPoint) -> HookContext {
        HookContext::new(hook, HookPayload::new(), Arc::new(MockProtocol::new("tester")))
    }

    #[tokio::test]
    async fn test_unoverridden_hooks_continue() {
        let table = HookTable::new();
        for hook in HookPoint::ALL {
            let action = table.invoke(hook, &ctx(hook)).await.expect("default");
            assert_eq!(action, HookAction::Continue, "{hook}");
        }
    }

    #[tokio::test]
    async fn test_overridden_hook_is_used() {
        let table = HookTable::builder()
            .on_sync(HookPoint::OnWarpCommand, |_ctx: &HookContext| false)
            .build();

        let warp = table
            .invoke(HookPoint::OnWarpCommand, &ctx(HookPoint::OnWarpCommand))
            .await
            .expect("warp");
        let heartbeat = table
            .invoke(HookPoint::OnHeartbeat, &ctx(HookPoint::OnHeartbeat))
            .await
            .expect("heartbeat");

        assert_eq!(warp, HookAction::Stop);
        assert_eq!(heartbeat, HookAction::Continue);
        assert!(table.overrides(HookPoint::OnWarpCommand));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_on_named_rejects_lifecycle_names() {
        let noop = |_ctx: &HookContext| ();
        assert!(
            HookTable::builder()
                .on_named("activate", FnHandler::from_sync(noop))
                .is_err()
        );
        let table = HookTable::builder()
            .on_named("on_chat_sent", FnHandler::from_sync(noop))
            .expect("hook name")
            .build();
        assert!(table.overrides(HookPoint::OnChatSent));
    }

    #[test]
    fn test_insert_default_keeps_override() {
        let mut table = HookTable::builder()
            .on_sync(HookPoint::OnChatSent, |_ctx: &HookContext| false)
            .build();
        let original = Arc::clone(table.get(HookPoint::OnChatSent).expect("present"));

        table.insert_default(
            HookPoint::OnChatSent,
            FnHandler::from_sync(|_ctx: &HookContext| ()),
        );

        let kept = table.get(HookPoint::OnChatSent).expect("present");
        assert!(Arc::ptr_eq(&original, kept));
    }
}
