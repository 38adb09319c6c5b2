//! Handler normalization.
//!
//! Plugin authors may write a hook as a plain function or as one that
//! suspends. Both are wrapped into [`HookHandler`] here, so the dispatcher
//! awaits every handler the same way.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use starrelay_core::error::AppError;
use starrelay_core::result::AppResult;

use crate::api::context::HookContext;
use crate::hooks::definitions::HookAction;

/// Uniform, awaitable hook handler.
#[async_trait]
pub trait HookHandler: Send + Sync + std::fmt::Debug {
    /// Handles a hook invocation.
    async fn handle(&self, ctx: &HookContext) -> AppResult<HookAction>;
}

/// Conversion from whatever a handler returns into propagation control.
///
/// `()` and `true` continue, `false` stops, and errors pass through untouched.
pub trait IntoHookAction {
    /// Performs the conversion.
    fn into_hook_action(self) -> AppResult<HookAction>;
}

impl IntoHookAction for HookAction {
    fn into_hook_action(self) -> AppResult<HookAction> {
        Ok(self)
    }
}

impl IntoHookAction for () {
    fn into_hook_action(self) -> AppResult<HookAction> {
        Ok(HookAction::Continue)
    }
}

impl IntoHookAction for bool {
    fn into_hook_action(self) -> AppResult<HookAction> {
        Ok(if self {
            HookAction::Continue
        } else {
            HookAction::Stop
        })
    }
}

impl<T, E> IntoHookAction for Result<T, E>
where
    T: IntoHookAction,
    E: Into<AppError>,
{
    fn into_hook_action(self) -> AppResult<HookAction> {
        self.map_err(Into::into)?.into_hook_action()
    }
}

/// How the wrapped function was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerStyle {
    /// A plain function, run to completion when invoked.
    Blocking,
    /// A function returning a future.
    Suspending,
}

type BoxedHookFn =
    Arc<dyn Fn(HookContext) -> BoxFuture<'static, AppResult<HookAction>> + Send + Sync>;

/// A closure-based hook handler, built from either calling style.
#[derive(Clone)]
pub struct FnHandler {
    /// Calling style of the original function.
    style: HandlerStyle,
    /// Normalized function.
    handler: BoxedHookFn,
}

impl std::fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler")
            .field("style", &self.style)
            .field("handler", &"<closure>")
            .finish()
    }
}

impl FnHandler {
    /// Wraps a plain function.
    pub fn from_sync<F, R>(handler: F) -> Self
    where
        F: Fn(&HookContext) -> R + Send + Sync + 'static,
        R: IntoHookAction,
    {
        Self {
            style: HandlerStyle::Blocking,
            handler: Arc::new(move |ctx: HookContext| {
                let result = handler(&ctx).into_hook_action();
                futures::future::ready(result).boxed()
            }),
        }
    }

    /// Wraps a function that returns a future.
    pub fn from_async<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHookAction,
    {
        Self {
            style: HandlerStyle::Suspending,
            handler: Arc::new(move |ctx: HookContext| {
                let fut = handler(ctx);
                async move { fut.await.into_hook_action() }.boxed()
            }),
        }
    }

    /// Returns how the wrapped function was written.
    pub fn style(&self) -> HandlerStyle {
        self.style
    }
}

#[async_trait]
impl HookHandler for FnHandler {
    async fn handle(&self, ctx: &HookContext) -> AppResult<HookAction> {
        (self.handler)(ctx.clone()).await
    }
}

/// Conversion into a shared, normalized handler.
///
/// Applying it to something that is already an `Arc<dyn HookHandler>`
/// returns that same handler.
pub trait IntoHookHandler {
    /// Performs the conversion.
    fn into_hook_handler(self) -> Arc<dyn HookHandler>;
}

impl IntoHookHandler for Arc<dyn HookHandler> {
    fn into_hook_handler(self) -> Arc<dyn HookHandler> {
        self
    }
}

impl IntoHookHandler for FnHandler {
    fn into_hook_handler(self) -> Arc<dyn HookHandler> {
        Arc::new(self)
    }
}

/// Normalizes a handler into the single awaitable calling convention.
pub fn normalize(handler: impl IntoHookHandler) -> Arc<dyn HookHandler> {
    handler.into_hook_handler()
}
