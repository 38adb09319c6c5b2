//! Command handlers and their normalization.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use starrelay_core::error::AppError;
use starrelay_core::result::AppResult;

use crate::api::context::{HookContext, Protocol};
use crate::traits::HandlerStyle;

/// One parsed command line.
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    /// Canonical command name.
    pub command: String,
    /// Name the user typed (the command itself or one of its aliases).
    pub alias: String,
    /// Whitespace-separated arguments.
    pub args: Vec<String>,
    /// Context of the chat event carrying the command.
    pub context: HookContext,
}

impl CommandInvocation {
    /// Connection that issued the command.
    pub fn protocol(&self) -> &Arc<dyn Protocol> {
        &self.context.protocol
    }

    /// Returns the argument at `index`.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Arguments joined back into one string.
    pub fn rest(&self) -> String {
        self.args.join(" ")
    }

    /// Sends a message back to the issuing connection.
    pub async fn reply(&self, message: &str) -> AppResult<()> {
        self.context.protocol.send_message(message).await
    }
}

/// Conversion from whatever a command returns into an optional reply.
pub trait IntoCommandReply {
    /// Performs the conversion.
    fn into_reply(self) -> AppResult<Option<String>>;
}

impl IntoCommandReply for () {
    fn into_reply(self) -> AppResult<Option<String>> {
        Ok(None)
    }
}

impl IntoCommandReply for String {
    fn into_reply(self) -> AppResult<Option<String>> {
        Ok(Some(self))
    }
}

impl IntoCommandReply for Option<String> {
    fn into_reply(self) -> AppResult<Option<String>> {
        Ok(self)
    }
}

impl<T, E> IntoCommandReply for Result<T, E>
where
    T: IntoCommandReply,
    E: Into<AppError>,
{
    fn into_reply(self) -> AppResult<Option<String>> {
        self.map_err(Into::into)?.into_reply()
    }
}

/// A bound chat command.
#[async_trait]
pub trait CommandHandler: Send + Sync + std::fmt::Debug {
    /// Runs the command, returning an optional reply for the caller.
    async fn run(&self, invocation: &CommandInvocation) -> AppResult<Option<String>>;
}

type BoxedCommandFn =
    Arc<dyn Fn(CommandInvocation) -> BoxFuture<'static, AppResult<Option<String>>> + Send + Sync>;

/// A closure-based command handler, built from either calling style.
#[derive(Clone)]
pub struct FnCommand {
    style: HandlerStyle,
    handler: BoxedCommandFn,
}

impl std::fmt::Debug for FnCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCommand")
            .field("style", &self.style)
            .field("handler", &"<closure>")
            .finish()
    }
}

impl FnCommand {
    /// Wraps a plain function.
    pub fn from_sync<F, R>(handler: F) -> Self
    where
        F: Fn(&CommandInvocation) -> R + Send + Sync + 'static,
        R: IntoCommandReply,
    {
        Self {
            style: HandlerStyle::Blocking,
            handler: Arc::new(move |invocation: CommandInvocation| {
                let result = handler(&invocation).into_reply();
                futures::future::ready(result).boxed()
            }),
        }
    }

    /// Wraps a function that returns a future.
    pub fn from_async<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(CommandInvocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoCommandReply,
    {
        Self {
            style: HandlerStyle::Suspending,
            handler: Arc::new(move |invocation: CommandInvocation| {
                let fut = handler(invocation);
                async move { fut.await.into_reply() }.boxed()
            }),
        }
    }

    /// Returns how the wrapped function was written.
    pub fn style(&self) -> HandlerStyle {
        self.style
    }
}

#[async_trait]
impl CommandHandler for FnCommand {
    async fn run(&self, invocation: &CommandInvocation) -> AppResult<Option<String>> {
        (self.handler)(invocation.clone()).await
    }
}

/// Conversion into a shared command handler.
pub trait IntoCommandHandler {
    /// Performs the conversion.
    fn into_command_handler(self) -> Arc<dyn CommandHandler>;
}

impl IntoCommandHandler for Arc<dyn CommandHandler> {
    fn into_command_handler(self) -> Arc<dyn CommandHandler> {
        self
    }
}

impl IntoCommandHandler for FnCommand {
    fn into_command_handler(self) -> Arc<dyn CommandHandler> {
        Arc::new(self)
    }
}
