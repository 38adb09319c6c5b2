//! Prelude for convenient imports.

pub use async_trait::async_trait;

pub use crate::api::activation::ActivationContext;
pub use crate::api::context::{ConnectionState, HookContext, Protocol};
pub use crate::commands::dispatcher::CommandDispatcher;
pub use crate::commands::handler::{CommandInvocation, FnCommand};
pub use crate::commands::simple::SimpleCommandPlugin;
pub use crate::hooks::definitions::{HookAction, HookPayload, HookPoint};
pub use crate::hooks::table::HookTable;
pub use crate::registry::{Plugin, PluginDescriptor};
pub use crate::traits::{FnHandler, HookHandler};

pub use crate::hook_payload;
