//! # starrelay-plugin
//!
//! Plugin framework for the StarRelay proxy. Provides:
//!
//! - The hook catalogue: every event a plugin may observe
//! - Handler normalization, so plain and async handlers are awaited alike
//! - Plugin lifecycle management with dependency-ordered activation
//! - Hook dispatch with Continue/Stop propagation control
//! - Chat commands and the `SimpleCommandPlugin` specialization

pub mod api;
pub mod commands;
pub mod hooks;
pub mod macros;
pub mod manager;
pub mod mock;
pub mod prelude;
pub mod registry;
pub mod traits;

pub use api::activation::ActivationContext;
pub use api::context::{ConnectionState, HookContext, Protocol};
pub use commands::{
    ChatCommandDispatcher, CommandDispatcher, CommandError, CommandInvocation, FnCommand,
    SimpleCommandPlugin,
};
pub use hooks::definitions::{HookAction, HookPayload, HookPoint};
pub use hooks::dispatcher::{DispatchResult, HookDispatcher};
pub use hooks::registry::HookRegistry;
pub use hooks::table::HookTable;
pub use manager::PluginManager;
pub use registry::{Plugin, PluginDescriptor, PluginInfo, PluginRegistry, PluginState};
pub use traits::{FnHandler, HookHandler, IntoHookHandler, normalize};
