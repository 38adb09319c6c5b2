//! Plugin API — the context handed to hooks and the lifecycle entry points.

pub mod activation;
pub mod context;

pub use activation::ActivationContext;
pub use context::{ConnectionState, HookContext, Protocol};
