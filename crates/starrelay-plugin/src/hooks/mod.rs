//! Hook system — catalogue, per-plugin tables, registry, and dispatcher.

pub mod definitions;
pub mod dispatcher;
pub mod registry;
pub mod table;

pub use definitions::{HookAction, HookPayload, HookPoint, is_hook_name};
pub use dispatcher::{DispatchResult, HookDispatcher};
pub use registry::HookRegistry;
pub use table::{HookTable, HookTableBuilder};
