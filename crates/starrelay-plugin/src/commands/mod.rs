//! Chat commands — the dispatcher boundary, command handlers, and the
//! `SimpleCommandPlugin` specialization.

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod simple;

pub use dispatcher::{
    COMMAND_DISPATCH_PRIORITY, COMMAND_DISPATCHER, ChatCommandDispatcher, CommandDispatcher,
};
pub use error::CommandError;
pub use handler::{CommandHandler, CommandInvocation, FnCommand, IntoCommandHandler};
pub use simple::{SimpleCommandPlugin, SimpleCommandPluginBuilder};
