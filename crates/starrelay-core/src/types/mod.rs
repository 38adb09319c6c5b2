//! Core type definitions used across the StarRelay workspace.

pub mod id;

pub use id::ConnectionId;
