//! # starrelay-core
//!
//! Core crate for StarRelay. Contains the unified error system,
//! configuration schemas, and typed identifiers shared by the plugin
//! framework and the relay binary.
//!
//! This crate has **no** internal dependencies on other StarRelay crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
