//! Integration tests for the StarRelay plugin system.

mod helpers;

mod commands_test;
mod dispatch_test;
mod lifecycle_test;
