//! Execution: submitting code units to the remote compiler backend.
//!
//! - [`client`]: `ExecutionClient` trait and the HTTP `KotlinCompilerClient`
//! - [`controls`]: timeout and retry wrapper around any client

pub mod client;
pub mod controls;

pub use client::{ExecutionClient, KotlinCompilerClient, SNIPPET_FILE_NAME};
pub use controls::{backoff_delay, execute_with_controls, ControlledClient, MAX_BACKOFF_MS};
