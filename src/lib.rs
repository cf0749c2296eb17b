// ABOUTME: Library root for image-sync - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod error;
pub mod output;
pub mod purge;
pub mod runtime;
pub mod sink;
pub mod sync;
pub mod types;
