//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates. Host applications can depend on `simple-framework` and
//! enable `desktop-shims` to get the reqwest and SQLite bridges wired into
//! `core-service` without naming each crate.

#[cfg(feature = "desktop-shims")]
pub use core_service::{AppCore, CoreDependencies, CoreError};
