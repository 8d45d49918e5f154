//! Storage backend implementations.
//!
//! This module provides concrete implementations of the repository traits
//! defined in `mealplanner_core::storage`. Backends are selected at compile
//! time via feature flags and can be enabled together.
//!
//! # Feature Flags
//!
//! - `sqlite` (default): SQLite storage backend using `rusqlite` and `tokio-rusqlite`
//! - `inmemory` (default): ordered-map backend for tests

#[cfg(not(any(feature = "sqlite", feature = "inmemory")))]
compile_error!(
    "No storage backend selected. Enable 'sqlite' or 'inmemory' feature. \
    Example: cargo build -p mealplanner --features sqlite"
);

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(test)]
pub(crate) mod contract;
