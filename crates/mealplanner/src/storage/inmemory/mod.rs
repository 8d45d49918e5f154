//! In-memory storage backend for testing.
//!
//! Keeps encoded records in ordered maps behind one `tokio::sync::RwLock`.
//! Validation, uniqueness, ordering and integrity rules match the SQLite
//! backend.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use mealplanner::storage::inmemory::{repositories, InMemoryState};
//!
//! let repos = repositories(&Arc::new(InMemoryState::new()));
//! // Use repos.categories, repos.items, ... in tests
//! ```

mod repository;

pub use repository::{repositories, InMemoryRepository, InMemoryState};
