//! SQLite storage backend implementation.
//!
//! Emulates an indexed object store on SQLite: one table of JSON records per
//! store, expression indexes over record fields, `PRAGMA user_version` as the
//! schema version. Uses `rusqlite` for synchronous operations and
//! `tokio-rusqlite` for async wrapping.

mod engine;
mod error;
mod key;
mod repository;
mod schema;
mod store;

pub use engine::{ObjectStore, StorageEngine, StoreTransaction, TransactionMode};
pub use key::{CursorQuery, CursorSource, IndexKey, KeyRange};
pub use repository::{
    repositories, SqliteCategoryRepository, SqliteItemRepository, SqliteMealRepository,
    SqliteRecipeRepository, SqliteUnitRepository,
};
pub use schema::{IndexDef, StoreDef, SCHEMA_VERSION};
pub use store::EntityStore;
