//! Database facade owning the connection lifecycle.
//!
//! [`MealPlannerDatabase`] is generic over a [`Backend`] that knows how to
//! connect and disconnect. The facade tracks whether it is open and hands
//! out the repositories bound to the live connection.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use mealplanner_core::storage::{
    CategoryRepository, Database, ItemRepository, MealRepository, RecipeRepository, Repositories,
    RepositoryError, Result, UnitRepository,
};

/// Opens and closes the storage behind a [`MealPlannerDatabase`].
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Whatever must be kept alive while the database is open.
    type Handle: Clone + Send + Sync + 'static;

    async fn connect(&self) -> Result<(Self::Handle, Repositories)>;

    async fn disconnect(&self, handle: Self::Handle) -> Result<()>;
}

enum ConnectionState<H> {
    Closed,
    Open {
        handle: H,
        repositories: Repositories,
    },
}

pub struct MealPlannerDatabase<B: Backend> {
    backend: B,
    /// Serializes `initialize` and `close`.
    lifecycle: Mutex<()>,
    state: RwLock<ConnectionState<B::Handle>>,
}

impl<B: Backend> MealPlannerDatabase<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            lifecycle: Mutex::new(()),
            state: RwLock::new(ConnectionState::Closed),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state
            .read()
            .map(|state| matches!(*state, ConnectionState::Open { .. }))
            .unwrap_or(false)
    }

    /// Backend handle of the open connection.
    pub fn handle(&self) -> Result<B::Handle> {
        self.with_open(|handle, _| handle.clone())
    }

    /// All five repositories of the open connection.
    pub fn repositories(&self) -> Result<Repositories> {
        self.with_open(|_, repositories| repositories.clone())
    }

    fn with_open<T>(&self, f: impl FnOnce(&B::Handle, &Repositories) -> T) -> Result<T> {
        let state = self.state.read().map_err(|_| poisoned())?;
        match &*state {
            ConnectionState::Open {
                handle,
                repositories,
            } => Ok(f(handle, repositories)),
            ConnectionState::Closed => Err(RepositoryError::NotInitialized),
        }
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Storage("Connection state lock poisoned".to_string())
}

#[async_trait]
impl<B: Backend> Database for MealPlannerDatabase<B> {
    async fn initialize(&self) -> Result<()> {
        let _guard = self.lifecycle.lock().await;
        if self.is_open() {
            debug!("Database already initialized");
            return Ok(());
        }

        let (handle, repositories) = self.backend.connect().await?;
        let mut state = self.state.write().map_err(|_| poisoned())?;
        *state = ConnectionState::Open {
            handle,
            repositories,
        };
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let _guard = self.lifecycle.lock().await;
        let previous = {
            let mut state = self.state.write().map_err(|_| poisoned())?;
            std::mem::replace(&mut *state, ConnectionState::Closed)
        };

        match previous {
            ConnectionState::Open { handle, .. } => self.backend.disconnect(handle).await,
            ConnectionState::Closed => Ok(()),
        }
    }

    fn categories(&self) -> Result<Arc<dyn CategoryRepository>> {
        self.with_open(|_, repositories| repositories.categories.clone())
    }

    fn units(&self) -> Result<Arc<dyn UnitRepository>> {
        self.with_open(|_, repositories| repositories.units.clone())
    }

    fn items(&self) -> Result<Arc<dyn ItemRepository>> {
        self.with_open(|_, repositories| repositories.items.clone())
    }

    fn recipes(&self) -> Result<Arc<dyn RecipeRepository>> {
        self.with_open(|_, repositories| repositories.recipes.clone())
    }

    fn meals(&self) -> Result<Arc<dyn MealRepository>> {
        self.with_open(|_, repositories| repositories.meals.clone())
    }
}

#[cfg(feature = "sqlite")]
mod sqlite_backend {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::storage::sqlite::{repositories, StorageEngine};

    /// Backend opening a [`StorageEngine`] per connection.
    pub struct SqliteBackend {
        config: DatabaseConfig,
    }

    impl SqliteBackend {
        pub fn new(config: DatabaseConfig) -> Self {
            Self { config }
        }
    }

    #[async_trait]
    impl Backend for SqliteBackend {
        type Handle = StorageEngine;

        async fn connect(&self) -> Result<(StorageEngine, Repositories)> {
            let engine = StorageEngine::open(&self.config).await?;
            let repositories = repositories(&engine);
            Ok((engine, repositories))
        }

        async fn disconnect(&self, engine: StorageEngine) -> Result<()> {
            engine.close().await
        }
    }

    pub type SqliteDatabase = MealPlannerDatabase<SqliteBackend>;

    impl SqliteDatabase {
        pub fn sqlite(config: DatabaseConfig) -> Self {
            Self::new(SqliteBackend::new(config))
        }
    }
}

#[cfg(feature = "sqlite")]
pub use sqlite_backend::{SqliteBackend, SqliteDatabase};

#[cfg(feature = "inmemory")]
mod inmemory_backend {
    use super::*;
    use crate::storage::inmemory::{repositories, InMemoryState};

    /// Backend over shared in-memory state. Data outlives close and
    /// reinitialize cycles of the same backend.
    #[derive(Default)]
    pub struct InMemoryBackend {
        state: Arc<InMemoryState>,
    }

    #[async_trait]
    impl Backend for InMemoryBackend {
        type Handle = ();

        async fn connect(&self) -> Result<((), Repositories)> {
            Ok(((), repositories(&self.state)))
        }

        async fn disconnect(&self, _handle: ()) -> Result<()> {
            Ok(())
        }
    }

    pub type InMemoryDatabase = MealPlannerDatabase<InMemoryBackend>;

    impl InMemoryDatabase {
        pub fn in_memory() -> Self {
            Self::new(InMemoryBackend::default())
        }
    }
}

#[cfg(feature = "inmemory")]
pub use inmemory_backend::{InMemoryBackend, InMemoryDatabase};

#[cfg(all(test, feature = "sqlite", feature = "inmemory"))]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use mealplanner_core::models::Category;

    fn assert_closed<D: Database>(db: &D) {
        assert!(matches!(db.categories(), Err(RepositoryError::NotInitialized)));
        assert!(matches!(db.units(), Err(RepositoryError::NotInitialized)));
        assert!(matches!(db.items(), Err(RepositoryError::NotInitialized)));
        assert!(matches!(db.recipes(), Err(RepositoryError::NotInitialized)));
        assert!(matches!(db.meals(), Err(RepositoryError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_accessors_fail_before_initialize() {
        assert_closed(&InMemoryDatabase::in_memory());
        assert_closed(&SqliteDatabase::sqlite(DatabaseConfig::in_memory()));
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let db = SqliteDatabase::sqlite(DatabaseConfig::in_memory());
        db.initialize().await.unwrap();
        db.categories()
            .unwrap()
            .create(&Category::new("cat-1", "Dairy"))
            .await
            .unwrap();

        // A second initialize must not swap in a fresh in-memory database.
        db.initialize().await.unwrap();

        assert_eq!(db.categories().unwrap().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_close_invalidates_accessors() {
        let db = SqliteDatabase::sqlite(DatabaseConfig::in_memory());
        db.initialize().await.unwrap();
        assert!(db.is_open());

        db.close().await.unwrap();

        assert!(!db.is_open());
        assert_closed(&db);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_repeated_cycles_reopen_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = SqliteDatabase::sqlite(DatabaseConfig::at(dir.path().join("plan.db")));

        for cycle in 0..3 {
            db.initialize().await.unwrap();
            let categories = db.categories().unwrap();
            assert_eq!(categories.count().await.unwrap(), cycle);
            categories
                .create(&Category::new(format!("cat-{cycle}"), format!("c{cycle}")))
                .await
                .unwrap();
            db.close().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_in_memory_data_survives_close() {
        let db = InMemoryDatabase::in_memory();
        db.initialize().await.unwrap();
        db.categories()
            .unwrap()
            .create(&Category::new("cat-1", "Dairy"))
            .await
            .unwrap();
        db.close().await.unwrap();
        assert_closed(&db);

        db.initialize().await.unwrap();

        let found = db.categories().unwrap().get_by_name("dairy").await.unwrap();
        assert_eq!(found.map(|c| c.id), Some("cat-1".to_string()));
    }

    #[tokio::test]
    async fn test_handle_exposes_the_engine() {
        let db = SqliteDatabase::sqlite(DatabaseConfig::in_memory());
        assert!(matches!(db.handle(), Err(RepositoryError::NotInitialized)));

        db.initialize().await.unwrap();
        let engine = db.handle().unwrap();

        assert_eq!(
            engine.schema_version().await.unwrap(),
            crate::storage::sqlite::SCHEMA_VERSION
        );
    }

    #[tokio::test]
    async fn test_facade_works_through_the_trait_object() {
        let db: Arc<dyn Database> = Arc::new(InMemoryDatabase::in_memory());
        db.initialize().await.unwrap();

        let repos = [db.categories().is_ok(), db.meals().is_ok()];

        assert_eq!(repos, [true, true]);
    }
}
