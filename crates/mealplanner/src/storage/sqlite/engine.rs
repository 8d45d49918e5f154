//! Object-store engine over SQLite.
//!
//! The engine owns a `tokio_rusqlite::Connection` and exposes scoped
//! transactions. Operations inside a transaction run synchronously on the
//! connection thread against [`ObjectStore`] handles; the transaction commits
//! when the operation returns `Ok` and rolls back otherwise.

use std::time::Duration;

use rusqlite::{params_from_iter, OptionalExtension, TransactionBehavior};
use tokio_rusqlite::Connection;
use tracing::{info, trace, warn};

use mealplanner_core::codec::{self, Record};
use mealplanner_core::storage::{RepositoryError, Result, StoreName};

use crate::config::DatabaseConfig;

use super::error::{
    is_busy, map_rusqlite_error, map_tokio_rusqlite_error, map_write_error, wrap_err,
};
use super::key::{CursorQuery, CursorSource, IndexKey, KeyRange};
use super::schema::{self, StoreDef, SCHEMA_VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

impl TransactionMode {
    fn behavior(self) -> TransactionBehavior {
        match self {
            TransactionMode::ReadOnly => TransactionBehavior::Deferred,
            TransactionMode::ReadWrite => TransactionBehavior::Immediate,
        }
    }
}

/// Handle to an open database. Clones share the same connection.
#[derive(Clone)]
pub struct StorageEngine {
    conn: Connection,
}

impl StorageEngine {
    /// Opens the database described by `config`, creating and upgrading the
    /// schema as needed.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory().await
        } else {
            Connection::open(&config.path).await
        }
        .map_err(|e| RepositoryError::Storage(format!("Cannot open database: {e}")))?;

        let engine = Self { conn };
        engine.upgrade(config.busy_timeout).await?;

        info!(
            path = %config.path.display(),
            version = SCHEMA_VERSION,
            "Opened database"
        );
        Ok(engine)
    }

    /// Opens a private in-memory database.
    pub async fn open_in_memory() -> Result<Self> {
        Self::open(&DatabaseConfig::in_memory()).await
    }

    /// Brings the schema up to [`SCHEMA_VERSION`].
    ///
    /// The version check is repeated under the write lock so concurrent
    /// openers upgrade at most once.
    async fn upgrade(&self, busy_timeout: Duration) -> Result<()> {
        let outcome = self
            .conn
            .call(move |conn| {
                conn.busy_timeout(busy_timeout).map_err(wrap_err)?;

                // An exclusive lock elsewhere already blocks this first read.
                let current = match user_version(conn) {
                    Ok(version) => version,
                    Err(e) if is_busy(&e) => return Ok(Err(RepositoryError::SchemaBlocked)),
                    Err(e) => return Err(wrap_err(e)),
                };
                if current == SCHEMA_VERSION {
                    return Ok(Ok(None));
                }
                if current > SCHEMA_VERSION {
                    return Ok(Err(RepositoryError::Storage(format!(
                        "Database schema version {current} is newer than supported version {SCHEMA_VERSION}"
                    ))));
                }

                let tx = match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
                    Ok(tx) => tx,
                    Err(e) if is_busy(&e) => return Ok(Err(RepositoryError::SchemaBlocked)),
                    Err(e) => return Err(wrap_err(e)),
                };

                let current = user_version(&tx).map_err(wrap_err)?;
                if current < SCHEMA_VERSION {
                    for statement in schema::create_statements() {
                        tx.execute_batch(&statement).map_err(wrap_err)?;
                    }
                    tx.pragma_update(None, "user_version", SCHEMA_VERSION)
                        .map_err(wrap_err)?;
                }

                match tx.commit() {
                    Ok(()) => Ok(Ok(Some(current))),
                    Err(e) if is_busy(&e) => Ok(Err(RepositoryError::SchemaBlocked)),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(map_tokio_rusqlite_error)?;

        match outcome {
            Ok(Some(from)) => {
                info!(from, to = SCHEMA_VERSION, "Upgraded database schema");
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(RepositoryError::SchemaBlocked) => {
                warn!("Database upgrade blocked by another connection");
                Err(RepositoryError::SchemaBlocked)
            }
            Err(e) => Err(e),
        }
    }

    /// Current value of the schema version pragma.
    pub async fn schema_version(&self) -> Result<i64> {
        self.conn
            .call(|conn| user_version(conn).map_err(wrap_err))
            .await
            .map_err(map_tokio_rusqlite_error)
    }

    /// Closes the connection. Clones of this engine stop working.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await.map_err(map_tokio_rusqlite_error)?;
        info!("Closed database");
        Ok(())
    }

    /// Runs `op` inside one transaction over the stores in `scope`.
    pub async fn transaction<T, F>(
        &self,
        scope: Vec<StoreName>,
        mode: TransactionMode,
        op: F,
    ) -> Result<T>
    where
        F: FnOnce(&StoreTransaction<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        trace!(?scope, ?mode, "Beginning transaction");

        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(mode.behavior())
                    .map_err(wrap_err)?;
                let result = op(&StoreTransaction {
                    conn: &tx,
                    scope: &scope,
                    mode,
                });
                if result.is_ok() {
                    tx.commit().map_err(wrap_err)?;
                }
                Ok(result)
            })
            .await
            .map_err(map_tokio_rusqlite_error)?;

        trace!(committed = outcome.is_ok(), "Finished transaction");
        outcome
    }

    /// Runs `op` against one store in a read-only transaction.
    pub async fn read<T, F>(&self, store: StoreName, op: F) -> Result<T>
    where
        F: FnOnce(&ObjectStore<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.transaction(vec![store], TransactionMode::ReadOnly, move |tx| {
            op(&tx.store(store)?)
        })
        .await
    }

    /// Runs `op` against one store in a read-write transaction.
    pub async fn write<T, F>(&self, store: StoreName, op: F) -> Result<T>
    where
        F: FnOnce(&ObjectStore<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.transaction(vec![store], TransactionMode::ReadWrite, move |tx| {
            op(&tx.store(store)?)
        })
        .await
    }

    /// Collects every record a cursor over `store` visits, in cursor order.
    pub async fn cursor_query(&self, store: StoreName, query: CursorQuery) -> Result<Vec<Record>> {
        self.read(store, move |store| store.open_cursor(&query)).await
    }
}

fn user_version(conn: &rusqlite::Connection) -> rusqlite::Result<i64> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// An open transaction limited to a set of stores.
pub struct StoreTransaction<'a> {
    conn: &'a rusqlite::Connection,
    scope: &'a [StoreName],
    mode: TransactionMode,
}

impl<'a> StoreTransaction<'a> {
    pub fn store(&self, name: StoreName) -> Result<ObjectStore<'a>> {
        if !self.scope.contains(&name) {
            return Err(RepositoryError::Storage(format!(
                "Store {name} is not part of this transaction"
            )));
        }
        Ok(ObjectStore {
            conn: self.conn,
            def: schema::store_def(name),
            mode: self.mode,
        })
    }
}

/// One store inside an open transaction.
pub struct ObjectStore<'a> {
    conn: &'a rusqlite::Connection,
    def: &'static StoreDef,
    mode: TransactionMode,
}

impl ObjectStore<'_> {
    pub fn get(&self, id: &str) -> Result<Option<Record>> {
        let sql = format!("SELECT record FROM {} WHERE id = ?1", self.def.table());
        let text: Option<String> = self
            .conn
            .query_row(&sql, [id], |row| row.get(0))
            .optional()
            .map_err(map_rusqlite_error)?;

        text.map(|text| codec::decode_record(&text).map_err(RepositoryError::from))
            .transpose()
    }

    pub fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.def.table());
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(map_rusqlite_error)?;
        Ok(count as u64)
    }

    /// Inserts a new record. Fails with `AlreadyExists` when the key or a
    /// unique index value is taken.
    pub fn add(&self, record: &Record) -> Result<()> {
        self.require_write()?;
        let id = codec::record_key(record)?;
        if self.get(id)?.is_some() {
            return Err(RepositoryError::AlreadyExists {
                entity_type: self.def.name.entity_type(),
                key: id.to_string(),
            });
        }

        let sql = format!("INSERT INTO {} (id, record) VALUES (?1, ?2)", self.def.table());
        self.execute_write(&sql, record)
    }

    /// Inserts or replaces the record stored under its key.
    pub fn put(&self, record: &Record) -> Result<()> {
        self.require_write()?;
        let sql = format!(
            "INSERT INTO {} (id, record) VALUES (?1, ?2) \
             ON CONFLICT(id) DO UPDATE SET record = excluded.record",
            self.def.table()
        );
        self.execute_write(&sql, record)
    }

    /// Removes the record stored under `id`. Returns whether one existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        self.require_write()?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.def.table());
        let removed = self.conn.execute(&sql, [id]).map_err(map_rusqlite_error)?;
        Ok(removed > 0)
    }

    /// First record in index order whose key equals `key`.
    pub fn index_get(&self, index: &str, key: impl Into<IndexKey>) -> Result<Option<Record>> {
        let query = CursorQuery::index(self.index_name(index)?, KeyRange::only(key));
        let (sql, params) = self.select_sql(&query, "record")?;
        let text: Option<String> = self
            .conn
            .query_row(&format!("{sql} LIMIT 1"), params_from_iter(params.iter()), |row| {
                row.get(0)
            })
            .optional()
            .map_err(map_rusqlite_error)?;

        text.map(|text| codec::decode_record(&text).map_err(RepositoryError::from))
            .transpose()
    }

    /// Number of records whose index key falls in `range`.
    pub fn index_count(&self, index: &str, range: KeyRange) -> Result<u64> {
        let query = CursorQuery::index(self.index_name(index)?, range);
        let (sql, params) = self.select_sql(&query, "COUNT(*)")?;
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))
            .map_err(map_rusqlite_error)?;
        Ok(count as u64)
    }

    /// Visits every record in the query's range, in cursor order.
    pub fn open_cursor(&self, query: &CursorQuery) -> Result<Vec<Record>> {
        let (sql, params) = self.select_sql(query, "record")?;
        let mut stmt = self.conn.prepare(&sql).map_err(map_rusqlite_error)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| row.get::<_, String>(0))
            .map_err(map_rusqlite_error)?;

        let mut records = Vec::new();
        for row in rows {
            let text = row.map_err(map_rusqlite_error)?;
            records.push(codec::decode_record(&text)?);
        }
        Ok(records)
    }

    fn require_write(&self) -> Result<()> {
        match self.mode {
            TransactionMode::ReadWrite => Ok(()),
            TransactionMode::ReadOnly => Err(RepositoryError::Storage(format!(
                "Store {} is opened read-only",
                self.def.name
            ))),
        }
    }

    fn execute_write(&self, sql: &str, record: &Record) -> Result<()> {
        let id = codec::record_key(record)?;
        let text = codec::encode_record(record)?;
        let key = record
            .get("name")
            .and_then(|name| name.as_str())
            .unwrap_or(id);

        self.conn
            .execute(sql, [id, text.as_str()])
            .map_err(|e| map_write_error(e, self.def.name.entity_type(), key))?;
        Ok(())
    }

    fn index_name(&self, index: &str) -> Result<&'static str> {
        self.def.index(index).map(|def| def.name).ok_or_else(|| {
            RepositoryError::Storage(format!("Store {} has no index {index}", self.def.name))
        })
    }

    /// Builds `SELECT <columns> FROM <table> WHERE <range> ORDER BY <cursor order>`.
    fn select_sql(&self, query: &CursorQuery, columns: &str) -> Result<(String, Vec<IndexKey>)> {
        let key_expressions = match &query.source {
            CursorSource::Store => vec!["id".to_string()],
            CursorSource::Index(name) => self
                .def
                .index(name)
                .ok_or_else(|| {
                    RepositoryError::Storage(format!("Store {} has no index {name}", self.def.name))
                })?
                .key_expressions(),
        };

        let (condition, params) = match &query.range {
            KeyRange::All => (None, Vec::new()),
            KeyRange::Only(keys) => {
                if keys.len() != key_expressions.len() {
                    return Err(RepositoryError::Storage(format!(
                        "Key has {} components, expected {}",
                        keys.len(),
                        key_expressions.len()
                    )));
                }
                let condition = key_expressions
                    .iter()
                    .enumerate()
                    .map(|(i, expr)| format!("{expr} = ?{}", i + 1))
                    .collect::<Vec<_>>()
                    .join(" AND ");
                (Some(condition), keys.clone())
            }
            KeyRange::Bound { lower, upper } => {
                if key_expressions.len() != 1 {
                    return Err(RepositoryError::Storage(
                        "Bounded ranges need a single-component key".to_string(),
                    ));
                }
                (
                    Some(format!("{} BETWEEN ?1 AND ?2", key_expressions[0])),
                    vec![lower.clone(), upper.clone()],
                )
            }
        };

        let mut order = key_expressions;
        if order.last().map(String::as_str) != Some("id") {
            order.push("id".to_string());
        }

        let mut sql = format!("SELECT {columns} FROM {}", self.def.table());
        if let Some(condition) = condition {
            sql.push_str(" WHERE ");
            sql.push_str(&condition);
        }
        if !columns.starts_with("COUNT") {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        Ok((sql, params))
    }
}
