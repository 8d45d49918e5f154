//! Entity-level access to one object store.
//!
//! `EntityStore<E>` validates and encodes entities and runs every
//! check-then-write sequence inside a single write transaction, so a
//! concurrent writer cannot slip in between the check and the write.

use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::{debug, warn};

use mealplanner_core::codec::{self, Record};
use mealplanner_core::storage::integrity::{self, Enforcement};
use mealplanner_core::storage::{BaseRepository, Entity, RepositoryError, Result};

use super::engine::{StorageEngine, TransactionMode};
use super::key::{CursorQuery, IndexKey, KeyRange};

/// Index backing name uniqueness and lookups.
pub const NAME_INDEX: &str = "name";

pub struct EntityStore<E> {
    engine: StorageEngine,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            _entity: PhantomData,
        }
    }
}

fn decode<E: Entity>(record: Record) -> Result<E> {
    Ok(codec::deserialize(record, E::TIMESTAMP_FIELDS)?)
}

fn decode_all<E: Entity>(records: Vec<Record>) -> Result<Vec<E>> {
    records.into_iter().map(decode).collect()
}

impl<E: Entity> EntityStore<E> {
    pub fn new(engine: StorageEngine) -> Self {
        Self {
            engine,
            _entity: PhantomData,
        }
    }

    /// Entities visited by `query`, in cursor order.
    pub async fn query(&self, query: CursorQuery) -> Result<Vec<E>> {
        let records = self.engine.cursor_query(E::STORE, query).await?;
        decode_all(records)
    }

    /// First entity in index order whose key equals `key`.
    pub async fn find_first(&self, index: &'static str, key: IndexKey) -> Result<Option<E>> {
        let record = self
            .engine
            .read(E::STORE, move |store| store.index_get(index, key))
            .await?;
        record.map(decode).transpose()
    }

    /// Entities whose `index` key equals `key`.
    pub async fn find_all(&self, index: &'static str, key: impl Into<IndexKey>) -> Result<Vec<E>> {
        self.query(CursorQuery::index(index, KeyRange::only(key)))
            .await
    }
}

#[async_trait]
impl<E: Entity> BaseRepository<E> for EntityStore<E> {
    async fn create(&self, entity: &E) -> Result<E> {
        let prepared = entity.prepare()?;
        let record = codec::serialize(&prepared)?;
        let name = prepared.unique_name().map(str::to_owned);

        self.engine
            .write(E::STORE, move |store| {
                if let Some(name) = name {
                    if store.index_count(NAME_INDEX, KeyRange::only(name.as_str()))? > 0 {
                        return Err(RepositoryError::AlreadyExists {
                            entity_type: E::ENTITY_TYPE,
                            key: name,
                        });
                    }
                }
                store.add(&record)
            })
            .await?;

        debug!(store = %E::STORE, id = prepared.id(), "Created record");
        Ok(prepared)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<E>> {
        let id = id.to_string();
        let record = self
            .engine
            .read(E::STORE, move |store| store.get(&id))
            .await?;
        record.map(decode).transpose()
    }

    async fn get_all(&self) -> Result<Vec<E>> {
        self.query(CursorQuery::all()).await
    }

    async fn count(&self) -> Result<u64> {
        self.engine.read(E::STORE, |store| store.count()).await
    }

    async fn update(&self, entity: &E) -> Result<E> {
        let prepared = entity.prepare()?;
        let record = codec::serialize(&prepared)?;
        let id = prepared.id().to_string();
        let name = prepared.unique_name().map(str::to_owned);

        self.engine
            .write(E::STORE, move |store| {
                if store.get(&id)?.is_none() {
                    return Err(RepositoryError::NotFound {
                        entity_type: E::ENTITY_TYPE,
                        id,
                    });
                }
                if let Some(name) = name {
                    if let Some(existing) = store.index_get(NAME_INDEX, name.as_str())? {
                        if codec::record_key(&existing)? != id {
                            return Err(RepositoryError::AlreadyExists {
                                entity_type: E::ENTITY_TYPE,
                                key: name,
                            });
                        }
                    }
                }
                store.put(&record)
            })
            .await?;

        debug!(store = %E::STORE, id = prepared.id(), "Updated record");
        Ok(prepared)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let target = id.to_string();
        let id = target.clone();
        let scope = integrity::delete_scope(E::STORE);

        let removed = self
            .engine
            .transaction(scope, TransactionMode::ReadWrite, move |tx| {
                let store = tx.store(E::STORE)?;
                let Some(record) = store.get(&id)? else {
                    return Ok(false);
                };

                for reference in integrity::references_to(E::STORE) {
                    match (reference.enforcement, reference.index) {
                        (Enforcement::Unchecked, _) => {
                            debug!(
                                store = %E::STORE,
                                referencing = %reference.referencing,
                                key_path = reference.key_path,
                                id = %id,
                                "Skipping unchecked reference"
                            );
                        }
                        (Enforcement::Restrict, Some(index)) => {
                            let count = tx
                                .store(reference.referencing)?
                                .index_count(index, KeyRange::only(id.as_str()))?;
                            if count > 0 {
                                let entity: E = decode(record)?;
                                warn!(
                                    store = %E::STORE,
                                    id = %id,
                                    referencing = %reference.referencing,
                                    count,
                                    "Refusing to delete referenced record"
                                );
                                return Err(RepositoryError::ReferentialIntegrityViolation {
                                    store: E::STORE,
                                    label: entity.label().to_string(),
                                    referencing: reference.referencing,
                                    count,
                                });
                            }
                        }
                        (Enforcement::Restrict, None) => {
                            return Err(RepositoryError::Storage(format!(
                                "Reference from {} to {} has no index",
                                reference.referencing, reference.referenced
                            )));
                        }
                    }
                }

                store.delete(&id)
            })
            .await?;

        if removed {
            debug!(store = %E::STORE, id = %target, "Deleted record");
        }
        Ok(removed)
    }
}
