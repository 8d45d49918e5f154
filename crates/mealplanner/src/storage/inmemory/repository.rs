//! In-memory repository implementation.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use mealplanner_core::codec::{self, Record};
use mealplanner_core::models::{
    normalize_name, sort_categories, Category, CourseType, DishType, Item, ItemType, Meal, Recipe,
    Unit, UnitType,
};
use mealplanner_core::storage::integrity::{self, Enforcement};
use mealplanner_core::storage::{
    BaseRepository, CategoryRepository, DateRange, Entity, ItemRepository, MealRepository,
    RecipeRepository, Repositories, RepositoryError, Result, StoreName, UnitRepository,
};

type Table = BTreeMap<String, Record>;

/// Records of every store, keyed by id.
///
/// One lock covers all stores so a delete can count references in other
/// stores atomically with the removal.
#[derive(Debug, Default)]
pub struct InMemoryState {
    stores: RwLock<BTreeMap<StoreName, Table>>,
}

impl InMemoryState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// In-memory storage backend for testing.
///
/// Stores the same encoded records as the SQLite backend and applies the
/// same rules, so tests written against one hold for the other.
pub struct InMemoryRepository<E> {
    state: Arc<InMemoryState>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for InMemoryRepository<E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            _entity: PhantomData,
        }
    }
}

/// Builds the five repositories over shared state.
pub fn repositories(state: &Arc<InMemoryState>) -> Repositories {
    Repositories {
        categories: Arc::new(InMemoryRepository::<Category>::new(state.clone())),
        units: Arc::new(InMemoryRepository::<Unit>::new(state.clone())),
        items: Arc::new(InMemoryRepository::<Item>::new(state.clone())),
        recipes: Arc::new(InMemoryRepository::<Recipe>::new(state.clone())),
        meals: Arc::new(InMemoryRepository::<Meal>::new(state.clone())),
    }
}

fn decode<E: Entity>(record: &Record) -> Result<E> {
    Ok(codec::deserialize(record.clone(), E::TIMESTAMP_FIELDS)?)
}

fn name_taken<E: Entity>(table: &Table, name: &str, except_id: Option<&str>) -> Result<bool> {
    for (id, record) in table {
        if Some(id.as_str()) == except_id {
            continue;
        }
        if decode::<E>(record)?.unique_name() == Some(name) {
            return Ok(true);
        }
    }
    Ok(false)
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new(state: Arc<InMemoryState>) -> Self {
        Self {
            state,
            _entity: PhantomData,
        }
    }

    /// Entities matching `predicate`, in key order.
    async fn filter(&self, predicate: impl Fn(&E) -> bool + Send) -> Result<Vec<E>> {
        let stores = self.state.stores.read().await;
        let mut matches = Vec::new();
        if let Some(table) = stores.get(&E::STORE) {
            for record in table.values() {
                let entity: E = decode(record)?;
                if predicate(&entity) {
                    matches.push(entity);
                }
            }
        }
        Ok(matches)
    }

    /// First entity in key order matching `predicate`.
    async fn find_first(&self, predicate: impl Fn(&E) -> bool + Send) -> Result<Option<E>> {
        Ok(self.filter(predicate).await?.into_iter().next())
    }
}

#[async_trait]
impl<E: Entity> BaseRepository<E> for InMemoryRepository<E> {
    async fn create(&self, entity: &E) -> Result<E> {
        let prepared = entity.prepare()?;
        let record = codec::serialize(&prepared)?;

        let mut stores = self.state.stores.write().await;
        let table = stores.entry(E::STORE).or_default();
        if let Some(name) = prepared.unique_name() {
            if name_taken::<E>(table, name, None)? {
                return Err(RepositoryError::AlreadyExists {
                    entity_type: E::ENTITY_TYPE,
                    key: name.to_string(),
                });
            }
        }
        if table.contains_key(prepared.id()) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: E::ENTITY_TYPE,
                key: prepared.id().to_string(),
            });
        }
        table.insert(prepared.id().to_string(), record);

        debug!(store = %E::STORE, id = prepared.id(), "Created record");
        Ok(prepared)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<E>> {
        let stores = self.state.stores.read().await;
        stores
            .get(&E::STORE)
            .and_then(|table| table.get(id))
            .map(decode)
            .transpose()
    }

    async fn get_all(&self) -> Result<Vec<E>> {
        self.filter(|_| true).await
    }

    async fn count(&self) -> Result<u64> {
        let stores = self.state.stores.read().await;
        Ok(stores.get(&E::STORE).map_or(0, |table| table.len() as u64))
    }

    async fn update(&self, entity: &E) -> Result<E> {
        let prepared = entity.prepare()?;
        let record = codec::serialize(&prepared)?;

        let mut stores = self.state.stores.write().await;
        let table = stores.entry(E::STORE).or_default();
        if !table.contains_key(prepared.id()) {
            return Err(RepositoryError::NotFound {
                entity_type: E::ENTITY_TYPE,
                id: prepared.id().to_string(),
            });
        }
        if let Some(name) = prepared.unique_name() {
            if name_taken::<E>(table, name, Some(prepared.id()))? {
                return Err(RepositoryError::AlreadyExists {
                    entity_type: E::ENTITY_TYPE,
                    key: name.to_string(),
                });
            }
        }
        table.insert(prepared.id().to_string(), record);

        debug!(store = %E::STORE, id = prepared.id(), "Updated record");
        Ok(prepared)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut stores = self.state.stores.write().await;
        let Some(record) = stores.get(&E::STORE).and_then(|table| table.get(id)) else {
            return Ok(false);
        };
        let entity: E = decode(record)?;

        for reference in integrity::references_to(E::STORE) {
            if reference.enforcement == Enforcement::Unchecked {
                debug!(
                    store = %E::STORE,
                    referencing = %reference.referencing,
                    key_path = reference.key_path,
                    id,
                    "Skipping unchecked reference"
                );
                continue;
            }

            let count = stores
                .get(&reference.referencing)
                .map_or(0, |table| {
                    table.values().filter(|r| reference.matches(r, id)).count()
                }) as u64;
            if count > 0 {
                warn!(
                    store = %E::STORE,
                    id,
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

        if let Some(table) = stores.get_mut(&E::STORE) {
            table.remove(id);
        }
        debug!(store = %E::STORE, id, "Deleted record");
        Ok(true)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryRepository<Category> {
    async fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        let name = normalize_name(name);
        self.find_first(|category| category.name == name).await
    }

    async fn get_all_sorted(&self) -> Result<Vec<Category>> {
        let mut categories = self.get_all().await?;
        sort_categories(&mut categories);
        Ok(categories)
    }
}

#[async_trait]
impl UnitRepository for InMemoryRepository<Unit> {
    async fn get_by_name(&self, name: &str) -> Result<Option<Unit>> {
        let name = normalize_name(name);
        self.find_first(|unit| unit.name == name).await
    }

    async fn get_by_type(&self, unit_type: UnitType) -> Result<Vec<Unit>> {
        self.filter(|unit| unit.unit_type == unit_type).await
    }
}

#[async_trait]
impl ItemRepository for InMemoryRepository<Item> {
    async fn get_by_name(&self, name: &str) -> Result<Option<Item>> {
        let name = normalize_name(name);
        self.find_first(|item| item.name == name).await
    }

    async fn get_by_category(&self, category_id: &str) -> Result<Vec<Item>> {
        self.filter(|item| item.category_id == category_id).await
    }

    async fn get_by_item_type(&self, item_type: ItemType) -> Result<Vec<Item>> {
        self.filter(|item| item.item_type == item_type).await
    }

    async fn get_ready_meals_by_dish(&self, dish: DishType) -> Result<Vec<Item>> {
        self.filter(|item| {
            item.item_type == ItemType::ReadyMeal
                && item.ready_meal_data.as_ref().map(|data| data.dish) == Some(dish)
        })
        .await
    }
}

#[async_trait]
impl RecipeRepository for InMemoryRepository<Recipe> {
    async fn get_by_name(&self, name: &str) -> Result<Option<Recipe>> {
        let name = normalize_name(name);
        self.find_first(|recipe| recipe.name == name).await
    }

    async fn get_by_dish(&self, dish: DishType) -> Result<Vec<Recipe>> {
        self.filter(|recipe| recipe.dish == dish).await
    }

    async fn get_by_course(&self, course: CourseType) -> Result<Vec<Recipe>> {
        self.filter(|recipe| recipe.course == course).await
    }
}

#[async_trait]
impl MealRepository for InMemoryRepository<Meal> {
    async fn get_by_date(&self, date: NaiveDate) -> Result<Vec<Meal>> {
        self.filter(|meal| meal.date == date).await
    }

    async fn get_by_date_range(&self, range: DateRange) -> Result<Vec<Meal>> {
        let mut meals = self.filter(|meal| range.contains(meal.date)).await?;
        meals.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(meals)
    }
}
