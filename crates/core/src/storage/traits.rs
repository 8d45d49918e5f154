use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Category, CourseType, DishType, Item, ItemType, Meal, Recipe, Unit, UnitType};

use super::{DateRange, Result};

/// Operations shared by every entity repository.
///
/// Validation and integrity failures are errors; a missing id is a `None`
/// or `false`, except for `update` where it is [`RepositoryError::NotFound`].
///
/// [`RepositoryError::NotFound`]: super::RepositoryError::NotFound
#[async_trait]
pub trait BaseRepository<T>: Send + Sync {
    /// Validates, normalizes and inserts a new entity, returning what was
    /// stored.
    async fn create(&self, entity: &T) -> Result<T>;

    async fn get_by_id(&self, id: &str) -> Result<Option<T>>;

    /// Every entity, in primary-key order.
    async fn get_all(&self) -> Result<Vec<T>>;

    async fn count(&self) -> Result<u64>;

    /// Replaces an existing entity as a whole.
    async fn update(&self, entity: &T) -> Result<T>;

    /// Removes an entity. Returns `false` when there was nothing to remove.
    async fn delete(&self, id: &str) -> Result<bool>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category> {
    /// Case-insensitive lookup by name.
    async fn get_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// Categories by sort order, unsorted last, then by name.
    async fn get_all_sorted(&self) -> Result<Vec<Category>>;
}

#[async_trait]
pub trait UnitRepository: BaseRepository<Unit> {
    async fn get_by_name(&self, name: &str) -> Result<Option<Unit>>;

    async fn get_by_type(&self, unit_type: UnitType) -> Result<Vec<Unit>>;
}

#[async_trait]
pub trait ItemRepository: BaseRepository<Item> {
    async fn get_by_name(&self, name: &str) -> Result<Option<Item>>;

    async fn get_by_category(&self, category_id: &str) -> Result<Vec<Item>>;

    async fn get_by_item_type(&self, item_type: ItemType) -> Result<Vec<Item>>;

    /// Ready meals served as the given dish.
    async fn get_ready_meals_by_dish(&self, dish: DishType) -> Result<Vec<Item>>;
}

#[async_trait]
pub trait RecipeRepository: BaseRepository<Recipe> {
    /// First recipe with the name, in index order. Recipe names are not
    /// unique.
    async fn get_by_name(&self, name: &str) -> Result<Option<Recipe>>;

    async fn get_by_dish(&self, dish: DishType) -> Result<Vec<Recipe>>;

    async fn get_by_course(&self, course: CourseType) -> Result<Vec<Recipe>>;
}

#[async_trait]
pub trait MealRepository: BaseRepository<Meal> {
    async fn get_by_date(&self, date: NaiveDate) -> Result<Vec<Meal>>;

    /// Meals in the inclusive range, ordered by date then id.
    async fn get_by_date_range(&self, range: DateRange) -> Result<Vec<Meal>>;
}

/// The five repositories bound to one open connection.
#[derive(Clone)]
pub struct Repositories {
    pub categories: Arc<dyn CategoryRepository>,
    pub units: Arc<dyn UnitRepository>,
    pub items: Arc<dyn ItemRepository>,
    pub recipes: Arc<dyn RecipeRepository>,
    pub meals: Arc<dyn MealRepository>,
}

/// Entry point owning the storage lifecycle.
///
/// Accessors fail with [`RepositoryError::NotInitialized`] before
/// `initialize` and after `close`.
///
/// [`RepositoryError::NotInitialized`]: super::RepositoryError::NotInitialized
#[async_trait]
pub trait Database: Send + Sync {
    /// Opens the store. A no-op when already open.
    async fn initialize(&self) -> Result<()>;

    /// Releases the store. A no-op when already closed.
    async fn close(&self) -> Result<()>;

    fn categories(&self) -> Result<Arc<dyn CategoryRepository>>;

    fn units(&self) -> Result<Arc<dyn UnitRepository>>;

    fn items(&self) -> Result<Arc<dyn ItemRepository>>;

    fn recipes(&self) -> Result<Arc<dyn RecipeRepository>>;

    fn meals(&self) -> Result<Arc<dyn MealRepository>>;
}
