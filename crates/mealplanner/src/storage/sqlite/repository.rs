//! SQLite repository implementation.
//!
//! Implements the entity-specific repository traits from
//! `mealplanner_core::storage` on top of [`EntityStore`]. The shared CRUD
//! contract comes from `EntityStore`'s `BaseRepository` impl.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use mealplanner_core::models::{
    normalize_name, sort_categories, Category, CourseType, DishType, Item, ItemType, Meal, Recipe,
    Unit, UnitType,
};
use mealplanner_core::storage::{
    BaseRepository, CategoryRepository, DateRange, ItemRepository, MealRepository,
    RecipeRepository, Repositories, Result, UnitRepository,
};

use super::engine::StorageEngine;
use super::key::{CursorQuery, IndexKey, KeyRange};
use super::store::{EntityStore, NAME_INDEX};

pub type SqliteCategoryRepository = EntityStore<Category>;
pub type SqliteUnitRepository = EntityStore<Unit>;
pub type SqliteItemRepository = EntityStore<Item>;
pub type SqliteRecipeRepository = EntityStore<Recipe>;
pub type SqliteMealRepository = EntityStore<Meal>;

/// Builds the five repositories over one engine.
pub fn repositories(engine: &StorageEngine) -> Repositories {
    Repositories {
        categories: Arc::new(SqliteCategoryRepository::new(engine.clone())),
        units: Arc::new(SqliteUnitRepository::new(engine.clone())),
        items: Arc::new(SqliteItemRepository::new(engine.clone())),
        recipes: Arc::new(SqliteRecipeRepository::new(engine.clone())),
        meals: Arc::new(SqliteMealRepository::new(engine.clone())),
    }
}

fn name_key(name: &str) -> IndexKey {
    IndexKey::Text(normalize_name(name))
}

#[async_trait]
impl CategoryRepository for EntityStore<Category> {
    async fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.find_first(NAME_INDEX, name_key(name)).await
    }

    async fn get_all_sorted(&self) -> Result<Vec<Category>> {
        let mut categories = self.get_all().await?;
        sort_categories(&mut categories);
        Ok(categories)
    }
}

#[async_trait]
impl UnitRepository for EntityStore<Unit> {
    async fn get_by_name(&self, name: &str) -> Result<Option<Unit>> {
        self.find_first(NAME_INDEX, name_key(name)).await
    }

    async fn get_by_type(&self, unit_type: UnitType) -> Result<Vec<Unit>> {
        self.find_all("type", unit_type.as_str()).await
    }
}

#[async_trait]
impl ItemRepository for EntityStore<Item> {
    async fn get_by_name(&self, name: &str) -> Result<Option<Item>> {
        self.find_first(NAME_INDEX, name_key(name)).await
    }

    async fn get_by_category(&self, category_id: &str) -> Result<Vec<Item>> {
        self.find_all("categoryId", category_id).await
    }

    async fn get_by_item_type(&self, item_type: ItemType) -> Result<Vec<Item>> {
        self.find_all("itemType", item_type.as_str()).await
    }

    async fn get_ready_meals_by_dish(&self, dish: DishType) -> Result<Vec<Item>> {
        let range = KeyRange::Only(vec![
            ItemType::ReadyMeal.as_str().into(),
            dish.as_str().into(),
        ]);
        self.query(CursorQuery::index("itemType_dish", range)).await
    }
}

#[async_trait]
impl RecipeRepository for EntityStore<Recipe> {
    async fn get_by_name(&self, name: &str) -> Result<Option<Recipe>> {
        self.find_first(NAME_INDEX, name_key(name)).await
    }

    async fn get_by_dish(&self, dish: DishType) -> Result<Vec<Recipe>> {
        self.find_all("dish", dish.as_str()).await
    }

    async fn get_by_course(&self, course: CourseType) -> Result<Vec<Recipe>> {
        self.find_all("course", course.as_str()).await
    }
}

#[async_trait]
impl MealRepository for EntityStore<Meal> {
    async fn get_by_date(&self, date: NaiveDate) -> Result<Vec<Meal>> {
        self.find_all("date", date).await
    }

    async fn get_by_date_range(&self, range: DateRange) -> Result<Vec<Meal>> {
        let range = KeyRange::bound(range.start, range.end);
        self.query(CursorQuery::index("date", range)).await
    }
}
