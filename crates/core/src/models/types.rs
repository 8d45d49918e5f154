use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::operations::now_millis;

/// Kind of measurement a unit expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Weight,
    Volume,
    Count,
}

impl UnitType {
    /// Returns the persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Weight => "weight",
            UnitType::Volume => "volume",
            UnitType::Count => "count",
        }
    }
}

/// How an item is used by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Raw food that recipes can use.
    Ingredient,
    /// Pre-prepared food that can be planned directly into a meal.
    ReadyMeal,
    /// Household products that only ever appear on shopping lists.
    Inedible,
}

impl ItemType {
    /// Returns the persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Ingredient => "ingredient",
            ItemType::ReadyMeal => "ready_meal",
            ItemType::Inedible => "inedible",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DishType {
    Breakfast,
    Lunch,
    Dinner,
    Dessert,
}

impl DishType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DishType::Breakfast => "breakfast",
            DishType::Lunch => "lunch",
            DishType::Dinner => "dinner",
            DishType::Dessert => "dessert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseType {
    Starter,
    Main,
    Side,
}

impl CourseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseType::Starter => "starter",
            CourseType::Main => "main",
            CourseType::Side => "side",
        }
    }
}

/// A supermarket aisle or section used to group items on a shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    /// Unique, stored lowercased.
    pub name: String,
    /// Display position; lower values come first, absent values sort last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(with = "crate::serde::iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::serde::iso8601")]
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Creates a new category stamped with the current time.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            name: name.into(),
            sort_order: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the display position.
    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = Some(sort_order);
        self
    }
}

/// A unit of measurement used by recipe ingredients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    #[serde(with = "crate::serde::iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::serde::iso8601")]
    pub updated_at: DateTime<Utc>,
}

impl Unit {
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit_type: UnitType) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            name: name.into(),
            abbreviation: None,
            unit_type,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_abbreviation(mut self, abbreviation: impl Into<String>) -> Self {
        self.abbreviation = Some(abbreviation.into());
        self
    }
}

/// Metadata carried by items of type [`ItemType::ReadyMeal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyMealData {
    pub dish: DishType,
    pub course: CourseType,
    pub servings: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time_minutes: Option<u32>,
}

/// A product that can be bought at the supermarket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    /// Weak reference to a [`Category`].
    pub category_id: String,
    pub item_type: ItemType,
    /// Required iff `item_type` is [`ItemType::ReadyMeal`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_meal_data: Option<ReadyMealData>,
    #[serde(with = "crate::serde::iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::serde::iso8601")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Creates an ingredient item.
    pub fn ingredient(
        id: impl Into<String>,
        name: impl Into<String>,
        category_id: impl Into<String>,
    ) -> Self {
        Self::with_type(id, name, category_id, ItemType::Ingredient, None)
    }

    /// Creates an inedible item.
    pub fn inedible(
        id: impl Into<String>,
        name: impl Into<String>,
        category_id: impl Into<String>,
    ) -> Self {
        Self::with_type(id, name, category_id, ItemType::Inedible, None)
    }

    /// Creates a ready meal item with its metadata.
    pub fn ready_meal(
        id: impl Into<String>,
        name: impl Into<String>,
        category_id: impl Into<String>,
        data: ReadyMealData,
    ) -> Self {
        Self::with_type(id, name, category_id, ItemType::ReadyMeal, Some(data))
    }

    fn with_type(
        id: impl Into<String>,
        name: impl Into<String>,
        category_id: impl Into<String>,
        item_type: ItemType,
        ready_meal_data: Option<ReadyMealData>,
    ) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            name: name.into(),
            category_id: category_id.into(),
            item_type,
            ready_meal_data,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One line of a recipe's ingredient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    /// Weak reference to an [`Item`] of type ingredient.
    pub item_id: String,
    /// Weak reference to a [`Unit`].
    pub unit_id: String,
    pub quantity: f64,
}

impl RecipeIngredient {
    pub fn new(item_id: impl Into<String>, unit_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            item_id: item_id.into(),
            unit_id: unit_id.into(),
            quantity,
        }
    }
}

/// Instructions and ingredients for preparing a dish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Preparation steps in execution order.
    pub steps: Vec<String>,
    pub ingredients: Vec<RecipeIngredient>,
    pub dish: DishType,
    pub course: CourseType,
    pub servings: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time_minutes: Option<u32>,
    #[serde(with = "crate::serde::iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::serde::iso8601")]
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        dish: DishType,
        course: CourseType,
        servings: u32,
    ) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            steps: Vec::new(),
            ingredients: Vec::new(),
            dish,
            course,
            servings,
            prep_time_minutes: None,
            cook_time_minutes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.steps.push(step.into());
        self
    }

    pub fn with_ingredient(mut self, ingredient: RecipeIngredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A dish within a planned meal: either a recipe or a ready meal item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealDish {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_meal_id: Option<String>,
}

impl MealDish {
    /// A home-cooked dish.
    pub fn recipe(recipe_id: impl Into<String>) -> Self {
        Self {
            recipe_id: Some(recipe_id.into()),
            ready_meal_id: None,
        }
    }

    /// A pre-prepared dish.
    pub fn ready_meal(item_id: impl Into<String>) -> Self {
        Self {
            recipe_id: None,
            ready_meal_id: Some(item_id.into()),
        }
    }
}

/// A meal planned for a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: String,
    /// Stored as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub dishes: Vec<MealDish>,
    pub servings: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "crate::serde::iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::serde::iso8601")]
    pub updated_at: DateTime<Utc>,
}

impl Meal {
    pub fn new(id: impl Into<String>, date: NaiveDate, servings: u32) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            date,
            dishes: Vec::new(),
            servings,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_dish(mut self, dish: MealDish) -> Self {
        self.dishes.push(dish);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
