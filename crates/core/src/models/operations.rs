//! Validation and normalization applied before any entity reaches storage.
//!
//! Each `prepare_*` function checks the entity's invariants and returns the
//! normalized copy that gets persisted. Backends call these and nothing else,
//! so every backend enforces the same rules.

use chrono::{DateTime, SubsecRound, Utc};

use super::error::ValidationError;
use super::types::{Category, Item, ItemType, Meal, Recipe, Unit};

/// Current time truncated to the millisecond precision of stored timestamps.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Normalizes a name for storage and lookup. Uniqueness is case-insensitive
/// because every stored name goes through here.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

fn require_id(entity_type: &'static str, id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::EmptyId { entity_type });
    }
    Ok(())
}

fn require_name(entity_type: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName { entity_type });
    }
    Ok(())
}

fn require_servings(entity_type: &'static str, servings: u32) -> Result<(), ValidationError> {
    if servings == 0 {
        return Err(ValidationError::NonPositiveServings { entity_type });
    }
    Ok(())
}

/// Validates a category and lowercases its name.
pub fn prepare_category(category: &Category) -> Result<Category, ValidationError> {
    require_id("Category", &category.id)?;
    require_name("Category", &category.name)?;
    if let Some(sort_order) = category.sort_order {
        if sort_order < 0 {
            return Err(ValidationError::NegativeSortOrder(sort_order));
        }
    }

    let mut normalized = category.clone();
    normalized.name = normalize_name(&category.name);
    Ok(normalized)
}

/// Validates a unit and lowercases its name.
pub fn prepare_unit(unit: &Unit) -> Result<Unit, ValidationError> {
    require_id("Unit", &unit.id)?;
    require_name("Unit", &unit.name)?;

    let mut normalized = unit.clone();
    normalized.name = normalize_name(&unit.name);
    Ok(normalized)
}

/// Validates an item and lowercases its name.
///
/// The category reference is only checked for presence; whether it points at
/// an existing category is not verified.
pub fn prepare_item(item: &Item) -> Result<Item, ValidationError> {
    require_id("Item", &item.id)?;
    require_name("Item", &item.name)?;
    if item.category_id.trim().is_empty() {
        return Err(ValidationError::MissingCategory);
    }

    match (item.item_type, &item.ready_meal_data) {
        (ItemType::ReadyMeal, None) => return Err(ValidationError::MissingReadyMealData),
        (ItemType::ReadyMeal, Some(data)) => require_servings("Ready meal", data.servings)?,
        (other, Some(_)) => return Err(ValidationError::UnexpectedReadyMealData(other.as_str())),
        (_, None) => {}
    }

    let mut normalized = item.clone();
    normalized.name = normalize_name(&item.name);
    Ok(normalized)
}

/// Validates a recipe and lowercases its name.
///
/// Ingredient items are expected to be of type ingredient, but that is a
/// caller contract and is not checked here.
pub fn prepare_recipe(recipe: &Recipe) -> Result<Recipe, ValidationError> {
    require_id("Recipe", &recipe.id)?;
    require_name("Recipe", &recipe.name)?;

    if recipe.steps.is_empty() {
        return Err(ValidationError::NoSteps);
    }
    if let Some(index) = recipe.steps.iter().position(|s| s.trim().is_empty()) {
        return Err(ValidationError::EmptyStep(index));
    }

    if recipe.ingredients.is_empty() {
        return Err(ValidationError::NoIngredients);
    }
    for (index, ingredient) in recipe.ingredients.iter().enumerate() {
        if ingredient.item_id.trim().is_empty() || ingredient.unit_id.trim().is_empty() {
            return Err(ValidationError::IncompleteIngredient(index));
        }
        if !ingredient.quantity.is_finite() || ingredient.quantity <= 0.0 {
            return Err(ValidationError::NonPositiveQuantity(index));
        }
    }

    require_servings("Recipe", recipe.servings)?;

    let mut normalized = recipe.clone();
    normalized.name = normalize_name(&recipe.name);
    Ok(normalized)
}

/// Validates a meal. Meals carry no name, so nothing is normalized.
pub fn prepare_meal(meal: &Meal) -> Result<Meal, ValidationError> {
    require_id("Meal", &meal.id)?;

    if meal.dishes.is_empty() {
        return Err(ValidationError::NoDishes);
    }
    for (index, dish) in meal.dishes.iter().enumerate() {
        let recipe = dish.recipe_id.as_deref().is_some_and(|id| !id.trim().is_empty());
        let ready_meal = dish
            .ready_meal_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        if recipe == ready_meal {
            return Err(ValidationError::AmbiguousDish(index));
        }
    }

    require_servings("Meal", meal.servings)?;

    Ok(meal.clone())
}
