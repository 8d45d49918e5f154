use serde::{de::DeserializeOwned, Serialize};

use crate::codec;
use crate::models::{
    prepare_category, prepare_item, prepare_meal, prepare_recipe, prepare_unit, Category, Item,
    Meal, Recipe, Unit, ValidationError,
};

use super::StoreName;

/// A domain type persisted in its own object store.
///
/// Backends are written once against this trait: it ties a type to its
/// store, its error label and its write-time rules.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const STORE: StoreName;
    /// Name used in error messages.
    const ENTITY_TYPE: &'static str = Self::STORE.entity_type();
    const TIMESTAMP_FIELDS: &'static [&'static str] = codec::TIMESTAMP_FIELDS;

    fn id(&self) -> &str;

    /// Value of the unique `name` index, for stores that have one.
    fn unique_name(&self) -> Option<&str> {
        None
    }

    /// Human-readable label used when a delete is refused.
    fn label(&self) -> &str {
        self.id()
    }

    /// Validates and normalizes the entity before it is written.
    fn prepare(&self) -> Result<Self, ValidationError>;
}

impl Entity for Category {
    const STORE: StoreName = StoreName::Categories;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn prepare(&self) -> Result<Self, ValidationError> {
        prepare_category(self)
    }
}

impl Entity for Unit {
    const STORE: StoreName = StoreName::Units;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn prepare(&self) -> Result<Self, ValidationError> {
        prepare_unit(self)
    }
}

impl Entity for Item {
    const STORE: StoreName = StoreName::Items;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn prepare(&self) -> Result<Self, ValidationError> {
        prepare_item(self)
    }
}

impl Entity for Recipe {
    const STORE: StoreName = StoreName::Recipes;

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn prepare(&self) -> Result<Self, ValidationError> {
        prepare_recipe(self)
    }
}

impl Entity for Meal {
    const STORE: StoreName = StoreName::Meals;

    fn id(&self) -> &str {
        &self.id
    }

    fn prepare(&self) -> Result<Self, ValidationError> {
        prepare_meal(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_only_named_stores_expose_a_unique_name() {
        let category = Category::new("cat-1", "dairy");
        let recipe = crate::models::Recipe::new(
            "recipe-1",
            "soup",
            crate::models::DishType::Lunch,
            crate::models::CourseType::Starter,
            2,
        );
        let meal = Meal::new("meal-1", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), 2);

        assert_eq!(category.unique_name(), Some("dairy"));
        assert_eq!(recipe.unique_name(), None);
        assert_eq!(meal.unique_name(), None);
    }

    #[test]
    fn test_labels_prefer_names() {
        let category = Category::new("cat-1", "dairy");
        let meal = Meal::new("meal-1", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), 2);

        assert_eq!(category.label(), "dairy");
        assert_eq!(meal.label(), "meal-1");
    }

    #[test]
    fn test_prepare_dispatches_to_entity_rules() {
        let prepared = Category::new("cat-1", "Dairy").prepare().unwrap();
        assert_eq!(prepared.name, "dairy");

        let err = Unit::new("unit-1", "  ", crate::models::UnitType::Count)
            .prepare()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptyName {
                entity_type: "Unit"
            }
        );
    }
}
