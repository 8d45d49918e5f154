use thiserror::Error;

/// Rule violations detected before an entity is written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{entity_type} id cannot be empty")]
    EmptyId { entity_type: &'static str },
    #[error("{entity_type} name cannot be empty or whitespace only")]
    EmptyName { entity_type: &'static str },
    #[error("Sort order must be non-negative, got {0}")]
    NegativeSortOrder(i64),
    #[error("Item must reference a category")]
    MissingCategory,
    #[error("Ready meal data is required when item type is ready_meal")]
    MissingReadyMealData,
    #[error("Ready meal data must be absent when item type is {0}")]
    UnexpectedReadyMealData(&'static str),
    #[error("{entity_type} servings must be a positive integer")]
    NonPositiveServings { entity_type: &'static str },
    #[error("Recipe must have at least one step")]
    NoSteps,
    #[error("Recipe step {0} cannot be empty")]
    EmptyStep(usize),
    #[error("Recipe must have at least one ingredient")]
    NoIngredients,
    #[error("Ingredient {0} must reference an item and a unit")]
    IncompleteIngredient(usize),
    #[error("Ingredient {0} quantity must be a positive number")]
    NonPositiveQuantity(usize),
    #[error("Meal must have at least one dish")]
    NoDishes,
    #[error("Dish {0} must reference exactly one of a recipe or a ready meal")]
    AmbiguousDish(usize),
}
