mod error;
mod operations;
mod sorting;
mod types;

pub use error::ValidationError;
pub use operations::{
    normalize_name, now_millis, prepare_category, prepare_item, prepare_meal, prepare_recipe,
    prepare_unit,
};
pub use sorting::{compare_categories, sort_categories};
pub use types::{
    Category, CourseType, DishType, Item, ItemType, Meal, MealDish, ReadyMealData, Recipe,
    RecipeIngredient, Unit, UnitType,
};
