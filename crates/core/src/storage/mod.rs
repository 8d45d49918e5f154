mod entity;
mod error;
pub mod integrity;
mod traits;
mod types;

pub use entity::Entity;
pub use error::{RepositoryError, Result};
pub use integrity::{Enforcement, Reference, REFERENCES};
pub use traits::{
    BaseRepository, CategoryRepository, Database, ItemRepository, MealRepository,
    RecipeRepository, Repositories, UnitRepository,
};
pub use types::{DateRange, DateRangeError, StoreName};
