//! Demo data for a fresh database.
//!
//! Seeding is keyed by name: anything whose name is already stored is
//! reported as skipped and the stored record's id is used for references.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use mealplanner_core::models::{
    Category, CourseType, DishType, Item, Meal, MealDish, ReadyMealData, Recipe,
    RecipeIngredient, Unit, UnitType,
};
use mealplanner_core::storage::{Database, DateRange, RepositoryError, Result, StoreName};

const CATEGORIES: &[(&str, Option<i64>)] = &[
    ("Produce", Some(1)),
    ("Dairy", Some(2)),
    ("Pantry", Some(3)),
    ("Frozen", Some(4)),
    ("Household", None),
];

const UNITS: &[(&str, &str, UnitType)] = &[
    ("Gram", "g", UnitType::Weight),
    ("Kilogram", "kg", UnitType::Weight),
    ("Millilitre", "ml", UnitType::Volume),
    ("Litre", "l", UnitType::Volume),
    ("Piece", "pc", UnitType::Count),
];

const INGREDIENTS: &[(&str, &str)] = &[
    ("Carrots", "Produce"),
    ("Onions", "Produce"),
    ("Milk", "Dairy"),
    ("Butter", "Dairy"),
    ("Cheddar", "Dairy"),
    ("Bread", "Pantry"),
    ("Red Lentils", "Pantry"),
    ("Vegetable Stock", "Pantry"),
];

const READY_MEALS: &[(&str, DishType, u32)] = &[
    ("Frozen Lasagne", DishType::Dinner, 2),
    ("Fish Fingers", DishType::Lunch, 4),
];

const INEDIBLES: &[(&str, &str)] = &[("Aluminium Foil", "Household")];

struct DemoRecipe {
    name: &'static str,
    dish: DishType,
    course: CourseType,
    servings: u32,
    steps: &'static [&'static str],
    /// (item, unit, quantity)
    ingredients: &'static [(&'static str, &'static str, f64)],
}

const RECIPES: &[DemoRecipe] = &[
    DemoRecipe {
        name: "Carrot Soup",
        dish: DishType::Lunch,
        course: CourseType::Starter,
        servings: 4,
        steps: &[
            "Chop the carrots and onions",
            "Soften the onions in butter",
            "Add carrots and stock, simmer for 20 minutes",
            "Blend until smooth",
        ],
        ingredients: &[
            ("Carrots", "Gram", 500.0),
            ("Onions", "Piece", 1.0),
            ("Butter", "Gram", 15.0),
            ("Vegetable Stock", "Litre", 1.0),
        ],
    },
    DemoRecipe {
        name: "Grilled Cheese",
        dish: DishType::Lunch,
        course: CourseType::Main,
        servings: 1,
        steps: &["Butter the bread", "Add cheddar", "Fry until golden"],
        ingredients: &[
            ("Bread", "Piece", 2.0),
            ("Cheddar", "Gram", 60.0),
            ("Butter", "Gram", 10.0),
        ],
    },
    DemoRecipe {
        name: "Lentil Dahl",
        dish: DishType::Dinner,
        course: CourseType::Main,
        servings: 4,
        steps: &["Rinse the lentils", "Simmer with stock until soft"],
        ingredients: &[
            ("Red Lentils", "Gram", 250.0),
            ("Onions", "Piece", 1.0),
            ("Vegetable Stock", "Millilitre", 750.0),
        ],
    },
];

/// What a seeding run did, per store.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub created: BTreeMap<&'static str, u64>,
    /// Names (or meal dates) that were already present.
    pub skipped: Vec<String>,
}

impl SeedReport {
    fn note_created(&mut self, store: StoreName) {
        *self.created.entry(store.as_str()).or_default() += 1;
    }

    fn note_skipped(&mut self, store: StoreName, key: impl Into<String>) {
        self.skipped.push(format!("{} {}", store.noun(), key.into()));
    }

    pub fn total_created(&self) -> u64 {
        self.created.values().sum()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn missing(store: StoreName, key: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity_type: store.entity_type(),
        id: key.to_string(),
    }
}

/// Stored ids by original (display) name.
type Ids = HashMap<&'static str, String>;

fn lookup<'a>(ids: &'a Ids, store: StoreName, name: &str) -> Result<&'a str> {
    ids.get(name)
        .map(String::as_str)
        .ok_or_else(|| missing(store, name))
}

/// Inserts the demo data set, with one week of meals around `week_of`.
pub async fn seed(db: &dyn Database, week_of: NaiveDate) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let categories = db.categories()?;
    let mut category_ids = Ids::new();
    for &(name, sort_order) in CATEGORIES {
        let mut category = Category::new(new_id(), name);
        category.sort_order = sort_order;
        let id = match categories.create(&category).await {
            Ok(created) => {
                report.note_created(StoreName::Categories);
                created.id
            }
            Err(RepositoryError::AlreadyExists { .. }) => {
                report.note_skipped(StoreName::Categories, name);
                categories
                    .get_by_name(name)
                    .await?
                    .ok_or_else(|| missing(StoreName::Categories, name))?
                    .id
            }
            Err(e) => return Err(e),
        };
        category_ids.insert(name, id);
    }

    let units = db.units()?;
    let mut unit_ids = Ids::new();
    for &(name, abbreviation, unit_type) in UNITS {
        let unit = Unit::new(new_id(), name, unit_type).with_abbreviation(abbreviation);
        let id = match units.create(&unit).await {
            Ok(created) => {
                report.note_created(StoreName::Units);
                created.id
            }
            Err(RepositoryError::AlreadyExists { .. }) => {
                report.note_skipped(StoreName::Units, name);
                units
                    .get_by_name(name)
                    .await?
                    .ok_or_else(|| missing(StoreName::Units, name))?
                    .id
            }
            Err(e) => return Err(e),
        };
        unit_ids.insert(name, id);
    }

    let mut new_items = Vec::new();
    for &(name, category) in INGREDIENTS {
        let category_id = lookup(&category_ids, StoreName::Categories, category)?;
        new_items.push((name, Item::ingredient(new_id(), name, category_id)));
    }
    for &(name, dish, servings) in READY_MEALS {
        let category_id = lookup(&category_ids, StoreName::Categories, "Frozen")?;
        let data = ReadyMealData {
            dish,
            course: CourseType::Main,
            servings,
            prep_time_minutes: Some(25),
        };
        new_items.push((name, Item::ready_meal(new_id(), name, category_id, data)));
    }
    for &(name, category) in INEDIBLES {
        let category_id = lookup(&category_ids, StoreName::Categories, category)?;
        new_items.push((name, Item::inedible(new_id(), name, category_id)));
    }

    let items = db.items()?;
    let mut item_ids = Ids::new();
    for (name, item) in new_items {
        let id = match items.create(&item).await {
            Ok(created) => {
                report.note_created(StoreName::Items);
                created.id
            }
            Err(RepositoryError::AlreadyExists { .. }) => {
                report.note_skipped(StoreName::Items, name);
                items
                    .get_by_name(name)
                    .await?
                    .ok_or_else(|| missing(StoreName::Items, name))?
                    .id
            }
            Err(e) => return Err(e),
        };
        item_ids.insert(name, id);
    }

    // Recipe names are not unique, so existence is checked up front.
    let recipes = db.recipes()?;
    let mut recipe_ids = Ids::new();
    for demo in RECIPES {
        if let Some(existing) = recipes.get_by_name(demo.name).await? {
            report.note_skipped(StoreName::Recipes, demo.name);
            recipe_ids.insert(demo.name, existing.id);
            continue;
        }

        let mut recipe = Recipe::new(new_id(), demo.name, demo.dish, demo.course, demo.servings);
        for step in demo.steps {
            recipe = recipe.with_step(*step);
        }
        for &(item, unit, quantity) in demo.ingredients {
            recipe = recipe.with_ingredient(RecipeIngredient::new(
                lookup(&item_ids, StoreName::Items, item)?,
                lookup(&unit_ids, StoreName::Units, unit)?,
                quantity,
            ));
        }
        let created = recipes.create(&recipe).await?;
        report.note_created(StoreName::Recipes);
        recipe_ids.insert(demo.name, created.id);
    }

    let meals = db.meals()?;
    let rotation = [
        MealDish::recipe(lookup(&recipe_ids, StoreName::Recipes, "Carrot Soup")?),
        MealDish::recipe(lookup(&recipe_ids, StoreName::Recipes, "Lentil Dahl")?),
        MealDish::ready_meal(lookup(&item_ids, StoreName::Items, "Frozen Lasagne")?),
        MealDish::recipe(lookup(&recipe_ids, StoreName::Recipes, "Grilled Cheese")?),
        MealDish::ready_meal(lookup(&item_ids, StoreName::Items, "Fish Fingers")?),
    ];
    for (day, dish) in DateRange::week(week_of).days().zip(rotation.iter().cycle()) {
        if !meals.get_by_date(day).await?.is_empty() {
            report.note_skipped(StoreName::Meals, day.to_string());
            continue;
        }
        meals
            .create(&Meal::new(new_id(), day, 2).with_dish(dish.clone()))
            .await?;
        report.note_created(StoreName::Meals);
    }

    info!(
        created = report.total_created(),
        skipped = report.skipped.len(),
        "Seeded demo data"
    );
    Ok(report)
}
