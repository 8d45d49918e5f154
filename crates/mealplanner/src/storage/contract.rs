//! Behaviour every repository backend must share.
//!
//! Each function takes a fresh set of repositories and panics on failure.
//! Backends run the whole suite with [`repository_contract_tests!`].

use chrono::NaiveDate;

use mealplanner_core::models::{
    Category, CourseType, DishType, Item, ItemType, Meal, MealDish, ReadyMealData, Recipe,
    RecipeIngredient, Unit, UnitType, ValidationError,
};
use mealplanner_core::storage::{DateRange, Repositories, RepositoryError, StoreName};

/// Expands to one `#[tokio::test]` per contract function, each built from
/// `$factory().await`.
macro_rules! repository_contract_tests {
    ($factory:path) => {
        $crate::storage::contract::repository_contract_tests!(@each $factory;
            test_category_names_are_case_insensitive,
            test_category_names_differing_by_case_collide,
            test_categories_sorted_by_sort_order_then_name,
            test_category_delete_blocked_by_items,
            test_category_create_count_delete_scenario,
            test_update_rules,
            test_item_and_unit_renames_respect_unique_names,
            test_recipe_and_meal_updates_require_existing_record,
            test_quantities_round_trip_exactly,
            test_round_trip_every_entity,
            test_delete_missing_returns_false,
            test_duplicate_id_is_rejected,
            test_validation_failures_are_reported,
            test_get_all_runs_in_key_order,
            test_unit_lookups,
            test_item_lookups,
            test_recipe_lookups,
            test_meal_lookups,
            test_unchecked_references_do_not_block_deletes,
        );
    };
    (@each $factory:path; $($name:ident),* $(,)?) => {
        $(
            #[tokio::test]
            async fn $name() {
                $crate::storage::contract::$name($factory().await).await;
            }
        )*
    };
}

pub(crate) use repository_contract_tests;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn curry(id: &str, category_id: &str, dish: DishType) -> Item {
    Item::ready_meal(
        id,
        format!("curry {id}"),
        category_id,
        ReadyMealData {
            dish,
            course: CourseType::Main,
            servings: 2,
            prep_time_minutes: Some(5),
        },
    )
}

fn soup(id: &str, name: &str) -> Recipe {
    Recipe::new(id, name, DishType::Lunch, CourseType::Starter, 4)
        .with_step("Chop the carrots")
        .with_step("Simmer for 20 minutes")
        .with_ingredient(RecipeIngredient::new("item-1", "unit-1", 300.0))
}

fn ids<T>(values: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
    values.iter().map(|v| id(v).to_string()).collect()
}

pub async fn test_category_names_are_case_insensitive(repos: Repositories) {
    let created = repos
        .categories
        .create(&Category::new("cat-1", "Fresh Produce"))
        .await
        .unwrap();

    assert_eq!(created.name, "fresh produce");
    for query in ["fresh produce", "FRESH PRODUCE", "Fresh Produce"] {
        let found = repos.categories.get_by_name(query).await.unwrap();
        assert_eq!(found.map(|c| c.name), Some("fresh produce".to_string()));
    }
    assert_eq!(repos.categories.get_by_name("produce").await.unwrap(), None);
}

pub async fn test_category_names_differing_by_case_collide(repos: Repositories) {
    repos
        .categories
        .create(&Category::new("cat-1", "Dairy"))
        .await
        .unwrap();

    let result = repos.categories.create(&Category::new("cat-2", "DAIRY")).await;

    assert_eq!(
        result,
        Err(RepositoryError::AlreadyExists {
            entity_type: "Category",
            key: "dairy".to_string(),
        })
    );
    assert_eq!(repos.categories.count().await.unwrap(), 1);
}

pub async fn test_categories_sorted_by_sort_order_then_name(repos: Repositories) {
    for category in [
        Category::new("cat-1", "dairy").with_sort_order(2),
        Category::new("cat-2", "produce").with_sort_order(1),
        Category::new("cat-3", "meat").with_sort_order(2),
        Category::new("cat-4", "bakery"),
    ] {
        repos.categories.create(&category).await.unwrap();
    }

    let sorted = repos.categories.get_all_sorted().await.unwrap();

    let names: Vec<&str> = sorted.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["produce", "dairy", "meat", "bakery"]);
}

pub async fn test_category_delete_blocked_by_items(repos: Repositories) {
    repos
        .categories
        .create(&Category::new("cat-1", "Dairy"))
        .await
        .unwrap();
    repos
        .items
        .create(&Item::ingredient("item-1", "milk", "cat-1"))
        .await
        .unwrap();
    repos
        .items
        .create(&Item::ingredient("item-2", "butter", "cat-1"))
        .await
        .unwrap();

    let err = repos.categories.delete("cat-1").await.unwrap_err();

    assert_eq!(
        err,
        RepositoryError::ReferentialIntegrityViolation {
            store: StoreName::Categories,
            label: "dairy".to_string(),
            referencing: StoreName::Items,
            count: 2,
        }
    );
    assert_eq!(
        err.to_string(),
        "Cannot delete category \"dairy\" because 2 item(s) reference it"
    );
    assert!(repos.categories.get_by_id("cat-1").await.unwrap().is_some());

    assert!(repos.items.delete("item-1").await.unwrap());
    assert!(repos.items.delete("item-2").await.unwrap());
    assert!(repos.categories.delete("cat-1").await.unwrap());
    assert_eq!(repos.categories.get_by_id("cat-1").await.unwrap(), None);
}

pub async fn test_category_create_count_delete_scenario(repos: Repositories) {
    repos
        .categories
        .create(&Category::new("cat-1", "Dairy").with_sort_order(1))
        .await
        .unwrap();
    repos
        .categories
        .create(&Category::new("cat-2", "Produce"))
        .await
        .unwrap();
    assert_eq!(repos.categories.count().await.unwrap(), 2);

    assert!(repos.categories.delete("cat-1").await.unwrap());

    assert_eq!(repos.categories.count().await.unwrap(), 1);
}

pub async fn test_update_rules(repos: Repositories) {
    let dairy = repos
        .categories
        .create(&Category::new("cat-1", "Dairy"))
        .await
        .unwrap();
    repos
        .categories
        .create(&Category::new("cat-2", "Produce"))
        .await
        .unwrap();

    let missing = repos
        .categories
        .update(&Category::new("cat-404", "Bakery"))
        .await;
    assert_eq!(
        missing,
        Err(RepositoryError::NotFound {
            entity_type: "Category",
            id: "cat-404".to_string(),
        })
    );

    let mut colliding = dairy.clone();
    colliding.name = "PRODUCE".to_string();
    assert_eq!(
        repos.categories.update(&colliding).await,
        Err(RepositoryError::AlreadyExists {
            entity_type: "Category",
            key: "produce".to_string(),
        })
    );

    let mut same_name = dairy.clone();
    same_name.name = "DAIRY".to_string();
    same_name.sort_order = Some(3);
    let updated = repos.categories.update(&same_name).await.unwrap();
    assert_eq!(updated.name, "dairy");
    assert_eq!(updated.created_at, dairy.created_at);
    assert_eq!(
        repos.categories.get_by_id("cat-1").await.unwrap(),
        Some(updated)
    );
}

pub async fn test_item_and_unit_renames_respect_unique_names(repos: Repositories) {
    let gram = repos
        .units
        .create(&Unit::new("unit-1", "Gram", UnitType::Weight))
        .await
        .unwrap();
    repos
        .units
        .create(&Unit::new("unit-2", "Litre", UnitType::Volume))
        .await
        .unwrap();
    let carrots = repos
        .items
        .create(&Item::ingredient("item-1", "Carrots", "cat-1"))
        .await
        .unwrap();
    repos
        .items
        .create(&Item::ingredient("item-2", "Onions", "cat-1"))
        .await
        .unwrap();

    let mut unit = gram.clone();
    unit.name = "LITRE".to_string();
    assert_eq!(
        repos.units.update(&unit).await,
        Err(RepositoryError::AlreadyExists {
            entity_type: "Unit",
            key: "litre".to_string(),
        })
    );

    let mut item = carrots.clone();
    item.name = "onions".to_string();
    assert_eq!(
        repos.items.update(&item).await,
        Err(RepositoryError::AlreadyExists {
            entity_type: "Item",
            key: "onions".to_string(),
        })
    );

    let mut unit = gram.clone();
    unit.abbreviation = Some("g".to_string());
    assert_eq!(repos.units.update(&unit).await.unwrap().name, "gram");

    let mut item = carrots.clone();
    item.name = "Carrots".to_string();
    item.category_id = "cat-2".to_string();
    let updated = repos.items.update(&item).await.unwrap();
    assert_eq!(updated.name, "carrots");
    assert_eq!(
        repos.items.get_by_category("cat-2").await.unwrap(),
        vec![updated]
    );

    assert_eq!(
        repos.units.update(&Unit::new("unit-404", "cup", UnitType::Volume)).await,
        Err(RepositoryError::NotFound {
            entity_type: "Unit",
            id: "unit-404".to_string(),
        })
    );
    assert_eq!(
        repos
            .items
            .update(&Item::ingredient("item-404", "leeks", "cat-1"))
            .await,
        Err(RepositoryError::NotFound {
            entity_type: "Item",
            id: "item-404".to_string(),
        })
    );
}

pub async fn test_recipe_and_meal_updates_require_existing_record(repos: Repositories) {
    assert_eq!(
        repos.recipes.update(&soup("recipe-404", "soup")).await,
        Err(RepositoryError::NotFound {
            entity_type: "Recipe",
            id: "recipe-404".to_string(),
        })
    );
    let meal = Meal::new("meal-404", date(2024, 6, 15), 2).with_dish(MealDish::recipe("r"));
    assert_eq!(
        repos.meals.update(&meal).await,
        Err(RepositoryError::NotFound {
            entity_type: "Meal",
            id: "meal-404".to_string(),
        })
    );

    // Recipe names may repeat, on create and on update.
    repos.recipes.create(&soup("recipe-1", "Soup")).await.unwrap();
    let mut renamed = repos
        .recipes
        .create(&soup("recipe-2", "Stew"))
        .await
        .unwrap();
    renamed.name = "SOUP".to_string();
    assert_eq!(repos.recipes.update(&renamed).await.unwrap().name, "soup");

    let stored = repos.meals.create(&meal.clone().with_notes("draft")).await.unwrap();
    let mut changed = stored.clone();
    changed.servings = 4;
    changed.notes = None;
    repos.meals.update(&changed).await.unwrap();
    assert_eq!(
        repos.meals.get_by_id("meal-404").await.unwrap(),
        Some(changed)
    );
}

pub async fn test_quantities_round_trip_exactly(repos: Repositories) {
    let quantities = [632.0 / 7.0, 0.1 + 0.2, 1.0 / 3.0, 1e-7 / 3.0];
    let mut recipe = Recipe::new("recipe-1", "Thirds", DishType::Dinner, CourseType::Side, 3)
        .with_step("Divide evenly");
    for (i, quantity) in quantities.iter().enumerate() {
        recipe = recipe.with_ingredient(RecipeIngredient::new(
            format!("item-{i}"),
            "unit-1",
            *quantity,
        ));
    }

    let created = repos.recipes.create(&recipe).await.unwrap();
    let found = repos.recipes.get_by_id("recipe-1").await.unwrap();

    assert_eq!(found.as_ref(), Some(&created));
    let read_back: Vec<f64> = created.ingredients.iter().map(|i| i.quantity).collect();
    assert_eq!(read_back, quantities);
    let read_back: Vec<u64> = found
        .unwrap()
        .ingredients
        .iter()
        .map(|i| i.quantity.to_bits())
        .collect();
    assert_eq!(
        read_back,
        quantities.iter().map(|q| q.to_bits()).collect::<Vec<_>>()
    );
}

pub async fn test_round_trip_every_entity(repos: Repositories) {
    let category = Category::new("cat-1", "Pantry").with_sort_order(0);
    let unit = Unit::new("unit-1", "Gram", UnitType::Weight).with_abbreviation("g");
    let item = curry("item-9", "cat-1", DishType::Dinner);
    let recipe = soup("recipe-1", "Carrot Soup").with_description("Smooth and sweet");
    let meal = Meal::new("meal-1", date(2024, 6, 15), 2)
        .with_dish(MealDish::recipe("recipe-1"))
        .with_dish(MealDish::ready_meal("item-9"))
        .with_notes("Sunday lunch");

    let stored_category = repos.categories.create(&category).await.unwrap();
    let stored_unit = repos.units.create(&unit).await.unwrap();
    let stored_item = repos.items.create(&item).await.unwrap();
    let stored_recipe = repos.recipes.create(&recipe).await.unwrap();
    let stored_meal = repos.meals.create(&meal).await.unwrap();

    assert_eq!(stored_category.name, "pantry");
    assert_eq!(stored_unit.name, "gram");
    assert_eq!(stored_recipe.name, "carrot soup");
    assert_eq!(stored_meal, meal);

    let mut expected = category.clone();
    expected.name = "pantry".to_string();
    assert_eq!(
        repos.categories.get_by_id("cat-1").await.unwrap(),
        Some(expected)
    );
    assert_eq!(
        repos.units.get_by_id("unit-1").await.unwrap(),
        Some(stored_unit)
    );
    assert_eq!(
        repos.items.get_by_id("item-9").await.unwrap(),
        Some(stored_item)
    );
    assert_eq!(
        repos.recipes.get_by_id("recipe-1").await.unwrap(),
        Some(stored_recipe)
    );
    assert_eq!(
        repos.meals.get_by_id("meal-1").await.unwrap(),
        Some(stored_meal)
    );
}

pub async fn test_delete_missing_returns_false(repos: Repositories) {
    assert!(!repos.categories.delete("nope").await.unwrap());
    assert!(!repos.units.delete("nope").await.unwrap());
    assert!(!repos.items.delete("nope").await.unwrap());
    assert!(!repos.recipes.delete("nope").await.unwrap());
    assert!(!repos.meals.delete("nope").await.unwrap());
}

pub async fn test_duplicate_id_is_rejected(repos: Repositories) {
    repos
        .units
        .create(&Unit::new("unit-1", "gram", UnitType::Weight))
        .await
        .unwrap();
    let meal = Meal::new("meal-1", date(2024, 6, 15), 2).with_dish(MealDish::recipe("r"));
    repos.meals.create(&meal).await.unwrap();

    let unit = repos
        .units
        .create(&Unit::new("unit-1", "litre", UnitType::Volume))
        .await;
    let meal = repos.meals.create(&meal).await;

    assert_eq!(
        unit,
        Err(RepositoryError::AlreadyExists {
            entity_type: "Unit",
            key: "unit-1".to_string(),
        })
    );
    assert_eq!(
        meal,
        Err(RepositoryError::AlreadyExists {
            entity_type: "Meal",
            key: "meal-1".to_string(),
        })
    );
}

pub async fn test_validation_failures_are_reported(repos: Repositories) {
    let blank = repos.categories.create(&Category::new("cat-1", "   ")).await;
    let negative = repos
        .categories
        .create(&Category::new("cat-1", "dairy").with_sort_order(-1))
        .await;
    let mut ready_meal = curry("item-1", "cat-1", DishType::Dinner);
    ready_meal.ready_meal_data = None;
    let missing_data = repos.items.create(&ready_meal).await;
    let no_dishes = repos
        .meals
        .create(&Meal::new("meal-1", date(2024, 6, 15), 2))
        .await;

    assert_eq!(
        blank,
        Err(RepositoryError::ValidationFailed(
            ValidationError::EmptyName {
                entity_type: "Category"
            }
        ))
    );
    assert_eq!(
        negative,
        Err(RepositoryError::ValidationFailed(
            ValidationError::NegativeSortOrder(-1)
        ))
    );
    assert_eq!(
        missing_data,
        Err(RepositoryError::ValidationFailed(
            ValidationError::MissingReadyMealData
        ))
    );
    assert_eq!(
        no_dishes,
        Err(RepositoryError::ValidationFailed(ValidationError::NoDishes))
    );
    assert_eq!(repos.categories.count().await.unwrap(), 0);
}

pub async fn test_get_all_runs_in_key_order(repos: Repositories) {
    for (id, name) in [("u-3", "cup"), ("u-1", "gram"), ("u-2", "piece")] {
        repos
            .units
            .create(&Unit::new(id, name, UnitType::Count))
            .await
            .unwrap();
    }

    let all = repos.units.get_all().await.unwrap();

    assert_eq!(ids(&all, |u| u.id.as_str()), ["u-1", "u-2", "u-3"]);
}

pub async fn test_unit_lookups(repos: Repositories) {
    for unit in [
        Unit::new("u-1", "Gram", UnitType::Weight),
        Unit::new("u-2", "Litre", UnitType::Volume),
        Unit::new("u-3", "Kilogram", UnitType::Weight),
    ] {
        repos.units.create(&unit).await.unwrap();
    }

    let weights = repos.units.get_by_type(UnitType::Weight).await.unwrap();
    let counts = repos.units.get_by_type(UnitType::Count).await.unwrap();
    let litre = repos.units.get_by_name("LITRE").await.unwrap();

    assert_eq!(ids(&weights, |u| u.id.as_str()), ["u-1", "u-3"]);
    assert!(counts.is_empty());
    assert_eq!(litre.map(|u| u.id), Some("u-2".to_string()));
}

pub async fn test_item_lookups(repos: Repositories) {
    for item in [
        Item::ingredient("item-1", "Carrots", "cat-produce"),
        Item::inedible("item-2", "Foil", "cat-household"),
        curry("item-3", "cat-frozen", DishType::Dinner),
        curry("item-4", "cat-frozen", DishType::Lunch),
        curry("item-5", "cat-produce", DishType::Dinner),
    ] {
        repos.items.create(&item).await.unwrap();
    }

    let produce = repos.items.get_by_category("cat-produce").await.unwrap();
    let ready_meals = repos
        .items
        .get_by_item_type(ItemType::ReadyMeal)
        .await
        .unwrap();
    let dinners = repos
        .items
        .get_ready_meals_by_dish(DishType::Dinner)
        .await
        .unwrap();
    let desserts = repos
        .items
        .get_ready_meals_by_dish(DishType::Dessert)
        .await
        .unwrap();
    let carrots = repos.items.get_by_name("carrots").await.unwrap();
    let duplicate = repos
        .items
        .create(&Item::ingredient("item-6", "CARROTS", "cat-produce"))
        .await;

    assert_eq!(ids(&produce, |i| i.id.as_str()), ["item-1", "item-5"]);
    assert_eq!(ids(&ready_meals, |i| i.id.as_str()), ["item-3", "item-4", "item-5"]);
    assert_eq!(ids(&dinners, |i| i.id.as_str()), ["item-3", "item-5"]);
    assert!(desserts.is_empty());
    assert_eq!(carrots.map(|i| i.id), Some("item-1".to_string()));
    assert!(matches!(
        duplicate,
        Err(RepositoryError::AlreadyExists { entity_type: "Item", .. })
    ));
}

pub async fn test_recipe_lookups(repos: Repositories) {
    let mut dessert = soup("recipe-3", "Trifle");
    dessert.dish = DishType::Dessert;
    dessert.course = CourseType::Main;
    for recipe in [soup("recipe-2", "Soup"), soup("recipe-1", "SOUP"), dessert] {
        repos.recipes.create(&recipe).await.unwrap();
    }

    let first_soup = repos.recipes.get_by_name("soup").await.unwrap();
    let lunches = repos.recipes.get_by_dish(DishType::Lunch).await.unwrap();
    let mains = repos.recipes.get_by_course(CourseType::Main).await.unwrap();

    assert_eq!(first_soup.map(|r| r.id), Some("recipe-1".to_string()));
    assert_eq!(ids(&lunches, |r| r.id.as_str()), ["recipe-1", "recipe-2"]);
    assert_eq!(ids(&mains, |r| r.id.as_str()), ["recipe-3"]);
    assert_eq!(repos.recipes.count().await.unwrap(), 3);
}

pub async fn test_meal_lookups(repos: Repositories) {
    for (id, day) in [
        ("meal-c", date(2024, 6, 11)),
        ("meal-b", date(2024, 6, 10)),
        ("meal-a", date(2024, 6, 11)),
        ("meal-d", date(2024, 6, 17)),
        ("meal-e", date(2024, 6, 9)),
    ] {
        let meal = Meal::new(id, day, 2).with_dish(MealDish::recipe("recipe-1"));
        repos.meals.create(&meal).await.unwrap();
    }

    let on_day = repos.meals.get_by_date(date(2024, 6, 11)).await.unwrap();
    let week = repos
        .meals
        .get_by_date_range(DateRange::week(date(2024, 6, 12)))
        .await
        .unwrap();
    let single = repos
        .meals
        .get_by_date_range(DateRange::day(date(2024, 6, 17)))
        .await
        .unwrap();

    assert_eq!(ids(&on_day, |m| m.id.as_str()), ["meal-a", "meal-c"]);
    // 2024-06-10 is a Monday; the Sunday before and the Monday after are out.
    assert_eq!(ids(&week, |m| m.id.as_str()), ["meal-b", "meal-a", "meal-c"]);
    assert_eq!(ids(&single, |m| m.id.as_str()), ["meal-d"]);
}

pub async fn test_unchecked_references_do_not_block_deletes(repos: Repositories) {
    repos
        .units
        .create(&Unit::new("unit-1", "gram", UnitType::Weight))
        .await
        .unwrap();
    repos
        .items
        .create(&Item::ingredient("item-1", "carrots", "cat-1"))
        .await
        .unwrap();
    repos
        .recipes
        .create(&soup("recipe-1", "soup"))
        .await
        .unwrap();
    let meal = Meal::new("meal-1", date(2024, 6, 15), 2).with_dish(MealDish::recipe("recipe-1"));
    repos.meals.create(&meal).await.unwrap();

    assert!(repos.items.delete("item-1").await.unwrap());
    assert!(repos.units.delete("unit-1").await.unwrap());
    assert!(repos.recipes.delete("recipe-1").await.unwrap());
    assert!(repos.meals.get_by_id("meal-1").await.unwrap().is_some());
}
