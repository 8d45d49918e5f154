//! `mealplanner meals` subcommands.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use tabled::Tabled;

use mealplanner_core::models::Meal;
use mealplanner_core::storage::{Database, DateRange};

use super::output::table;
use super::Global;

/// Browse planned meals.
#[derive(Debug, clap::Parser)]
pub struct MealsCommand {
    #[command(subcommand)]
    pub action: MealsAction,
}

#[derive(Debug, clap::Subcommand)]
pub enum MealsAction {
    /// List meals between two dates, both inclusive.
    List {
        /// First day. Format: YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        from: NaiveDate,

        /// Last day. Format: YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        to: NaiveDate,
    },

    /// List the Monday-to-Sunday week containing a date.
    Week {
        /// Any day of the week (defaults to today). Format: YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
    },
}

fn describe_dishes(meal: &Meal) -> String {
    meal.dishes
        .iter()
        .map(|dish| match (&dish.recipe_id, &dish.ready_meal_id) {
            (Some(id), _) => format!("recipe:{id}"),
            (None, Some(id)) => format!("ready-meal:{id}"),
            (None, None) => "-".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Tabled)]
struct MealRow {
    #[tabled(rename = "DATE")]
    date: NaiveDate,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "SERVINGS")]
    servings: u32,
    #[tabled(rename = "DISHES")]
    dishes: String,
}

impl From<&Meal> for MealRow {
    fn from(meal: &Meal) -> Self {
        Self {
            date: meal.date,
            id: meal.id.clone(),
            servings: meal.servings,
            dishes: describe_dishes(meal),
        }
    }
}

fn render(meals: &[Meal]) -> String {
    if meals.is_empty() {
        return "No meals planned".to_string();
    }
    table(meals.iter().map(MealRow::from))
}

pub async fn in_range(db: &dyn Database, range: DateRange) -> Result<Vec<Meal>> {
    Ok(db.meals()?.get_by_date_range(range).await?)
}

pub async fn run(command: MealsCommand, db: &dyn Database, global: &Global) -> Result<()> {
    let range = match command.action {
        MealsAction::List { from, to } => DateRange::new(from, to)?,
        MealsAction::Week { date } => {
            DateRange::week(date.unwrap_or_else(|| Local::now().date_naive()))
        }
    };

    let meals = in_range(db, range).await?;
    global.format.print(&meals, |m| render(m))
}
