//! `mealplanner categories` subcommands.

use anyhow::Result;
use tabled::Tabled;
use uuid::Uuid;

use mealplanner_core::models::Category;
use mealplanner_core::storage::Database;

use super::output::table;
use super::Global;

/// Manage shopping categories.
#[derive(Debug, clap::Parser)]
pub struct CategoriesCommand {
    #[command(subcommand)]
    pub action: CategoriesAction,
}

#[derive(Debug, clap::Subcommand)]
pub enum CategoriesAction {
    /// List categories.
    List {
        /// Order by sort order, then name, instead of by id.
        #[arg(long)]
        sorted: bool,
    },

    /// Add a category.
    Add {
        /// Category name. Stored lowercased.
        #[arg(long)]
        name: String,

        /// Position in shopping lists.
        #[arg(long)]
        sort_order: Option<i64>,
    },

    /// Delete a category that no item references.
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "SORT")]
    sort_order: String,
}

impl From<&Category> for CategoryRow {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            sort_order: category
                .sort_order
                .map_or("-".to_string(), |s| s.to_string()),
        }
    }
}

fn render(categories: &[Category]) -> String {
    table(categories.iter().map(CategoryRow::from))
}

pub async fn list(db: &dyn Database, sorted: bool) -> Result<Vec<Category>> {
    let categories = db.categories()?;
    Ok(if sorted {
        categories.get_all_sorted().await?
    } else {
        categories.get_all().await?
    })
}

pub async fn add(db: &dyn Database, name: &str, sort_order: Option<i64>) -> Result<Category> {
    let mut category = Category::new(Uuid::new_v4().to_string(), name);
    category.sort_order = sort_order;
    Ok(db.categories()?.create(&category).await?)
}

pub async fn run(command: CategoriesCommand, db: &dyn Database, global: &Global) -> Result<()> {
    match command.action {
        CategoriesAction::List { sorted } => {
            let categories = list(db, sorted).await?;
            global.format.print(&categories, |c| render(c))
        }
        CategoriesAction::Add { name, sort_order } => {
            let category = add(db, &name, sort_order).await?;
            global
                .format
                .print(&category, |c| format!("Added category {} ({})", c.name, c.id))
        }
        CategoriesAction::Delete { id } => {
            let deleted = db.categories()?.delete(&id).await?;
            global.format.print(&serde_json::json!({ "deleted": deleted }), |_| {
                if deleted {
                    format!("Deleted category {id}")
                } else {
                    format!("No category with id {id}")
                }
            })
        }
    }
}
