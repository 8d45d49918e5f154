//! Persistent storage for the meal planner.
//!
//! The domain types and repository traits live in `mealplanner_core`. This
//! crate provides the backends behind them: an SQLite object store (feature
//! `sqlite`) and a process-local in-memory store (feature `inmemory`), plus
//! the [`database::MealPlannerDatabase`] facade that manages the connection
//! lifecycle.

pub mod config;
pub mod database;
pub mod seed;
pub mod storage;
