//! Domain types, validation rules and repository contracts for the meal planner.
//!
//! Everything in this crate is pure: no I/O, no runtime. Storage backends live
//! in the `mealplanner` crate and implement the traits in [`storage`].

pub mod codec;
pub mod models;
pub mod serde;
pub mod storage;
