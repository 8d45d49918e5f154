use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use thiserror::Error;

/// Names of the object stores that make up the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreName {
    Categories,
    Units,
    Items,
    Recipes,
    Meals,
}

impl StoreName {
    /// Every store, in schema creation order.
    pub const ALL: [StoreName; 5] = [
        StoreName::Categories,
        StoreName::Units,
        StoreName::Items,
        StoreName::Recipes,
        StoreName::Meals,
    ];

    /// Store (table) name as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreName::Categories => "categories",
            StoreName::Units => "units",
            StoreName::Items => "items",
            StoreName::Recipes => "recipes",
            StoreName::Meals => "meals",
        }
    }

    /// Entity name used in error messages.
    pub const fn entity_type(&self) -> &'static str {
        match self {
            StoreName::Categories => "Category",
            StoreName::Units => "Unit",
            StoreName::Items => "Item",
            StoreName::Recipes => "Recipe",
            StoreName::Meals => "Meal",
        }
    }

    /// Singular noun for one record of the store, used in messages.
    pub fn noun(&self) -> &'static str {
        match self {
            StoreName::Categories => "category",
            StoreName::Units => "unit",
            StoreName::Items => "item",
            StoreName::Recipes => "recipe",
            StoreName::Meals => "meal",
        }
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when constructing a date range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("Invalid date range: start date must be before or equal to end date")]
    InvalidRange,
    #[error("Invalid month: {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Every day of the given month.
    pub fn month(year: i32, month: u32) -> Result<Self, DateRangeError> {
        let invalid = || DateRangeError::InvalidMonth { year, month };
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        let end = next.and_then(|d| d.pred_opt()).ok_or_else(invalid)?;

        Ok(Self { start, end })
    }

    /// The Monday-to-Sunday week containing `date`.
    pub fn week(date: NaiveDate) -> Self {
        let start = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered, counting both ends.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Iterates the days in the range in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
