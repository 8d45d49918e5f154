//! Keys, key ranges and cursor queries over stores and indexes.

use chrono::NaiveDate;
use rusqlite::types::{ToSql, ToSqlOutput};

/// One component of an index key.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexKey {
    Text(String),
    Integer(i64),
}

impl ToSql for IndexKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            IndexKey::Text(value) => value.to_sql(),
            IndexKey::Integer(value) => value.to_sql(),
        }
    }
}

impl From<&str> for IndexKey {
    fn from(value: &str) -> Self {
        IndexKey::Text(value.to_string())
    }
}

impl From<String> for IndexKey {
    fn from(value: String) -> Self {
        IndexKey::Text(value)
    }
}

impl From<i64> for IndexKey {
    fn from(value: i64) -> Self {
        IndexKey::Integer(value)
    }
}

/// Dates are keyed by their stored `YYYY-MM-DD` form, which orders
/// chronologically.
impl From<NaiveDate> for IndexKey {
    fn from(value: NaiveDate) -> Self {
        IndexKey::Text(value.format("%Y-%m-%d").to_string())
    }
}

/// Which keys a cursor visits.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyRange {
    All,
    /// Keys equal to these components, one per key path.
    Only(Vec<IndexKey>),
    /// Keys between `lower` and `upper`, both inclusive. Single-component
    /// keys only.
    Bound { lower: IndexKey, upper: IndexKey },
}

impl KeyRange {
    pub fn only(key: impl Into<IndexKey>) -> Self {
        KeyRange::Only(vec![key.into()])
    }

    pub fn bound(lower: impl Into<IndexKey>, upper: impl Into<IndexKey>) -> Self {
        KeyRange::Bound {
            lower: lower.into(),
            upper: upper.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorSource {
    /// Iterate the store by primary key.
    Store,
    /// Iterate an index by (index key, primary key).
    Index(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CursorQuery {
    pub source: CursorSource,
    pub range: KeyRange,
}

impl CursorQuery {
    pub fn all() -> Self {
        Self {
            source: CursorSource::Store,
            range: KeyRange::All,
        }
    }

    pub fn index(name: &'static str, range: KeyRange) -> Self {
        Self {
            source: CursorSource::Index(name),
            range,
        }
    }
}
