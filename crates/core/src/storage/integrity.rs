//! Declarative table of weak references between stores.
//!
//! Every delete path consults [`references_to`] for the store it deletes
//! from. `Restrict` rows block the delete while referencing records exist;
//! `Unchecked` rows are listed so the missing enforcement stays visible, and
//! backends log them instead of counting.

use serde_json::Value;

use crate::codec::Record;

use super::StoreName;

/// What a delete does about records that still reference the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enforcement {
    /// Refuse the delete while any referencing record exists.
    Restrict,
    /// Allow the delete and leave references dangling.
    Unchecked,
}

/// One weak reference from records of `referencing` to records of
/// `referenced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub referenced: StoreName,
    pub referencing: StoreName,
    /// Path to the referencing field. `[]` marks an array whose elements are
    /// each inspected.
    pub key_path: &'static str,
    /// Index over `key_path` in the referencing store, when one exists.
    pub index: Option<&'static str>,
    pub enforcement: Enforcement,
}

pub const REFERENCES: &[Reference] = &[
    Reference {
        referenced: StoreName::Categories,
        referencing: StoreName::Items,
        key_path: "categoryId",
        index: Some("categoryId"),
        enforcement: Enforcement::Restrict,
    },
    Reference {
        referenced: StoreName::Items,
        referencing: StoreName::Recipes,
        key_path: "ingredients[].itemId",
        index: None,
        enforcement: Enforcement::Unchecked,
    },
    Reference {
        referenced: StoreName::Units,
        referencing: StoreName::Recipes,
        key_path: "ingredients[].unitId",
        index: None,
        enforcement: Enforcement::Unchecked,
    },
    Reference {
        referenced: StoreName::Items,
        referencing: StoreName::Meals,
        key_path: "dishes[].readyMealId",
        index: None,
        enforcement: Enforcement::Unchecked,
    },
    Reference {
        referenced: StoreName::Recipes,
        referencing: StoreName::Meals,
        key_path: "dishes[].recipeId",
        index: None,
        enforcement: Enforcement::Unchecked,
    },
];

/// References pointing at records of `store`.
pub fn references_to(store: StoreName) -> impl Iterator<Item = &'static Reference> {
    REFERENCES.iter().filter(move |r| r.referenced == store)
}

/// Stores a delete from `store` needs to read, including `store` itself.
pub fn delete_scope(store: StoreName) -> Vec<StoreName> {
    let mut scope = vec![store];
    for reference in references_to(store) {
        if reference.enforcement == Enforcement::Restrict && !scope.contains(&reference.referencing)
        {
            scope.push(reference.referencing);
        }
    }
    scope
}

impl Reference {
    /// Whether `record` (from the referencing store) points at `id`.
    pub fn matches(&self, record: &Record, id: &str) -> bool {
        let segments: Vec<&str> = self.key_path.split('.').collect();
        let root = Value::Object(record.clone());
        path_contains(&root, &segments, id)
    }
}

fn path_contains(value: &Value, segments: &[&str], id: &str) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return value.as_str() == Some(id);
    };

    match first.strip_suffix("[]") {
        Some(field) => match value.get(field) {
            Some(Value::Array(elements)) => elements.iter().any(|e| path_contains(e, rest, id)),
            _ => false,
        },
        None => value
            .get(*first)
            .is_some_and(|nested| path_contains(nested, rest, id)),
    }
}
