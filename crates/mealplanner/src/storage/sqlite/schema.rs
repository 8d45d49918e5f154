//! Object store and index definitions.
//!
//! Pure data plus the DDL derived from it. Every store is a table holding one
//! JSON record per key; every index is an expression index over fields of
//! that record.

use mealplanner_core::storage::StoreName;

/// Version recorded in `PRAGMA user_version` once the schema is in place.
pub const SCHEMA_VERSION: i64 = 1;

/// A secondary index over one or more record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    /// Dotted paths into the record, in key order.
    pub key_paths: &'static [&'static str],
    pub unique: bool,
}

impl IndexDef {
    const fn new(name: &'static str, key_paths: &'static [&'static str], unique: bool) -> Self {
        Self {
            name,
            key_paths,
            unique,
        }
    }

    /// SQL expressions producing the index key, one per key path.
    pub fn key_expressions(&self) -> Vec<String> {
        self.key_paths.iter().map(|path| field_expression(path)).collect()
    }

    fn sql_name(&self, store: StoreName) -> String {
        format!("idx_{}_{}", store.as_str(), self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreDef {
    pub name: StoreName,
    pub indexes: &'static [IndexDef],
}

impl StoreDef {
    pub fn index(&self, name: &str) -> Option<&'static IndexDef> {
        self.indexes.iter().find(|index| index.name == name)
    }

    pub fn table(&self) -> &'static str {
        self.name.as_str()
    }
}

const CATEGORY_INDEXES: &[IndexDef] = &[
    IndexDef::new("name", &["name"], true),
    IndexDef::new("sortOrder", &["sortOrder"], false),
];

const UNIT_INDEXES: &[IndexDef] = &[
    IndexDef::new("name", &["name"], true),
    IndexDef::new("type", &["type"], false),
];

const ITEM_INDEXES: &[IndexDef] = &[
    IndexDef::new("name", &["name"], true),
    IndexDef::new("categoryId", &["categoryId"], false),
    IndexDef::new("itemType", &["itemType"], false),
    IndexDef::new("itemType_dish", &["itemType", "readyMealData.dish"], false),
];

const RECIPE_INDEXES: &[IndexDef] = &[
    IndexDef::new("name", &["name"], false),
    IndexDef::new("dish", &["dish"], false),
    IndexDef::new("course", &["course"], false),
];

const MEAL_INDEXES: &[IndexDef] = &[IndexDef::new("date", &["date"], false)];

pub const STORES: &[StoreDef] = &[
    StoreDef {
        name: StoreName::Categories,
        indexes: CATEGORY_INDEXES,
    },
    StoreDef {
        name: StoreName::Units,
        indexes: UNIT_INDEXES,
    },
    StoreDef {
        name: StoreName::Items,
        indexes: ITEM_INDEXES,
    },
    StoreDef {
        name: StoreName::Recipes,
        indexes: RECIPE_INDEXES,
    },
    StoreDef {
        name: StoreName::Meals,
        indexes: MEAL_INDEXES,
    },
];

pub fn store_def(name: StoreName) -> &'static StoreDef {
    match name {
        StoreName::Categories => &STORES[0],
        StoreName::Units => &STORES[1],
        StoreName::Items => &STORES[2],
        StoreName::Recipes => &STORES[3],
        StoreName::Meals => &STORES[4],
    }
}

/// SQL expression reading `path` out of a stored record.
pub fn field_expression(path: &str) -> String {
    format!("json_extract(record, '$.{path}')")
}

/// Statements creating every store and index that is missing. Safe to run
/// against a database that already has some or all of them.
pub fn create_statements() -> Vec<String> {
    let mut statements = Vec::new();
    for store in STORES {
        statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY NOT NULL, record TEXT NOT NULL)",
            store.table()
        ));
        for index in store.indexes {
            statements.push(format!(
                "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
                if index.unique { "UNIQUE " } else { "" },
                index.sql_name(store.name),
                store.table(),
                index.key_expressions().join(", ")
            ));
        }
    }
    statements
}
