//! # Catalog Module
//!
//! Resolves a [`Model`] type to a [`TableSpec`] — the canonical description
//! of columns, primary key, indexes, and foreign keys used by schema
//! synchronization. `Model::columns()`/`Model::table_name()` are already a
//! zero-cost static call generated at compile time by `#[derive(Model)]`, so
//! the "memoized once for the process lifetime" requirement from the
//! specification is trivially satisfied for those — this module only adds a
//! process-lifetime cache for the genuinely derived values that are worth
//! not recomputing on every call: the synthesized index/foreign-key names.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use heck::ToSnakeCase;

use crate::model::{ColumnInfo, ForeignKeyAction, Model};

/// One index declared (explicitly via `#[orm(index)]`/`#[orm(unique)]`, or
/// implicitly as the primary key) over a table.
#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

/// One foreign-key relationship declared on a column.
#[derive(Debug, Clone)]
pub struct ForeignKeySpec {
    pub constraint_name: String,
    pub local_column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub on_update: ForeignKeyAction,
    pub on_delete: ForeignKeyAction,
}

/// The canonical, normalized description of one model's table — resolved
/// once from `Model::columns()`/`Model::table_name()` and cached per type.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub table_name: &'static str,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<String>,
    pub indexes: Vec<IndexSpec>,
    pub foreign_keys: Vec<ForeignKeySpec>,
}

impl TableSpec {
    fn build<T: Model>() -> Self {
        let table_name = T::table_name();
        let table_snake = table_name.to_snake_case();
        let columns = T::columns();

        let primary_key: Vec<String> = columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| clean_name(c.name))
            .collect();

        let mut indexes = Vec::new();
        for col in &columns {
            let col_name = clean_name(col.name);
            if col.unique {
                indexes.push(IndexSpec {
                    name: format!("uq_{}_{}", table_snake, col_name),
                    unique: true,
                    columns: vec![col_name.clone()],
                });
            } else if col.index {
                indexes.push(IndexSpec {
                    name: format!("idx_{}_{}", table_snake, col_name),
                    unique: false,
                    columns: vec![col_name.clone()],
                });
            }
        }

        let mut foreign_keys = Vec::new();
        for col in &columns {
            if let (Some(f_table), Some(f_key)) = (col.foreign_table, col.foreign_key) {
                let col_name = clean_name(col.name);
                foreign_keys.push(ForeignKeySpec {
                    constraint_name: format!("fk_{}_{}", table_snake, col_name),
                    local_column: col_name,
                    referenced_table: f_table.to_snake_case(),
                    referenced_column: clean_name(f_key),
                    on_update: col.foreign_key_on_update,
                    on_delete: col.foreign_key_on_delete,
                });
            }
        }

        Self { table_name, columns, primary_key, indexes, foreign_keys }
    }
}

fn clean_name(name: &str) -> String {
    name.strip_prefix("r#").unwrap_or(name).to_snake_case()
}

/// Process-lifetime cache keyed by the model's `TypeId`, guarding against
/// re-synthesizing index/foreign-key names on every call.
static CATALOG: OnceLock<Mutex<HashMap<TypeId, &'static (dyn Any + Send + Sync)>>> = OnceLock::new();

/// Returns the memoized [`TableSpec`] for `T`, building and caching it on
/// first access. The returned reference is valid for the process lifetime.
pub fn table_spec<T: Model + 'static>() -> &'static TableSpec {
    let cache = CATALOG.get_or_init(|| Mutex::new(HashMap::new()));
    let type_id = TypeId::of::<T>();

    {
        let guard = cache.lock().expect("catalog mutex poisoned");
        if let Some(existing) = guard.get(&type_id) {
            return existing.downcast_ref::<TableSpec>().expect("catalog type mismatch");
        }
    }

    let spec = Box::leak(Box::new(TableSpec::build::<T>())) as &'static TableSpec;
    let mut guard = cache.lock().expect("catalog mutex poisoned");
    guard.entry(type_id).or_insert(spec);
    guard.get(&type_id).expect("just inserted").downcast_ref::<TableSpec>().expect("catalog type mismatch")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;

    struct Widget;

    impl Model for Widget {
        fn table_name() -> &'static str {
            "Widget"
        }

        fn columns() -> Vec<ColumnInfo> {
            vec![
                ColumnInfo {
                    name: "id",
                    sql_type: "INTEGER",
                    is_primary_key: true,
                    is_nullable: false,
                    create_time: false,
                    update_time: false,
                    unique: false,
                    index: false,
                    foreign_table: None,
                    foreign_key: None,
                    foreign_key_on_update: ForeignKeyAction::NoAction,
                    foreign_key_on_delete: ForeignKeyAction::NoAction,
                    omit: false,
                    soft_delete: false,
                },
                ColumnInfo {
                    name: "owner_id",
                    sql_type: "INTEGER",
                    is_primary_key: false,
                    is_nullable: false,
                    create_time: false,
                    update_time: false,
                    unique: false,
                    index: true,
                    foreign_table: Some("User"),
                    foreign_key: Some("id"),
                    foreign_key_on_update: ForeignKeyAction::Restrict,
                    foreign_key_on_delete: ForeignKeyAction::Cascade,
                    omit: false,
                    soft_delete: false,
                },
            ]
        }

        fn active_columns() -> Vec<&'static str> {
            vec!["id", "owner_id"]
        }

        fn to_map(&self) -> StdHashMap<String, String> {
            StdHashMap::new()
        }
    }

    #[test]
    fn table_spec_derives_primary_key_and_foreign_keys() {
        let spec = table_spec::<Widget>();
        assert_eq!(spec.table_name, "Widget");
        assert_eq!(spec.primary_key, vec!["id".to_string()]);
        assert_eq!(spec.foreign_keys.len(), 1);
        assert_eq!(spec.foreign_keys[0].constraint_name, "fk_widget_owner_id");
        assert_eq!(spec.foreign_keys[0].referenced_table, "user");
        assert_eq!(spec.foreign_keys[0].on_update, ForeignKeyAction::Restrict);
        assert_eq!(spec.foreign_keys[0].on_delete, ForeignKeyAction::Cascade);
    }

    #[test]
    fn table_spec_synthesizes_index_name() {
        let spec = table_spec::<Widget>();
        let idx = spec.indexes.iter().find(|i| i.columns == vec!["owner_id".to_string()]).expect("index present");
        assert_eq!(idx.name, "idx_widget_owner_id");
        assert!(!idx.unique);
    }

    #[test]
    fn table_spec_is_memoized_across_calls() {
        let a = table_spec::<Widget>() as *const TableSpec;
        let b = table_spec::<Widget>() as *const TableSpec;
        assert_eq!(a, b);
    }
}
