//! # Alteration Module
//!
//! Diffs a [`crate::catalog::TableSpec`] (what the `Model` declares) against
//! a [`crate::analyzer::LiveTable`] (what the database actually has) and
//! produces an ordered [`AlterationPlan`] of steps to reconcile them:
//! missing tables, missing/changed columns, missing/changed indexes, and
//! missing/changed foreign keys. Dropping something the live schema has but
//! the model no longer declares is additive data loss, so it is only
//! planned when the caller passes `destructive: true` — mirroring the
//! `CREATE TABLE IF NOT EXISTS` / `ADD CONSTRAINT IF NOT EXISTS` philosophy
//! the rest of this crate already uses for the non-destructive case.

use crate::{
    analyzer::LiveTable,
    catalog::TableSpec,
    model::{ColumnInfo, ForeignKeyAction},
};

/// One reconciling action, in the order it must be applied.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterationStep {
    /// The table doesn't exist yet; create it with every declared column.
    CreateTable,
    /// The table exists but is missing this column.
    AddColumn(String),
    /// The column exists on both sides but its rendered type, nullability,
    /// or default diverges from the declared `ColumnInfo`.
    ModifyColumn(String),
    /// The live table has a column the model no longer declares. Only
    /// emitted when the plan was computed with `destructive: true`.
    DropColumn(String),
    /// The table is missing this index.
    AddIndex(String),
    /// The live table has an index the model no longer declares, or one
    /// whose uniqueness/column list no longer matches — paired with an
    /// `AddIndex` of the same name when the index should still exist in
    /// a different shape.
    DropIndex(String),
    /// The table is missing this foreign key.
    AddForeignKey(String),
    /// The live table has a foreign key the model no longer declares, or
    /// one whose local/referenced column no longer matches — paired with
    /// an `AddForeignKey` of the same name when the FK should still exist
    /// in a different shape.
    DropForeignKey(String),
}

/// An ordered list of steps that reconciles a live table with its `TableSpec`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlterationPlan {
    pub steps: Vec<AlterationStep>,
    /// Live columns absent from the model that would have been dropped had
    /// the plan been computed with `destructive: true`. Surfaced so the
    /// synchronizer can log a warning instead of silently discarding data
    /// (§4.9 Safety rule).
    pub skipped_drops: Vec<String>,
}

impl AlterationPlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn clean_name(name: &str) -> String {
    use heck::ToSnakeCase;
    name.strip_prefix("r#").unwrap_or(name).to_snake_case()
}

/// Computes the [`AlterationPlan`] that brings `live` in line with `spec`.
///
/// `destructive` gates every step that would discard live state the model
/// no longer declares (dropped columns); dropped-but-unplanned columns are
/// still surfaced via [`AlterationPlan::skipped_drops`] rather than
/// silently ignored.
pub fn diff(spec: &TableSpec, live: &LiveTable, destructive: bool) -> AlterationPlan {
    let mut steps = Vec::new();
    let mut skipped_drops = Vec::new();

    if !live.exists {
        steps.push(AlterationStep::CreateTable);
        return AlterationPlan { steps, skipped_drops };
    }

    for column in missing_columns(spec, live) {
        steps.push(AlterationStep::AddColumn(column));
    }

    for column in changed_columns(spec, live) {
        steps.push(AlterationStep::ModifyColumn(column));
    }

    for column in live_only_columns(spec, live) {
        if destructive {
            steps.push(AlterationStep::DropColumn(column));
        } else {
            skipped_drops.push(column);
        }
    }

    for index in &spec.indexes {
        match live.indexes.iter().find(|i| i.name == index.name) {
            None => steps.push(AlterationStep::AddIndex(index.name.clone())),
            Some(live_index) if live_index.unique != index.unique => {
                steps.push(AlterationStep::DropIndex(index.name.clone()));
                steps.push(AlterationStep::AddIndex(index.name.clone()));
            }
            Some(_) => {}
        }
    }
    for live_index in &live.indexes {
        if !spec.indexes.iter().any(|i| i.name == live_index.name) {
            steps.push(AlterationStep::DropIndex(live_index.name.clone()));
        }
    }

    for fk in &spec.foreign_keys {
        match live.foreign_keys.iter().find(|f| f.constraint_name == fk.constraint_name) {
            None => steps.push(AlterationStep::AddForeignKey(fk.constraint_name.clone())),
            Some(live_fk)
                if live_fk.column != fk.local_column
                    || live_fk.referenced_table != fk.referenced_table
                    || live_fk.referenced_column != fk.referenced_column
                    || live_fk.on_update != fk.on_update
                    || live_fk.on_delete != fk.on_delete =>
            {
                steps.push(AlterationStep::DropForeignKey(fk.constraint_name.clone()));
                steps.push(AlterationStep::AddForeignKey(fk.constraint_name.clone()));
            }
            Some(_) => {}
        }
    }
    for live_fk in &live.foreign_keys {
        if !spec.foreign_keys.iter().any(|f| f.constraint_name == live_fk.constraint_name) {
            steps.push(AlterationStep::DropForeignKey(live_fk.constraint_name.clone()));
        }
    }

    AlterationPlan { steps, skipped_drops }
}

fn missing_columns(spec: &TableSpec, live: &LiveTable) -> Vec<String> {
    spec.columns
        .iter()
        .map(|c: &ColumnInfo| clean_name(c.name))
        .filter(|name| !live.columns.iter().any(|lc| &lc.name == name))
        .collect()
}

fn live_only_columns(spec: &TableSpec, live: &LiveTable) -> Vec<String> {
    live.columns
        .iter()
        .map(|lc| lc.name.clone())
        .filter(|name| !spec.columns.iter().any(|c| &clean_name(c.name) == name))
        .collect()
}

/// A declared column whose rendered type, nullability, or
/// `CURRENT_TIMESTAMP` default doesn't match what's live. Primary-key and
/// auto-increment shape changes are intentionally out of scope here — the
/// host crate's `ColumnInfo` doesn't carry a separate auto-increment flag
/// distinct from `sql_type`, so a type-string change already covers it.
fn changed_columns(spec: &TableSpec, live: &LiveTable) -> Vec<String> {
    let mut changed = Vec::new();
    for col in &spec.columns {
        let name = clean_name(col.name);
        let Some(live_col) = live.columns.iter().find(|lc| lc.name == name) else {
            continue;
        };

        let type_mismatch = !rendered_types_equivalent(&live_col.sql_type, col.sql_type);
        let nullable_mismatch = live_col.nullable != (col.is_nullable && !col.is_primary_key);
        let default_mismatch = col.create_time && !has_current_timestamp_default(&live_col.default);

        if type_mismatch || nullable_mismatch || default_mismatch {
            changed.push(name);
        }
    }
    changed
}

/// Case-insensitive, whitespace-insensitive comparison of a live rendered
/// type against the declared one, per §4.9 diff step 1.
fn rendered_types_equivalent(live: &str, declared: &str) -> bool {
    normalize_type(live) == normalize_type(declared)
}

fn normalize_type(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_uppercase()
}

/// Treats any `CURRENT_TIMESTAMP` spelling (with or without a trailing
/// `()`, any case) as equal, per §4.9 diff step 4.
fn has_current_timestamp_default(default: &Option<String>) -> bool {
    match default {
        Some(d) => {
            let trimmed = d.trim().trim_end_matches("()").to_ascii_uppercase();
            trimmed == "CURRENT_TIMESTAMP" || trimmed == "NOW"
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{LiveColumn, LiveIndex};
    use crate::catalog::{ForeignKeySpec, IndexSpec};

    fn spec() -> TableSpec {
        TableSpec {
            table_name: "Widget",
            columns: vec![
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
            ],
            primary_key: vec!["id".to_string()],
            indexes: vec![IndexSpec { name: "idx_widget_owner_id".into(), unique: false, columns: vec!["owner_id".into()] }],
            foreign_keys: vec![ForeignKeySpec {
                constraint_name: "fk_widget_owner_id".into(),
                local_column: "owner_id".into(),
                referenced_table: "user".into(),
                referenced_column: "id".into(),
                on_update: ForeignKeyAction::Restrict,
                on_delete: ForeignKeyAction::Cascade,
            }],
        }
    }

    #[test]
    fn missing_table_plans_create() {
        let plan = diff(&spec(), &LiveTable::default(), false);
        assert_eq!(plan.steps, vec![AlterationStep::CreateTable]);
    }

    #[test]
    fn existing_table_with_everything_plans_nothing() {
        let live = LiveTable {
            exists: true,
            columns: vec![
                LiveColumn { name: "id".into(), sql_type: "INTEGER".into(), nullable: false, default: None },
                LiveColumn { name: "owner_id".into(), sql_type: "INTEGER".into(), nullable: false, default: None },
            ],
            indexes: vec![LiveIndex { name: "idx_widget_owner_id".into(), unique: false }],
            foreign_keys: vec![crate::analyzer::LiveForeignKey {
                constraint_name: "fk_widget_owner_id".into(),
                column: "owner_id".into(),
                referenced_table: "user".into(),
                referenced_column: "id".into(),
                on_update: ForeignKeyAction::Restrict,
                on_delete: ForeignKeyAction::Cascade,
            }],
        };
        assert!(diff(&spec(), &live, false).is_empty());
    }

    #[test]
    fn existing_table_missing_column_and_fk_plans_both() {
        let live = LiveTable {
            exists: true,
            columns: vec![LiveColumn { name: "id".into(), sql_type: "INTEGER".into(), nullable: false, default: None }],
            indexes: vec![],
            foreign_keys: vec![],
        };
        let plan = diff(&spec(), &live, false);
        assert!(plan.steps.contains(&AlterationStep::AddColumn("owner_id".into())));
        assert!(plan.steps.contains(&AlterationStep::AddIndex("idx_widget_owner_id".into())));
        assert!(plan.steps.contains(&AlterationStep::AddForeignKey("fk_widget_owner_id".into())));
    }

    #[test]
    fn type_mismatch_plans_modify_column() {
        let live = LiveTable {
            exists: true,
            columns: vec![
                LiveColumn { name: "id".into(), sql_type: "INTEGER".into(), nullable: false, default: None },
                LiveColumn { name: "owner_id".into(), sql_type: "VARCHAR(255)".into(), nullable: false, default: None },
            ],
            indexes: vec![LiveIndex { name: "idx_widget_owner_id".into(), unique: false }],
            foreign_keys: vec![crate::analyzer::LiveForeignKey {
                constraint_name: "fk_widget_owner_id".into(),
                column: "owner_id".into(),
                referenced_table: "user".into(),
                referenced_column: "id".into(),
                on_update: ForeignKeyAction::Restrict,
                on_delete: ForeignKeyAction::Cascade,
            }],
        };
        let plan = diff(&spec(), &live, false);
        assert_eq!(plan.steps, vec![AlterationStep::ModifyColumn("owner_id".into())]);
    }

    #[test]
    fn live_only_column_is_skipped_unless_destructive() {
        let live = LiveTable {
            exists: true,
            columns: vec![
                LiveColumn { name: "id".into(), sql_type: "INTEGER".into(), nullable: false, default: None },
                LiveColumn { name: "owner_id".into(), sql_type: "INTEGER".into(), nullable: false, default: None },
                LiveColumn { name: "legacy_flag".into(), sql_type: "INTEGER".into(), nullable: true, default: None },
            ],
            indexes: vec![LiveIndex { name: "idx_widget_owner_id".into(), unique: false }],
            foreign_keys: vec![crate::analyzer::LiveForeignKey {
                constraint_name: "fk_widget_owner_id".into(),
                column: "owner_id".into(),
                referenced_table: "user".into(),
                referenced_column: "id".into(),
                on_update: ForeignKeyAction::Restrict,
                on_delete: ForeignKeyAction::Cascade,
            }],
        };

        let non_destructive = diff(&spec(), &live, false);
        assert!(non_destructive.steps.is_empty());
        assert_eq!(non_destructive.skipped_drops, vec!["legacy_flag".to_string()]);

        let destructive = diff(&spec(), &live, true);
        assert_eq!(destructive.steps, vec![AlterationStep::DropColumn("legacy_flag".into())]);
        assert!(destructive.skipped_drops.is_empty());
    }

    #[test]
    fn index_uniqueness_mismatch_plans_drop_then_add() {
        let live = LiveTable {
            exists: true,
            columns: vec![
                LiveColumn { name: "id".into(), sql_type: "INTEGER".into(), nullable: false, default: None },
                LiveColumn { name: "owner_id".into(), sql_type: "INTEGER".into(), nullable: false, default: None },
            ],
            indexes: vec![LiveIndex { name: "idx_widget_owner_id".into(), unique: true }],
            foreign_keys: vec![crate::analyzer::LiveForeignKey {
                constraint_name: "fk_widget_owner_id".into(),
                column: "owner_id".into(),
                referenced_table: "user".into(),
                referenced_column: "id".into(),
                on_update: ForeignKeyAction::Restrict,
                on_delete: ForeignKeyAction::Cascade,
            }],
        };
        let plan = diff(&spec(), &live, false);
        assert_eq!(
            plan.steps,
            vec![AlterationStep::DropIndex("idx_widget_owner_id".into()), AlterationStep::AddIndex("idx_widget_owner_id".into())]
        );
    }
}
