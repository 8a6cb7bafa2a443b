//! # Synchronizer Module
//!
//! Executes an [`AlterationPlan`] against a live connection: creates
//! missing tables, adds or alters columns and indexes, reconciles foreign
//! keys, and — when a `ModifyColumn` is blocked by a foreign key the
//! backend won't let it touch in place — performs the **FK reconstruction
//! dance**: read every foreign key referencing the table, drop them, retry
//! the blocked `ALTER`, recreate each dropped constraint with its original
//! definition. Callers go through [`sync_table`], which wraps the whole
//! thing: read live schema, diff, apply, return the plan that was applied
//! so the caller (or a migration-history tracker) can record what happened.

use heck::ToSnakeCase;

use crate::{
    alteration::{self, AlterationStep},
    analyzer,
    catalog::{self, TableSpec},
    database::{Database, Drivers},
    dialect::Dialect,
    error::Error,
    model::{ColumnInfo, Model},
};

/// Runs one table through analyze → diff → apply.
///
/// `destructive` governs whether columns the model no longer declares are
/// dropped (§4.9 Safety rule); it never affects whether a missing table is
/// created or missing columns/indexes/foreign keys are added.
///
/// Re-running this against a converged schema returns an empty plan and
/// issues no DDL (§4.9 Idempotence, tested by P3/P4).
pub async fn sync_table<T: Model + 'static>(db: &Database, destructive: bool) -> Result<alteration::AlterationPlan, Error> {
    let spec = catalog::table_spec::<T>();
    let live = analyzer::inspect_table(db, spec.table_name).await?;
    let plan = alteration::diff(spec, &live, destructive);

    for warning in &plan.skipped_drops {
        log::warn!(
            "column `{}` on table `{}` is not declared by the model but destructive sync is disabled; leaving it in place",
            warning,
            spec.table_name.to_snake_case(),
        );
    }

    if plan.is_empty() {
        log::debug!("schema for `{}` already converged; no-op sync", spec.table_name.to_snake_case());
        return Ok(plan);
    }

    apply_plan::<T>(db, spec, &plan).await?;
    Ok(plan)
}

async fn apply_plan<T: Model + 'static>(
    db: &Database,
    spec: &TableSpec,
    plan: &alteration::AlterationPlan,
) -> Result<(), Error> {
    let table = spec.table_name.to_snake_case();

    for step in &plan.steps {
        log::info!("applying {:?} to table `{}`", step, table);
        match step {
            AlterationStep::CreateTable => {
                // Foreign keys are deliberately not assigned here: at
                // first-creation time a referenced table registered later
                // in the same migration batch may not exist yet. The
                // `Migrator` runs every registered model through
                // `sync_table` a second time after every table exists,
                // which picks up `AddForeignKey` steps as an ordinary diff
                // once the live schema reports `exists: true`.
                db.create_table::<T>().await.map_err(Error::from)?;
            }
            AlterationStep::AddColumn(name) => add_column(db, &table, spec, name).await?,
            AlterationStep::ModifyColumn(name) => modify_column_with_dance(db, &table, spec, name).await?,
            AlterationStep::DropColumn(name) => drop_column(db, &table, name).await?,
            AlterationStep::AddIndex(name) => add_index(db, &table, spec, name).await?,
            AlterationStep::DropIndex(name) => drop_index(db, &table, name).await?,
            AlterationStep::AddForeignKey(name) => add_foreign_key(db, &table, spec, name).await?,
            AlterationStep::DropForeignKey(name) => drop_foreign_key(db, &table, name).await?,
        }
    }

    Ok(())
}

fn clean_name(name: &str) -> String {
    name.strip_prefix("r#").unwrap_or(name).to_snake_case()
}

fn find_column<'a>(spec: &'a TableSpec, name: &str) -> Option<&'a ColumnInfo> {
    spec.columns.iter().find(|c| clean_name(c.name) == name)
}

/// Renders the body of a column definition (type + constraints, no name) —
/// the same shape `Database::create_table` inlines per-column, factored out
/// so `ModifyColumn`/`AddColumn` can reuse it instead of duplicating the
/// constraint logic.
fn column_definition_clause(col: &ColumnInfo) -> String {
    let mut def = col.sql_type.to_string();
    if !col.is_nullable && !col.is_primary_key {
        def.push_str(" NOT NULL");
    }
    if col.create_time {
        def.push_str(" DEFAULT CURRENT_TIMESTAMP");
    }
    if col.unique {
        def.push_str(" UNIQUE");
    }
    def
}

async fn add_column(db: &Database, table: &str, spec: &TableSpec, name: &str) -> Result<(), Error> {
    let Some(col) = find_column(spec, name) else {
        return Err(Error::schema(&format!("AddColumn referenced unknown column `{}`", name)));
    };
    let ident = db.driver.quote_ident(name);
    let table_ident = db.driver.quote_ident(table);
    let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table_ident, ident, column_definition_clause(col));
    sqlx::query(&sql).execute(&db.pool).await.map_err(Error::from)?;
    Ok(())
}

async fn drop_column(db: &Database, table: &str, name: &str) -> Result<(), Error> {
    let ident = db.driver.quote_ident(name);
    let table_ident = db.driver.quote_ident(table);
    let sql = format!("ALTER TABLE {} DROP COLUMN {}", table_ident, ident);
    sqlx::query(&sql).execute(&db.pool).await.map_err(Error::from)?;
    Ok(())
}

/// Renders the backend-specific "change an existing column" statement.
/// SQLite has no `ALTER COLUMN`/`MODIFY COLUMN` short of a full table
/// rebuild, which this crate doesn't attempt (out of scope per §1
/// Non-goals: "multi-statement transactional migration engines") — the
/// mismatch is logged and left for the caller to reconcile by hand.
fn modify_column_sql(driver: Drivers, table_ident: &str, ident: &str, col: &ColumnInfo) -> Option<String> {
    match driver {
        Drivers::Postgres => Some(format!(
            "ALTER TABLE {table} ALTER COLUMN {col} TYPE {ty}, ALTER COLUMN {col} {nullability}",
            table = table_ident,
            col = ident,
            ty = col.sql_type,
            nullability = if col.is_nullable && !col.is_primary_key { "DROP NOT NULL" } else { "SET NOT NULL" },
        )),
        Drivers::MySQL => {
            Some(format!("ALTER TABLE {} MODIFY COLUMN {} {}", table_ident, ident, column_definition_clause(col)))
        }
        Drivers::SQLite => None,
    }
}

async fn modify_column(db: &Database, table: &str, spec: &TableSpec, name: &str) -> Result<(), Error> {
    let Some(col) = find_column(spec, name) else {
        return Err(Error::schema(&format!("ModifyColumn referenced unknown column `{}`", name)));
    };
    let ident = db.driver.quote_ident(name);
    let table_ident = db.driver.quote_ident(table);
    match modify_column_sql(db.driver, &table_ident, &ident, col) {
        Some(sql) => {
            sqlx::query(&sql).execute(&db.pool).await.map_err(Error::from)?;
            Ok(())
        }
        None => {
            log::warn!(
                "table `{}` column `{}` diverges from the model but SQLite doesn't support in-place ALTER COLUMN; leaving it as-is",
                table,
                name,
            );
            Ok(())
        }
    }
}

/// MySQL error numbers the driver reports when an `ALTER`/`MODIFY` touches
/// a column a foreign key depends on (1822: "Failed to add the foreign key
/// constraint", 1217: "Cannot delete or update a parent row", 1451: same,
/// the FK-dependency family named in §4.9). Postgres's analog is
/// `2BP01`/`0A000` ("dependent objects still exist" / unsupported ALTER
/// under an active constraint).
fn is_fk_blocked_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => matches!(code.as_ref(), "1822" | "1217" | "1451" | "2BP01" | "0A000"),
            None => false,
        },
        _ => false,
    }
}

/// Applies a `ModifyColumn` step, performing the FK reconstruction dance if
/// the first attempt fails with an FK-dependency error: every foreign key
/// (on any table) referencing this column's table is read, dropped, the
/// `ALTER` is retried, and each dropped constraint is recreated with its
/// original definition. SQLite never reaches the retry path since it has
/// no catalog-wide reverse FK lookup and no `ADD`/`DROP CONSTRAINT`.
async fn modify_column_with_dance(db: &Database, table: &str, spec: &TableSpec, name: &str) -> Result<(), Error> {
    match modify_column(db, table, spec, name).await {
        Ok(()) => Ok(()),
        Err(Error::Execution(err)) if is_fk_blocked_error(&err) && db.driver != Drivers::SQLite => {
            run_fk_dance(db, table, spec, name).await
        }
        Err(other) => Err(other),
    }
}

async fn run_fk_dance(db: &Database, table: &str, spec: &TableSpec, name: &str) -> Result<(), Error> {
    log::warn!("ALTER on `{}`.`{}` blocked by a foreign key; starting FK reconstruction dance", table, name);

    let blocking = analyzer::referencing_foreign_keys(db, table).await?;

    for fk in &blocking {
        let sql = drop_foreign_key_sql(db.driver, &db.driver.quote_ident(&fk.owning_table), &db.driver.quote_ident(&fk.constraint_name));
        sqlx::query(&sql).execute(&db.pool).await.map_err(Error::from)?;
    }

    let retry = modify_column(db, table, spec, name).await;

    for fk in &blocking {
        let recreate = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
            db.driver.quote_ident(&fk.owning_table),
            db.driver.quote_ident(&fk.constraint_name),
            db.driver.quote_ident(&fk.column),
            db.driver.quote_ident(table),
            db.driver.quote_ident(&fk.referenced_column),
            fk.on_update.as_sql(),
            fk.on_delete.as_sql(),
        );
        sqlx::query(&recreate).execute(&db.pool).await.map_err(Error::from)?;
    }

    retry
}

async fn add_index(db: &Database, table: &str, spec: &TableSpec, name: &str) -> Result<(), Error> {
    let Some(index) = spec.indexes.iter().find(|i| i.name == name) else {
        return Err(Error::schema(&format!("AddIndex referenced unknown index `{}`", name)));
    };
    let cols: Vec<String> = index.columns.iter().map(|c| db.driver.quote_ident(c)).collect();
    let kind = if index.unique { "UNIQUE INDEX" } else { "INDEX" };
    let sql = format!(
        "CREATE {} IF NOT EXISTS {} ON {} ({})",
        kind,
        db.driver.quote_ident(name),
        db.driver.quote_ident(table),
        cols.join(", "),
    );
    sqlx::query(&sql).execute(&db.pool).await.map_err(Error::from)?;
    Ok(())
}

async fn drop_index(db: &Database, table: &str, name: &str) -> Result<(), Error> {
    let sql = match db.driver {
        Drivers::MySQL => format!("DROP INDEX {} ON {}", db.driver.quote_ident(name), db.driver.quote_ident(table)),
        Drivers::Postgres | Drivers::SQLite => format!("DROP INDEX IF EXISTS {}", db.driver.quote_ident(name)),
    };
    sqlx::query(&sql).execute(&db.pool).await.map_err(Error::from)?;
    Ok(())
}

async fn add_foreign_key(db: &Database, table: &str, spec: &TableSpec, name: &str) -> Result<(), Error> {
    let Some(fk) = spec.foreign_keys.iter().find(|f| f.constraint_name == name) else {
        return Err(Error::schema(&format!("AddForeignKey referenced unknown constraint `{}`", name)));
    };
    if db.driver == Drivers::SQLite {
        log::warn!(
            "table `{}` is missing foreign key `{}` but SQLite can't add constraints to an existing table; recreate the table to pick it up",
            table,
            name,
        );
        return Ok(());
    }
    let sql = format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
        db.driver.quote_ident(table),
        db.driver.quote_ident(name),
        db.driver.quote_ident(&fk.local_column),
        db.driver.quote_ident(&fk.referenced_table),
        db.driver.quote_ident(&fk.referenced_column),
        fk.on_update.as_sql(),
        fk.on_delete.as_sql(),
    );
    sqlx::query(&sql).execute(&db.pool).await.map_err(Error::from)?;
    Ok(())
}

fn drop_foreign_key_sql(driver: Drivers, table_ident: &str, constraint_ident: &str) -> String {
    match driver {
        Drivers::MySQL => format!("ALTER TABLE {} DROP FOREIGN KEY {}", table_ident, constraint_ident),
        Drivers::Postgres | Drivers::SQLite => format!("ALTER TABLE {} DROP CONSTRAINT {}", table_ident, constraint_ident),
    }
}

async fn drop_foreign_key(db: &Database, table: &str, name: &str) -> Result<(), Error> {
    if db.driver == Drivers::SQLite {
        log::warn!("table `{}` has a stale foreign key `{}` but SQLite can't drop constraints in place", table, name);
        return Ok(());
    }
    let sql = drop_foreign_key_sql(db.driver, &db.driver.quote_ident(table), &db.driver.quote_ident(name));
    sqlx::query(&sql).execute(&db.pool).await.map_err(Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fk_blocked_error_recognizes_known_codes() {
        // `sqlx::Error::Database` wraps a trait object we can't construct
        // directly in a unit test without a live driver error, and SQLite
        // (the only backend exercised by this crate's own test suite) never
        // takes the dance path at all — it has no reverse-FK catalog query
        // and no in-place `ADD`/`DROP CONSTRAINT`. This test only pins the
        // non-database branch; the dance itself wants a live Postgres/MySQL
        // instance to exercise end-to-end.
        let io_err = sqlx::Error::PoolClosed;
        assert!(!is_fk_blocked_error(&io_err));
    }
}
