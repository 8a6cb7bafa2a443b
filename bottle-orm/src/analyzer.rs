//! # Schema Analyzer Module
//!
//! Reads back the *live* shape of a table from the connected database using
//! each backend's introspection queries ([`crate::dialect::Dialect::columns_query`]
//! and friends), normalized into driver-independent [`LiveTable`] values that
//! [`crate::alteration`] can diff against a [`crate::catalog::TableSpec`].

use heck::ToSnakeCase;
use sqlx::Row;

use crate::{
    database::{Database, Drivers},
    dialect::Dialect,
    error::Error,
    model::ForeignKeyAction,
};

/// One column as currently defined in the database.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveColumn {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

/// One index as currently defined in the database.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveIndex {
    pub name: String,
    pub unique: bool,
}

/// One foreign key as currently defined in the database.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveForeignKey {
    pub constraint_name: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub on_update: ForeignKeyAction,
    pub on_delete: ForeignKeyAction,
}

/// One foreign key, declared on some other table, that references the
/// table being inspected. Used by the synchronizer's FK reconstruction
/// dance, which must drop and recreate constraints it doesn't own.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveReferencingForeignKey {
    pub constraint_name: String,
    pub owning_table: String,
    pub column: String,
    pub referenced_column: String,
    pub on_update: ForeignKeyAction,
    pub on_delete: ForeignKeyAction,
}

/// The live, as-deployed shape of one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveTable {
    pub exists: bool,
    pub columns: Vec<LiveColumn>,
    pub indexes: Vec<LiveIndex>,
    pub foreign_keys: Vec<LiveForeignKey>,
}

/// Reads the live shape of `table_name` from `db`.
///
/// Returns a `LiveTable` with `exists: false` and empty collections if the
/// table does not exist yet — the synchronizer treats that as "create it"
/// rather than an error.
pub async fn inspect_table(db: &Database, table_name: &str) -> Result<LiveTable, Error> {
    let driver = db.driver;
    let table_snake = table_name.to_snake_case();

    let columns = fetch_columns(db, driver, &table_snake).await?;
    if columns.is_empty() {
        return Ok(LiveTable::default());
    }

    let indexes = fetch_indexes(db, driver, &table_snake).await?;
    let foreign_keys = fetch_foreign_keys(db, driver, &table_snake).await?;

    Ok(LiveTable { exists: true, columns, indexes, foreign_keys })
}

async fn fetch_columns(db: &Database, driver: Drivers, table: &str) -> Result<Vec<LiveColumn>, Error> {
    let rows = sqlx::query(driver.columns_query()).bind(table).fetch_all(&db.pool).await.map_err(Error::from)?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get(0).map_err(Error::from)?;
        let sql_type: String = row.try_get(1).map_err(Error::from)?;
        let default: Option<String> = row.try_get(3).map_err(Error::from)?;

        let nullable = match driver {
            // information_schema reports nullability as the text "YES"/"NO".
            Drivers::Postgres | Drivers::MySQL => {
                let flag: String = row.try_get(2).map_err(Error::from)?;
                flag.eq_ignore_ascii_case("YES")
            }
            // pragma_table_info reports the inverse: "notnull" = 1 means NOT NULL.
            Drivers::SQLite => {
                let notnull: i64 = row.try_get(2).map_err(Error::from)?;
                notnull == 0
            }
        };

        columns.push(LiveColumn { name, sql_type, nullable, default });
    }

    Ok(columns)
}

async fn fetch_indexes(db: &Database, driver: Drivers, table: &str) -> Result<Vec<LiveIndex>, Error> {
    let rows = sqlx::query(driver.indexes_query()).bind(table).fetch_all(&db.pool).await.map_err(Error::from)?;

    let mut indexes = Vec::new();
    match driver {
        Drivers::Postgres => {
            for row in rows {
                let name: String = row.try_get(0).map_err(Error::from)?;
                let def: String = row.try_get(1).map_err(Error::from)?;
                indexes.push(LiveIndex { unique: def.to_uppercase().contains("UNIQUE"), name });
            }
        }
        Drivers::MySQL => {
            // One row per indexed column; collapse to one entry per index name.
            for row in rows {
                let name: String = row.try_get(0).map_err(Error::from)?;
                let non_unique: i64 = row.try_get(1).map_err(Error::from)?;
                if !indexes.iter().any(|i: &LiveIndex| i.name == name) {
                    indexes.push(LiveIndex { name, unique: non_unique == 0 });
                }
            }
        }
        Drivers::SQLite => {
            for row in rows {
                let name: String = row.try_get(0).map_err(Error::from)?;
                let unique: i64 = row.try_get(1).map_err(Error::from)?;
                indexes.push(LiveIndex { name, unique: unique != 0 });
            }
        }
    }

    Ok(indexes)
}

async fn fetch_foreign_keys(db: &Database, driver: Drivers, table: &str) -> Result<Vec<LiveForeignKey>, Error> {
    let rows = sqlx::query(driver.foreign_keys_query()).bind(table).fetch_all(&db.pool).await.map_err(Error::from)?;

    let mut foreign_keys = Vec::with_capacity(rows.len());
    for row in rows.iter() {
        match driver {
            Drivers::Postgres | Drivers::MySQL => {
                let constraint_name: String = row.try_get(0).map_err(Error::from)?;
                let column: String = row.try_get(1).map_err(Error::from)?;
                let referenced_table: String = row.try_get(2).map_err(Error::from)?;
                let referenced_column: String = row.try_get(3).map_err(Error::from)?;
                let update_rule: String = row.try_get(4).map_err(Error::from)?;
                let delete_rule: String = row.try_get(5).map_err(Error::from)?;
                foreign_keys.push(LiveForeignKey {
                    constraint_name,
                    column,
                    referenced_table,
                    referenced_column,
                    on_update: ForeignKeyAction::from_sql(&update_rule),
                    on_delete: ForeignKeyAction::from_sql(&delete_rule),
                });
            }
            Drivers::SQLite => {
                // pragma_foreign_key_list has no constraint name; synthesize one from its row id.
                let id: i64 = row.try_get(0).map_err(Error::from)?;
                let column: String = row.try_get(1).map_err(Error::from)?;
                let referenced_table: String = row.try_get(2).map_err(Error::from)?;
                let referenced_column: String = row.try_get(3).map_err(Error::from)?;
                let on_update: Option<String> = row.try_get(4).map_err(Error::from)?;
                let on_delete: Option<String> = row.try_get(5).map_err(Error::from)?;
                foreign_keys.push(LiveForeignKey {
                    constraint_name: format!("fk_{}_{}", table, id),
                    column,
                    referenced_table,
                    referenced_column,
                    on_update: on_update.map(|s| ForeignKeyAction::from_sql(&s)).unwrap_or_default(),
                    on_delete: on_delete.map(|s| ForeignKeyAction::from_sql(&s)).unwrap_or_default(),
                });
            }
        }
    }

    Ok(foreign_keys)
}

/// Reads every foreign key, on any other table, that references
/// `table_name` — the input the FK reconstruction dance needs before it can
/// drop and recreate constraints blocking an `ALTER TABLE` on the
/// referenced side. Returns an empty list for SQLite, which has no
/// catalog-wide reverse lookup and doesn't support `ADD`/`DROP CONSTRAINT`
/// to begin with.
pub async fn referencing_foreign_keys(db: &Database, table_name: &str) -> Result<Vec<LiveReferencingForeignKey>, Error> {
    let driver = db.driver;
    let query = driver.referencing_foreign_keys_query();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let table_snake = table_name.to_snake_case();
    let rows = sqlx::query(query).bind(&table_snake).fetch_all(&db.pool).await.map_err(Error::from)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        let constraint_name: String = row.try_get(0).map_err(Error::from)?;
        let owning_table: String = row.try_get(1).map_err(Error::from)?;
        let column: String = row.try_get(2).map_err(Error::from)?;
        let referenced_column: String = row.try_get(3).map_err(Error::from)?;
        let update_rule: String = row.try_get(4).map_err(Error::from)?;
        let delete_rule: String = row.try_get(5).map_err(Error::from)?;
        out.push(LiveReferencingForeignKey {
            constraint_name,
            owning_table,
            column,
            referenced_column,
            on_update: ForeignKeyAction::from_sql(&update_rule),
            on_delete: ForeignKeyAction::from_sql(&delete_rule),
        });
    }

    Ok(out)
}
