//! # Dialect Module
//!
//! Encapsulates every backend-specific string so the rest of the crate stays
//! textually portable across PostgreSQL, MySQL, and SQLite. `Drivers`
//! (declared in [`crate::database`]) already identifies which backend a
//! connection talks to; this module adds the `Dialect` trait on top of it so
//! schema introspection and DDL generation stop re-deriving backend behavior
//! from ad hoc matches scattered through the crate.

use crate::database::Drivers;

/// Per-backend SQL rendering and introspection primitives.
///
/// `Drivers` implements this directly rather than through one struct per
/// variant — the enum already carries the identity the trait dispatches on,
/// and every existing call site already matches on `Drivers`, so adding a
/// parallel type hierarchy would only create two ways to ask the same
/// question.
pub trait Dialect {
    /// Wraps an identifier in the backend's quoting character(s).
    fn quote_ident(&self, name: &str) -> String;

    /// Renders a (optionally schema-qualified) table reference, quoted.
    fn qualify_table(&self, schema: Option<&str>, table: &str) -> String;

    /// Renders the placeholder for the `index`-th bound parameter
    /// (1-based), in the backend's actual positional syntax.
    fn placeholder(&self, index: usize) -> String;

    /// Renders the clause used to mark a column as auto-incrementing.
    fn auto_increment_clause(&self) -> &'static str;

    /// Renders the clause used to keep a column current on every UPDATE.
    /// Only MySQL supports this natively; other backends return an empty
    /// string and expect application-level handling.
    fn on_update_timestamp_clause(&self) -> &'static str;

    /// Renders a `DEFAULT <expr>` clause, passing symbolic expressions like
    /// `CURRENT_TIMESTAMP` through unchanged.
    fn default_clause(&self, expr: &str) -> String {
        format!("DEFAULT {}", expr)
    }

    /// Query that lists live columns for a table, normalized to
    /// `(name, rendered_type, nullable, default, extra)` by the caller.
    fn columns_query(&self) -> &'static str;

    /// Query that lists live indexes for a table.
    fn indexes_query(&self) -> &'static str;

    /// Query that lists live foreign keys referencing or owned by a table.
    fn foreign_keys_query(&self) -> &'static str;

    /// Query that lists every foreign key, on any other table, that
    /// references the given table — the reverse direction of
    /// [`Dialect::foreign_keys_query`]. Drives the FK reconstruction dance:
    /// before an otherwise-blocked `ALTER TABLE` on a referenced table, the
    /// synchronizer must know every constraint that would be invalidated.
    /// SQLite has no catalog-wide reverse lookup and does not support
    /// `ADD`/`DROP CONSTRAINT` in the first place, so this is only
    /// meaningful for Postgres/MySQL; SQLite returns an empty string and
    /// the synchronizer skips the dance for that backend.
    fn referencing_foreign_keys_query(&self) -> &'static str;

    /// Describes how the backend reports the id of the last inserted row.
    fn last_insert_id_strategy(&self) -> LastInsertIdStrategy;

    /// Renders a two-argument "largest of" scalar expression — `GREATEST(a,
    /// b)` on Postgres/MySQL, `MAX(a, b)` on SQLite (SQLite's `MAX` acts as
    /// the scalar function, not the aggregate, when called with more than
    /// one argument). Used by `Repository::decrement`'s `prevent_negative`
    /// floor (§4.8, §8 "Decrement with preventNegative and a current value
    /// of 0 leaves the column at 0").
    fn greatest_expr(&self, a: &str, b: &str) -> String;
}

/// How to retrieve the primary-key value generated by an INSERT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastInsertIdStrategy {
    /// `SELECT LAST_INSERT_ID()` after the INSERT (MySQL).
    LastInsertIdFunction,
    /// `INSERT ... RETURNING *` (PostgreSQL).
    ReturningClause,
    /// `SELECT last_insert_rowid()` (SQLite).
    LastInsertRowid,
}

impl Dialect for Drivers {
    fn quote_ident(&self, name: &str) -> String {
        match self {
            Drivers::MySQL => format!("`{}`", name),
            Drivers::Postgres | Drivers::SQLite => format!("\"{}\"", name),
        }
    }

    fn qualify_table(&self, schema: Option<&str>, table: &str) -> String {
        match (self, schema) {
            (Drivers::Postgres, Some(schema)) => format!("{}.{}", self.quote_ident(schema), self.quote_ident(table)),
            _ => self.quote_ident(table),
        }
    }

    fn placeholder(&self, index: usize) -> String {
        match self {
            Drivers::Postgres => format!("${}", index),
            Drivers::MySQL | Drivers::SQLite => "?".to_string(),
        }
    }

    fn auto_increment_clause(&self) -> &'static str {
        match self {
            Drivers::Postgres => "",
            Drivers::MySQL => "AUTO_INCREMENT",
            Drivers::SQLite => "AUTOINCREMENT",
        }
    }

    fn on_update_timestamp_clause(&self) -> &'static str {
        match self {
            Drivers::MySQL => "ON UPDATE CURRENT_TIMESTAMP",
            Drivers::Postgres | Drivers::SQLite => "",
        }
    }

    fn columns_query(&self) -> &'static str {
        match self {
            Drivers::Postgres => {
                "SELECT column_name, data_type, is_nullable, column_default \
                 FROM information_schema.columns WHERE table_name = $1"
            }
            Drivers::MySQL => {
                "SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_DEFAULT \
                 FROM information_schema.COLUMNS \
                 WHERE TABLE_NAME = ? AND TABLE_SCHEMA = DATABASE()"
            }
            Drivers::SQLite => "SELECT name, type, \"notnull\", dflt_value FROM pragma_table_info(?)",
        }
    }

    fn indexes_query(&self) -> &'static str {
        match self {
            Drivers::Postgres => {
                "SELECT indexname, indexdef FROM pg_indexes WHERE tablename = $1"
            }
            Drivers::MySQL => {
                "SELECT INDEX_NAME, NON_UNIQUE, COLUMN_NAME FROM information_schema.STATISTICS \
                 WHERE TABLE_NAME = ? AND TABLE_SCHEMA = DATABASE()"
            }
            Drivers::SQLite => "SELECT name, \"unique\" FROM pragma_index_list(?)",
        }
    }

    fn foreign_keys_query(&self) -> &'static str {
        match self {
            Drivers::Postgres => {
                "SELECT tc.constraint_name, kcu.column_name, ccu.table_name, ccu.column_name, \
                        rc.update_rule, rc.delete_rule \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu ON tc.constraint_name = kcu.constraint_name \
                 JOIN information_schema.constraint_column_usage ccu ON tc.constraint_name = ccu.constraint_name \
                 JOIN information_schema.referential_constraints rc ON tc.constraint_name = rc.constraint_name \
                 WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_name = $1"
            }
            Drivers::MySQL => {
                "SELECT kcu.CONSTRAINT_NAME, kcu.COLUMN_NAME, kcu.REFERENCED_TABLE_NAME, kcu.REFERENCED_COLUMN_NAME, \
                        rc.UPDATE_RULE, rc.DELETE_RULE \
                 FROM information_schema.KEY_COLUMN_USAGE kcu \
                 JOIN information_schema.REFERENTIAL_CONSTRAINTS rc \
                   ON kcu.CONSTRAINT_NAME = rc.CONSTRAINT_NAME AND kcu.TABLE_SCHEMA = rc.CONSTRAINT_SCHEMA \
                 WHERE kcu.TABLE_NAME = ? AND kcu.TABLE_SCHEMA = DATABASE() AND kcu.REFERENCED_TABLE_NAME IS NOT NULL"
            }
            Drivers::SQLite => "SELECT id, \"from\", \"table\", \"to\", on_update, on_delete FROM pragma_foreign_key_list(?)",
        }
    }

    fn referencing_foreign_keys_query(&self) -> &'static str {
        match self {
            Drivers::Postgres => {
                "SELECT tc.constraint_name, tc.table_name, kcu.column_name, ccu.column_name, \
                        rc.update_rule, rc.delete_rule \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu ON tc.constraint_name = kcu.constraint_name \
                 JOIN information_schema.constraint_column_usage ccu ON tc.constraint_name = ccu.constraint_name \
                 JOIN information_schema.referential_constraints rc ON tc.constraint_name = rc.constraint_name \
                 WHERE tc.constraint_type = 'FOREIGN KEY' AND ccu.table_name = $1"
            }
            Drivers::MySQL => {
                "SELECT kcu.CONSTRAINT_NAME, kcu.TABLE_NAME, kcu.COLUMN_NAME, kcu.REFERENCED_COLUMN_NAME, \
                        rc.UPDATE_RULE, rc.DELETE_RULE \
                 FROM information_schema.KEY_COLUMN_USAGE kcu \
                 JOIN information_schema.REFERENTIAL_CONSTRAINTS rc \
                   ON kcu.CONSTRAINT_NAME = rc.CONSTRAINT_NAME AND kcu.TABLE_SCHEMA = rc.CONSTRAINT_SCHEMA \
                 WHERE kcu.REFERENCED_TABLE_NAME = ? AND kcu.TABLE_SCHEMA = DATABASE()"
            }
            Drivers::SQLite => "",
        }
    }

    fn last_insert_id_strategy(&self) -> LastInsertIdStrategy {
        match self {
            Drivers::Postgres => LastInsertIdStrategy::ReturningClause,
            Drivers::MySQL => LastInsertIdStrategy::LastInsertIdFunction,
            Drivers::SQLite => LastInsertIdStrategy::LastInsertRowid,
        }
    }

    fn greatest_expr(&self, a: &str, b: &str) -> String {
        match self {
            Drivers::Postgres | Drivers::MySQL => format!("GREATEST({}, {})", a, b),
            Drivers::SQLite => format!("MAX({}, {})", a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_matches_backend_convention() {
        assert_eq!(Drivers::MySQL.quote_ident("user"), "`user`");
        assert_eq!(Drivers::Postgres.quote_ident("user"), "\"user\"");
        assert_eq!(Drivers::SQLite.quote_ident("user"), "\"user\"");
    }

    #[test]
    fn placeholder_is_positional_per_backend() {
        assert_eq!(Drivers::Postgres.placeholder(3), "$3");
        assert_eq!(Drivers::MySQL.placeholder(3), "?");
        assert_eq!(Drivers::SQLite.placeholder(3), "?");
    }

    #[test]
    fn qualify_table_only_schema_qualifies_postgres() {
        assert_eq!(Drivers::Postgres.qualify_table(Some("public"), "user"), "\"public\".\"user\"");
        assert_eq!(Drivers::MySQL.qualify_table(Some("ignored"), "user"), "`user`");
    }
}
