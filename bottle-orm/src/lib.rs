//! # Bottle ORM
//!
//! **Bottle ORM** is a lightweight, async ORM for Rust built on top of [sqlx](https://github.com/launchbadge/sqlx).
//! It is designed to be simple, efficient, and easy to use, providing a fluent Query Builder
//! and automatic schema migrations.
//!
//! ## Features
//!
//! - **Async & Non-blocking**: Built on `tokio` and `sqlx`
//! - **Multi-Driver Support**: Compatible with PostgreSQL, MySQL, and SQLite (via `sqlx::Any`)
//! - **Macro-based Models**: Define your schema using standard Rust structs with `#[derive(Model)]`
//! - **Fluent Query Builder**: Chainable methods for filtering, selecting, pagination, and sorting
//! - **Auto-Migration**: Automatically creates tables and foreign key constraints based on your structs
//! - **UUID Support**: Full support for UUID versions 1 through 7
//!
//! ## Quick Start Example
//!
//! ```rust,ignore
//! use bottle_orm::{Database, Model};
//! use serde::{Deserialize, Serialize};
//! use sqlx::FromRow;
//!
//! #[derive(Model, Debug, Clone, Serialize, Deserialize, FromRow)]
//! struct User {
//!     #[orm(primary_key)]
//!     id: i32,
//!     #[orm(size = 50, unique)]
//!     username: String,
//!     age: i32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite::memory:").await?;
//!
//!     db.migrator()
//!         .register::<User>()
//!         .run()
//!         .await?;
//!
//!     let users: Vec<User> = db.model::<User>()
//!         .filter("age", ">=", 18)
//!         .scan()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

// ============================================================================
// Macro Re-exports
// ============================================================================

/// Re-export of the procedural macro for deriving the `Model` trait.
///
/// This macro is defined in the `bottle-orm-macro` crate and allows automatic
/// implementation of the `Model` trait for structs representing database tables.
pub use bottle_orm_macro::Model;

/// Re-export of the procedural macro for deriving the `FromAnyRow` trait on
/// ad hoc projection structs (query results that don't map to a full table).
pub use bottle_orm_macro::FromAnyRow;

// ============================================================================
// Module Declarations
// ============================================================================

/// Database connection and driver management.
///
/// Contains the `Database` struct for connection pooling and driver detection,
/// as well as the `Drivers` enum for identifying the database backend.
pub mod database;

/// Core Model trait and column metadata structures.
///
/// Defines the `Model` trait that must be implemented by all ORM entities,
/// and the `ColumnInfo` struct containing metadata about table columns.
pub mod model;

/// Fluent query builder for constructing SQL queries.
///
/// Provides the `QueryBuilder` struct with chainable methods for building
/// SELECT, INSERT, and filtered queries with type-safe parameter binding.
pub mod query_builder;

/// Dynamic row mapping for types without a full `Model` implementation.
///
/// Defines `AnyImpl`/`AnyInfo` for column reflection and `FromAnyRow` for
/// constructing a value directly from a borrowed `sqlx::any::AnyRow`.
pub mod any_struct;

/// Typed predicate construction used alongside the string-operator
/// `QueryBuilder::filter` entry point.
///
/// Defines `Op`, `OrGroup`, and the internal `compile_*` functions that
/// `QueryBuilder`'s `where_*` methods call into.
pub mod predicate;

/// Per-backend SQL dialect primitives (quoting, placeholders, DDL clauses,
/// schema-introspection queries) shared by the query builder and the schema
/// synchronizer.
pub mod dialect;

/// Model-to-table resolution and process-lifetime caching.
///
/// Defines `TableSpec`, `IndexSpec`, and `ForeignKeySpec`, the normalized
/// view of a `Model`'s table that schema synchronization diffs against.
pub mod catalog;

/// Cursor-free offset pagination.
///
/// Defines `Pagination` and `Paginated<T>`, plus the `QueryBuilder`
/// extension that runs the count/page query pair.
pub mod pagination;

/// Explicit multi-statement transactions.
///
/// Defines `Transaction`, a `Connection` implementation scoped to a single
/// `sqlx::Transaction`, carrying its own commit/rollback state machine.
pub mod transaction;

/// Repository facade over a single model.
///
/// Defines `Repository<T>`, the `OperationResult<T>` envelope, and the
/// optional `RepositoryCache` trait for read-through caching.
pub mod repository;

/// Eager-load row grouping.
///
/// Joins rows returned by a multi-table query back into nested owning/owned
/// structures keyed by primary key.
pub mod row_mapper;

/// Live-schema introspection.
///
/// Queries the connected database for its current columns, indexes, and
/// foreign keys per table, using the dialect's introspection queries.
pub mod analyzer;

/// Schema diffing.
///
/// Compares a `TableSpec` against a live `analyzer::LiveTable` and produces
/// an ordered `AlterationPlan` of steps to reconcile them.
pub mod alteration;

/// Schema synchronization execution.
///
/// Executes an `AlterationPlan`: creates missing tables, adds/alters
/// columns and indexes, and performs the foreign-key reconstruction dance
/// for backends that can't add a constraint in place.
pub mod synchronizer;

/// Schema migration management.
///
/// Contains the `Migrator` struct for registering models and executing
/// automatic table creation and foreign key assignment. Delegates to
/// `synchronizer` for the actual DDL execution.
pub mod migration;

/// Error types and handling.
///
/// Defines the `Error` enum with variants for different error scenarios
/// that can occur during ORM operations.
pub mod error;

/// Temporal type conversion and handling.
///
/// Provides specialized conversion functions for chrono types (DateTime, NaiveDateTime, etc.)
/// across different database drivers, optimizing for native database type support.
pub mod temporal;

/// Value binding utilities for SQL queries.
///
/// Provides type-safe value binding with automatic type detection and conversion,
/// supporting all SQL types across different database drivers.
pub mod value_binding;

// ============================================================================
// Public API Re-exports
// ============================================================================

/// Re-export of the `Database` struct for connection management.
///
/// This is the main entry point for establishing database connections
/// and creating query builders or migrators.
pub use database::{ConnectionConfig, Database, DatabaseBuilder};

/// Re-export of the `Model` trait and `ColumnInfo` struct.
///
/// The `Model` trait defines the interface for ORM entities, while
/// `ColumnInfo` contains metadata about individual table columns.
pub use model::{ColumnInfo, ForeignKeyAction, Model};

/// Re-export of the `QueryBuilder` for constructing and executing queries.
///
/// `QueryBuilder` provides a fluent interface for building SELECT and INSERT
/// queries with filtering, ordering, and pagination capabilities.
pub use query_builder::QueryBuilder;

/// Re-export of the `Migrator` for schema migration management.
///
/// `Migrator` handles the registration of models and execution of
/// migration tasks to create tables and establish relationships.
pub use migration::Migrator;

/// Re-export of the `Error` type for error handling.
///
/// This is the main error type used throughout Bottle ORM, wrapping
/// various error scenarios including database errors and validation errors.
pub use error::Error;

/// Re-export of the dynamic row-mapping traits.
pub use any_struct::{AnyImpl, AnyInfo, FromAnyRow};

/// Re-export of the typed predicate builder types.
pub use predicate::{Op, OrGroup};

/// Re-export of the per-backend dialect trait.
pub use dialect::Dialect;

/// Re-export of pagination types.
pub use pagination::{Paginated, Pagination};

/// Re-export of the explicit-transaction type.
pub use transaction::Transaction;

/// Re-export of the repository facade, its result envelope, and the
/// batched N+1-safe navigation helpers for non-`Model` view structs. See
/// [`query_builder::QueryBuilder::include`] for the single-`LEFT JOIN`
/// eager load described in §4.6 "include".
pub use repository::{load_children, load_parent, OperationResult, Repository, RepositoryCache};

/// Re-export of the schema-diffing types a caller can inspect without
/// running a full `Migrator` pass.
pub use alteration::{AlterationPlan, AlterationStep};

/// Re-export of the live-schema introspection entry point.
pub use analyzer::{inspect_table, LiveTable};

/// Re-export of the synchronizer's own entry point, for callers that want
/// to sync one model without going through `Migrator::register`/`run`.
pub use synchronizer::sync_table;
