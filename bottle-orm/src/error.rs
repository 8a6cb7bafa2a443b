//! # Error Handling Module
//!
//! This module defines the error types used throughout Bottle ORM.
//! It provides a centralized error handling system that wraps every failure
//! scenario that can occur during connection, schema, or query operations
//! into a single `thiserror`-derived enum.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use bottle_orm::Error;
//!
//! async fn create_user(db: &Database, age: i32) -> Result<User, Error> {
//!     if age < 0 {
//!         return Err(Error::invalid_data("Age cannot be negative"));
//!     }
//!
//!     let user = User { age, /* ... */ };
//!     db.model::<User>().insert(&user).await?;
//!     Ok(user)
//! }
//! ```

use thiserror::Error as ThisError;

/// The main error type for Bottle ORM operations.
///
/// One variant per failure kind the core distinguishes: configuration, pool
/// open failures, illegal lifecycle transitions, predicate/projection
/// compilation, driver execution errors, schema synchronization failures,
/// row-mapping failures, cancellation, and not-found. `InvalidData` and
/// `InvalidArgument` are kept as call-site ergonomics layered over
/// `Config`/`Compile` respectively, matching how callers already used them.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid configuration: unknown connection id, invalid pool sizes
    /// (min > max), missing required host/database/username.
    #[error("configuration error: {0}")]
    Config(String),

    /// The driver could not open a connection.
    #[error("failed to open connection: {0}")]
    OpenFailure(String),

    /// An operation was invoked in an illegal lifecycle state (commit after
    /// commit, use after dispose, repository operation on a model with no
    /// primary key).
    #[error("illegal state: {0}")]
    State(String),

    /// The predicate compiler or a projection lambda surrogate encountered
    /// an unsupported shape (e.g. an empty IN list, an ambiguous include
    /// junction).
    #[error("failed to compile query: {0}")]
    Compile(String),

    /// The driver reported a SQL error during execution. Wraps the
    /// underlying `sqlx::Error` unchanged.
    #[error("execution error: {0}")]
    Execution(#[from] sqlx::Error),

    /// Schema introspection or synchronization failed.
    #[error("schema error: {0}")]
    Schema(String),

    /// The row mapper could not convert a driver value into the target
    /// property type.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// The caller's cancellation signaled before the operation completed.
    #[error("operation cancelled")]
    Cancelled,

    /// A get-by-id/column style lookup found no matching row. Kept distinct
    /// from `Execution` so callers can match on it without inspecting the
    /// wrapped driver error.
    #[error("not found")]
    NotFound,

    /// Data validation failure (business-rule violation, not a DB-level
    /// constraint). Call-site ergonomic layered over `Config`.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Invalid argument passed to an ORM method (programmer error, not a
    /// runtime data issue). Call-site ergonomic layered over `Compile`.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Type conversion failure outside of row mapping (e.g. parsing a
    /// string column back into a temporal/UUID value during bind).
    #[error("type conversion error: {0}")]
    Conversion(String),
}

impl Error {
    /// Creates an `InvalidData` error from a string slice.
    pub fn invalid_data(msg: &str) -> Self {
        Error::InvalidData(msg.to_string())
    }

    /// Creates an `InvalidArgument` error from a string slice.
    pub fn invalid_argument(msg: &str) -> Self {
        Error::InvalidArgument(msg.to_string())
    }

    /// Creates a `Conversion` error from a string slice.
    pub fn conversion(msg: &str) -> Self {
        Error::Conversion(msg.to_string())
    }

    /// Creates a `Compile` error from a string slice.
    pub fn compile(msg: &str) -> Self {
        Error::Compile(msg.to_string())
    }

    /// Creates a `Schema` error from a string slice.
    pub fn schema(msg: &str) -> Self {
        Error::Schema(msg.to_string())
    }

    /// Creates a `State` error from a string slice.
    pub fn state(msg: &str) -> Self {
        Error::State(msg.to_string())
    }

    /// Maps a driver error into `NotFound` when it is a missed-row error,
    /// otherwise wraps it as `Execution`. Used at Repository/QueryBuilder
    /// call sites where a missing row is a distinct outcome from a real
    /// execution failure.
    pub fn from_fetch(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound,
            other => Error::Execution(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinct_from_execution() {
        let err = Error::from_fetch(sqlx::Error::RowNotFound);
        assert!(matches!(err, Error::NotFound));
    }

    #[test]
    fn other_driver_errors_wrap_as_execution() {
        let err = Error::from_fetch(sqlx::Error::PoolClosed);
        assert!(matches!(err, Error::Execution(_)));
    }

    #[test]
    fn convenience_constructors_build_expected_variants() {
        assert!(matches!(Error::invalid_data("x"), Error::InvalidData(_)));
        assert!(matches!(Error::invalid_argument("x"), Error::InvalidArgument(_)));
        assert!(matches!(Error::compile("x"), Error::Compile(_)));
        assert!(matches!(Error::schema("x"), Error::Schema(_)));
        assert!(matches!(Error::state("x"), Error::State(_)));
    }
}
