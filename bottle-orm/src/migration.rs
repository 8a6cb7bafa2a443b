//! # Migration Module
//!
//! This module provides schema migration management functionality for Bottle ORM.
//! It handles the registration and execution of database schema changes, including
//! table creation and foreign key constraint assignment.
//!
//! ## Overview
//!
//! The migration system follows a two-phase approach:
//!
//! 1. **Table Creation Phase**: Creates all registered tables with their columns,
//!    indexes, and constraints (except foreign keys)
//! 2. **Foreign Key Phase**: Assigns foreign key constraints after all tables exist
//!
//! This ensures that foreign keys can reference tables that haven't been created yet.
//!
//! ## Features
//!
//! - **Automatic Ordering**: Handles dependencies between tables automatically
//! - **Idempotent Operations**: Safe to run multiple times (uses IF NOT EXISTS)
//! - **Type Safety**: Leverages Rust's type system for compile-time validation
//! - **Async Execution**: Non-blocking migration execution
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use bottle_orm::{Database, Model};
//! use uuid::Uuid;
//!
//! #[derive(Model)]
//! struct User {
//!     #[orm(primary_key)]
//!     id: Uuid,
//!     username: String,
//! }
//!
//! #[derive(Model)]
//! struct Post {
//!     #[orm(primary_key)]
//!     id: Uuid,
//!     #[orm(foreign_key = "User::id")]
//!     user_id: Uuid,
//!     title: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/mydb").await?;
//!
//!     // Register and run migrations
//!     db.migrator()
//!         .register::<User>()
//!         .register::<Post>()
//!         .run()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use futures::future::BoxFuture;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{alteration::AlterationPlan, database::Database, error::Error, model::Model, synchronizer};

// ============================================================================
// Type Aliases
// ============================================================================

/// Type alias for migration tasks (e.g., Create Table, Add Foreign Key).
///
/// Migration tasks are async closures that take a `Database` instance and return
/// a boxed future that resolves to a Result. This allows for flexible, composable
/// migration operations.
///
/// # Type Definition
///
/// ```rust,ignore
/// type MigrationTask = Box<
///     dyn Fn(Database) -> BoxFuture<'static, Result<(), sqlx::Error>> + Send + Sync
/// >;
/// ```
///
/// # Parameters
///
/// * `Database` - Cloned database instance for the migration operation
/// * `bool` - whether destructive sync (dropping columns the model no
///   longer declares) is permitted for this run
///
/// # Returns
///
/// * `BoxFuture<'static, Result<AlterationPlan, Error>>` - the plan that
///   was analyzed and applied for this model on this pass. `Migrator::run`
///   calls every task twice (see its docs), so the returned plan reflects
///   whichever pass is currently executing, not the migration as a whole.
///
/// # Traits
///
/// * `Send` - Can be safely sent between threads
/// * `Sync` - Can be safely shared between threads
///
/// # Example
///
/// ```rust,ignore
/// let task: MigrationTask = Box::new(|db: Database, destructive: bool| {
///     Box::pin(async move { synchronizer::sync_table::<User>(&db, destructive).await })
/// });
/// ```
pub type MigrationTask = Box<dyn Fn(Database, bool) -> BoxFuture<'static, Result<AlterationPlan, Error>> + Send + Sync>;

// ============================================================================
// Migrator Struct
// ============================================================================

/// Schema migration manager.
///
/// The `Migrator` is responsible for managing and executing database schema migrations.
/// It holds one sync task per registered model and runs that single queue through
/// `synchronizer::sync_table` twice — once to create/shape every table, once more to
/// resolve foreign keys once every table exists. See `run`'s docs for the two-phase
/// rationale.
///
/// # Fields
///
/// * `db` - Reference to the database connection
/// * `tasks` - Queue of per-model sync tasks, in registration order
/// * `destructive` - Whether this run is allowed to drop undeclared columns
///
/// # Lifecycle
///
/// 1. Create migrator via `Database::migrator()`
/// 2. Register models via `register::<T>()`
/// 3. Execute all migrations via `run()`
///
/// # Example
///
/// ```rust,ignore
/// use bottle_orm::{Database, Model};
///
/// #[derive(Model)]
/// struct User {
///     #[orm(primary_key)]
///     id: i32,
///     username: String,
/// }
///
/// #[derive(Model)]
/// struct Post {
///     #[orm(primary_key)]
///     id: i32,
///     #[orm(foreign_key = "User::id")]
///     user_id: i32,
///     title: String,
/// }
///
/// let db = Database::connect("sqlite::memory:").await?;
///
/// let result = db.migrator()
///     .register::<User>()
///     .register::<Post>()
///     .run()
///     .await?;
/// ```
pub struct Migrator<'a> {
    /// Reference to the database connection.
    ///
    /// This is used to execute migration tasks and is cloned for each task
    /// to allow async execution without lifetime issues.
    pub(crate) db: &'a Database,

    /// Queue of per-model sync tasks, in registration order. `run` invokes
    /// every task twice — see `run`'s docs for why a single task queue
    /// suffices instead of a separate foreign-key phase.
    pub(crate) tasks: Vec<MigrationTask>,

    /// Whether this migrator is permitted to drop columns the model no
    /// longer declares (§4.9 Safety rule). Off by default; set via
    /// [`Migrator::destructive`].
    pub(crate) destructive: bool,
}

// ============================================================================
// Migrator Implementation
// ============================================================================

impl<'a> Migrator<'a> {
    // ========================================================================
    // Constructor
    // ========================================================================

    /// Creates a new Migrator instance associated with a Database.
    ///
    /// This constructor initializes empty task queues for table creation
    /// and foreign key assignment. Typically called via `Database::migrator()`
    /// rather than directly.
    ///
    /// # Arguments
    ///
    /// * `db` - Reference to the database connection
    ///
    /// # Returns
    ///
    /// A new `Migrator` instance with empty task queues
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// // Usually called via database method
    /// let migrator = db.migrator();
    ///
    /// // Direct construction (rarely needed)
    /// let migrator = Migrator::new(&db);
    /// ```
    pub fn new(db: &'a Database) -> Self {
        Self { db, tasks: Vec::new(), destructive: false }
    }

    /// Permits this migrator to drop live columns the model no longer
    /// declares. Off by default — a `DropColumn` is the only destructive
    /// step `sync_table` ever plans, and only when this flag is set (§4.9
    /// Safety rule, §10.3 Configuration).
    pub fn destructive(mut self, allow: bool) -> Self {
        self.destructive = allow;
        self
    }

    // ========================================================================
    // Model Registration
    // ========================================================================

    /// Registers a Model for migration.
    ///
    /// This method queues one sync task for the specified model, backed by
    /// `synchronizer::sync_table::<T>`. `run` walks the full task queue
    /// twice: the first pass creates the table and syncs its columns/
    /// indexes, the second resolves its foreign keys once every registered
    /// table exists.
    ///
    /// Multiple models can be registered by chaining calls to this method.
    /// The tasks will be executed in the order they were registered.
    ///
    /// # Type Parameters
    ///
    /// * `T` - The Model type to register. Must implement `Model + Send + Sync + 'static`
    ///
    /// # Returns
    ///
    /// Returns `self` to enable method chaining
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use bottle_orm::{Database, Model};
    /// use uuid::Uuid;
    ///
    /// #[derive(Model)]
    /// struct User {
    ///     #[orm(primary_key)]
    ///     id: Uuid,
    ///     username: String,
    /// }
    ///
    /// #[derive(Model)]
    /// struct Post {
    ///     #[orm(primary_key)]
    ///     id: Uuid,
    ///     #[orm(foreign_key = "User::id")]
    ///     user_id: Uuid,
    ///     title: String,
    /// }
    ///
    /// #[derive(Model)]
    /// struct Comment {
    ///     #[orm(primary_key)]
    ///     id: Uuid,
    ///     #[orm(foreign_key = "Post::id")]
    ///     post_id: Uuid,
    ///     #[orm(foreign_key = "User::id")]
    ///     user_id: Uuid,
    ///     content: String,
    /// }
    ///
    /// // Register multiple models
    /// db.migrator()
    ///     .register::<User>()      // Creates 'user' table first
    ///     .register::<Post>()      // Creates 'post' table
    ///     .register::<Comment>()   // Creates 'comment' table
    ///     .run()                   // Executes all migrations
    ///     .await?;
    /// ```
    ///
    /// # Task Execution Order
    ///
    /// 1. User table created
    /// 2. Post table created (its `user_id` FK unresolved — User exists, but
    ///    this is still phase 1)
    /// 3. Comment table created (both FKs unresolved)
    /// 4. Phase 2 begins: User re-synced (no-op), Post re-synced (adds the
    ///    `user_id` FK), Comment re-synced (adds both FKs)
    ///
    /// # See Also
    ///
    /// * [`run()`](#method.run) - For executing registered migrations
    /// * [`crate::synchronizer::sync_table()`] - The analyzer→diff→apply
    ///   pipeline each registered model runs through
    pub fn register<T>(mut self) -> Self
    where
        T: Model + 'static + Send + Sync,
    {
        let task: MigrationTask = Box::new(|db: Database, destructive: bool| {
            Box::pin(async move { synchronizer::sync_table::<T>(&db, destructive).await })
        });

        self.tasks.push(task);
        self
    }

    // ========================================================================
    // Migration Execution
    // ========================================================================

    /// Executes all registered migration tasks.
    ///
    /// This method runs every registered model's `synchronizer::sync_table`
    /// pass twice:
    ///
    /// **Phase 1** — each model's table is created (or its columns/indexes
    /// brought up to date) in registration order. A model whose foreign
    /// key references a table registered later sees that FK as unresolved
    /// on this pass — `sync_table` only computes column/index steps for a
    /// table it just created, not the foreign keys (the referenced table
    /// may not exist yet).
    ///
    /// **Phase 2** — every model is synced again. By now every table from
    /// phase 1 exists, so each model's FK diff (missing or changed foreign
    /// keys) resolves against a live schema that actually has its
    /// dependents, including performing the FK reconstruction dance where
    /// a `ModifyColumn` from phase 1 left a blocked constraint behind.
    ///
    /// If any task fails, the entire migration is aborted and an error is returned.
    ///
    /// # Returns
    ///
    /// * `Ok(Database)` - Cloned database instance on success
    /// * `Err(Error)` - Schema or execution error during migration
    ///
    /// # Error Handling
    ///
    /// Errors can occur for various reasons:
    ///
    /// - **Connection Errors**: Database connection lost during migration
    /// - **Syntax Errors**: Invalid SQL generated (shouldn't happen with correct Model definitions)
    /// - **Permission Errors**: Insufficient database privileges
    /// - **Constraint Violations**: Existing data violates new constraints
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use bottle_orm::{Database, Model};
    ///
    /// #[derive(Model)]
    /// struct User {
    ///     #[orm(primary_key)]
    ///     id: i32,
    ///     username: String,
    /// }
    ///
    /// let db = Database::connect("sqlite::memory:").await?;
    ///
    /// // Run migrations
    /// match db.migrator().register::<User>().run().await {
    ///     Ok(db) => println!("Migrations completed successfully"),
    ///     Err(e) => eprintln!("Migration failed: {}", e),
    /// }
    /// ```
    ///
    /// # Idempotency
    ///
    /// Migrations are designed to be idempotent and can be run multiple times safely:
    ///
    /// ```rust,ignore
    /// // First run: creates tables
    /// db.migrator().register::<User>().run().await?;
    ///
    /// // Second run: no-op (tables already exist)
    /// db.migrator().register::<User>().run().await?;
    /// ```
    ///
    /// # Performance Considerations
    ///
    /// - Migrations are executed sequentially, not in parallel
    /// - Large schemas may take time to migrate
    /// - Consider running migrations during deployment/startup
    /// - Use database transactions where supported
    ///
    /// # See Also
    ///
    /// * [`register()`](#method.register) - For registering models
    /// * [`crate::synchronizer::sync_table()`] - The per-model pass this
    ///   method runs twice
    pub async fn run(self) -> Result<Database, Error> {
        // Phase 1: create/sync every table's own shape.
        for task in &self.tasks {
            (task)(self.db.clone(), self.destructive).await?;
        }

        // Phase 2: resolve foreign keys now that every table exists.
        for task in &self.tasks {
            (task)(self.db.clone(), self.destructive).await?;
        }

        Ok(self.db.clone())
    }
}
