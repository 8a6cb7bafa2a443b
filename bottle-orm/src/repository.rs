//! # Repository Module
//!
//! A higher-level facade over [`QueryBuilder`] for the common "one struct,
//! one table" case. Where `db.model::<T>()` hands back a single-use builder
//! that must be reconstructed for every call, `Repository<T>` holds onto a
//! [`Database`] handle (cheap to clone — it wraps a pooled `AnyPool`) and
//! exposes the CRUD operations an application layer actually calls by name:
//! `insert`, `get_by_id`, `list`, `page`, `count`, `update`, `delete_by_id`,
//! `increment`/`decrement`, and `find` for ad hoc filtering.
//!
//! Built for `Database`, not `Transaction` — multi-statement atomicity is
//! already served directly by `Transaction::model`, and a repository that
//! tried to wrap a borrowed, non-`Clone` transaction would need a different
//! shape for every method. Use `db.begin()` directly when a call needs to
//! span more than one write.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{any::AnyRow, Any, Encode, Type};

use crate::{
    any_struct::{AnyImpl, FromAnyRow},
    catalog,
    database::{Database, Drivers},
    dialect::Dialect,
    error::Error,
    model::Model,
    pagination::{Paginated, Pagination},
    query_builder::QueryBuilder,
    row_mapper,
};

/// The outcome of one `Repository` write operation.
///
/// `value` carries whatever the operation naturally produces (`()` for a
/// plain insert, the updated row count for a bulk update); `rows_affected`
/// is always populated so callers don't need to match on `value` just to
/// check whether anything happened.
#[derive(Debug, Clone)]
pub struct OperationResult<T> {
    pub value: T,
    pub rows_affected: u64,
}

impl<T> OperationResult<T> {
    fn new(value: T, rows_affected: u64) -> Self {
        Self { value, rows_affected }
    }
}

/// An optional read-through cache a [`Repository`] can be given via
/// [`Repository::with_cache`].
///
/// `async_trait` rather than a GAT-based trait (as `Connection` uses):
/// cache backends are naturally held as `Box<dyn RepositoryCache<T>>`, and a
/// GAT-returning trait can't be made into a trait object.
#[async_trait]
pub trait RepositoryCache<T>: Send + Sync {
    async fn get(&self, key: &str) -> Option<T>;
    async fn put(&self, key: &str, value: T);
    async fn invalidate(&self, key: &str);
}

/// A CRUD facade over a single model's table.
pub struct Repository<T> {
    db: Database,
    cache: Option<Box<dyn RepositoryCache<T>>>,
    _marker: PhantomData<T>,
}

impl<T> Repository<T>
where
    T: Model + Send + Sync + Unpin + Clone + 'static,
{
    /// Builds a repository backed by `db`. Cheap — `Database` only clones a pool handle.
    pub fn new(db: Database) -> Self {
        Self { db, cache: None, _marker: PhantomData }
    }

    /// Attaches a read-through cache consulted by `get_by_id` and invalidated by writes.
    pub fn with_cache(mut self, cache: Box<dyn RepositoryCache<T>>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn query(&self) -> QueryBuilder<'_, T, Database> {
        self.db.model::<T>()
    }

    fn primary_key_column() -> &'static str {
        catalog::table_spec::<T>().primary_key.first().map(String::as_str).unwrap_or("id")
    }

    /// Inserts one row.
    pub async fn insert(&self, model: &T) -> Result<OperationResult<()>, Error> {
        self.query().insert(model).await?;
        if let Some(cache) = &self.cache {
            cache.invalidate("*").await;
        }
        Ok(OperationResult::new((), 1))
    }

    /// Inserts each row in `models`, in order, stopping at the first failure.
    pub async fn insert_many(&self, models: &[T]) -> Result<OperationResult<()>, Error> {
        let mut count = 0u64;
        for model in models {
            self.query().insert(model).await?;
            count += 1;
        }
        if count > 0 {
            if let Some(cache) = &self.cache {
                cache.invalidate("*").await;
            }
        }
        Ok(OperationResult::new((), count))
    }

    /// Fetches the row whose primary key equals `id`, consulting the cache first.
    pub async fn get_by_id<V>(&self, id: V) -> Result<Option<T>, Error>
    where
        T: for<'r> sqlx::FromRow<'r, AnyRow>,
        V: 'static + for<'q> Encode<'q, Any> + Type<Any> + Send + Sync + Clone + ToString,
    {
        let cache_key = id.to_string();
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&cache_key).await {
                return Ok(Some(hit));
            }
        }

        let result = self.query().filter(Self::primary_key_column(), "=", id).first::<T>().await;
        let found = match result {
            Ok(row) => Some(row),
            Err(sqlx::Error::RowNotFound) => None,
            Err(other) => return Err(Error::from(other)),
        };

        if let (Some(cache), Some(row)) = (&self.cache, &found) {
            cache.put(&cache_key, row.clone()).await;
        }

        Ok(found)
    }

    /// Fetches every row where `column` equals `value`.
    pub async fn get_by_column<V>(&self, column: &'static str, value: V) -> Result<Vec<T>, Error>
    where
        T: for<'r> sqlx::FromRow<'r, AnyRow>,
        V: 'static + for<'q> Encode<'q, Any> + Type<Any> + Send + Sync + Clone,
    {
        Ok(self.query().filter(column, "=", value).scan::<T>().await?)
    }

    /// Fetches every row in the table.
    pub async fn list(&self) -> Result<Vec<T>, Error>
    where
        T: for<'r> sqlx::FromRow<'r, AnyRow>,
    {
        Ok(self.query().scan::<T>().await?)
    }

    /// Applies an arbitrary filter chain via `build`, then fetches all matching rows.
    ///
    /// The escape hatch for queries `get_by_column`/`list` don't cover —
    /// `build` receives a fresh builder and returns the filtered one.
    pub async fn find<R, F>(&self, build: F) -> Result<Vec<R>, Error>
    where
        R: FromAnyRow + AnyImpl + Send + Unpin,
        F: FnOnce(QueryBuilder<'_, T, Database>) -> QueryBuilder<'_, T, Database>,
    {
        Ok(build(self.query()).scan::<R>().await?)
    }

    /// Fetches one page of rows alongside pagination metadata.
    pub async fn page<R>(&self, pagination: Pagination) -> Result<Paginated<R>, Error>
    where
        R: FromAnyRow + AnyImpl + Send + Unpin,
    {
        Ok(pagination.paginate::<T, Database, R>(self.query()).await?)
    }

    /// Counts every row in the table.
    pub async fn count(&self) -> Result<i64, Error> {
        Ok(self.query().count().await?)
    }

    /// Overwrites every active column of the row matching `model`'s primary key.
    pub async fn update(&self, model: &T) -> Result<OperationResult<()>, Error> {
        let pk = Self::primary_key_column();
        let pk_value = model
            .to_map()
            .get(pk)
            .cloned()
            .ok_or_else(|| Error::invalid_argument("model is missing its primary key column"))?;

        let affected = self.query().filter(pk, "=", pk_value).updates(model).await?;
        if affected > 0 {
            if let Some(cache) = &self.cache {
                cache.invalidate("*").await;
            }
        }
        Ok(OperationResult::new((), affected))
    }

    /// Deletes the row whose primary key equals `id`.
    pub async fn delete_by_id<V>(&self, id: V) -> Result<OperationResult<()>, Error>
    where
        V: 'static + for<'q> Encode<'q, Any> + Type<Any> + Send + Sync + Clone + ToString,
    {
        let cache_key = id.to_string();
        let affected = self.query().filter(Self::primary_key_column(), "=", id).delete().await?;
        if affected > 0 {
            if let Some(cache) = &self.cache {
                cache.invalidate(&cache_key).await;
            }
        }
        Ok(OperationResult::new((), affected))
    }

    /// Atomically adds `by` to `column` on the row matching the primary key `id`.
    /// Negative `by` decrements. Issued as raw SQL (`col = col + ?`) since
    /// `QueryBuilder::update` only assigns literal values, not expressions.
    pub async fn increment<V>(&self, column: &str, id: V, by: i64) -> Result<OperationResult<()>, Error>
    where
        V: 'static + for<'q> Encode<'q, Any> + Type<Any> + Send + Sync,
    {
        let driver = self.db_driver();
        let table = {
            use heck::ToSnakeCase;
            T::table_name().to_snake_case()
        };
        let quoted_col = driver.quote_ident(column);
        let quoted_table = driver.quote_ident(&table);
        let quoted_pk = driver.quote_ident(Self::primary_key_column());

        let sql = format!(
            "UPDATE {} SET {} = {} + {} WHERE {} = {}",
            quoted_table,
            quoted_col,
            quoted_col,
            driver.placeholder(1),
            quoted_pk,
            driver.placeholder(2),
        );

        let affected = self.db.raw(&sql).bind(by).bind(id).execute().await?;
        if affected > 0 {
            if let Some(cache) = &self.cache {
                cache.invalidate("*").await;
            }
        }
        Ok(OperationResult::new((), affected))
    }

    /// Subtracts `by` from `column` on the row matching the primary key
    /// `id`. When `prevent_negative` is set (§4.8 default), the column is
    /// floored at zero via `GREATEST(col - by, 0)` (or the SQLite
    /// equivalent `MAX`) rather than going negative — a current value of 0
    /// stays at 0 (§8 boundary behavior) instead of going to `-by`.
    pub async fn decrement<V>(&self, column: &str, id: V, by: i64, prevent_negative: bool) -> Result<OperationResult<()>, Error>
    where
        V: 'static + for<'q> Encode<'q, Any> + Type<Any> + Send + Sync,
    {
        if !prevent_negative {
            return self.increment(column, id, -by).await;
        }

        let driver = self.db_driver();
        let table = {
            use heck::ToSnakeCase;
            T::table_name().to_snake_case()
        };
        let quoted_col = driver.quote_ident(column);
        let quoted_table = driver.quote_ident(&table);
        let quoted_pk = driver.quote_ident(Self::primary_key_column());
        let floored = driver.greatest_expr(&format!("{} - {}", quoted_col, driver.placeholder(1)), "0");

        let sql = format!(
            "UPDATE {} SET {} = {} WHERE {} = {}",
            quoted_table,
            quoted_col,
            floored,
            quoted_pk,
            driver.placeholder(2),
        );

        let affected = self.db.raw(&sql).bind(by).bind(id).execute().await?;
        if affected > 0 {
            if let Some(cache) = &self.cache {
                cache.invalidate("*").await;
            }
        }
        Ok(OperationResult::new((), affected))
    }

    fn db_driver(&self) -> Drivers {
        self.db.driver
    }
}

/// Eager-loads a one-to-many navigation onto `owners` via a batched
/// `WHERE <fk_column> IN (...)` query against the child model `C`, grouped
/// client-side by `child_key` and attached via `attach` — the same
/// two-query, N+1-safe shape [`row_mapper::attach_children`] implements and
/// tests in isolation.
///
/// [`crate::query_builder::QueryBuilder::include`]/`fetch_include` is the
/// single-`LEFT JOIN` eager load described in §4.6/§4.7 and should be
/// preferred when the navigation collection lives directly on a
/// `#[derive(Model)]` struct's field. This helper exists for the case that
/// isn't: `owners` is generic rather than constrained to a `Model` because
/// the navigation collection being attached (e.g. `Vec<Comment>` on a
/// `Post`-shaped view) is not itself a database column and so cannot live
/// on a `#[derive(Model)]` struct — callers build a plain struct pairing
/// the fetched rows with their navigation fields and attach into that. A
/// `Post -> Comments` navigation (`comments.post_id`) is
/// `repository::load_children::<_, Comment, _, _, _, _>(&db, posts, "post_id", |p| p.id, |c| c.post_id, |p, cs| p.comments = cs)`.
///
/// Returns `owners` unchanged (no query issued) when empty.
pub async fn load_children<O, C, K, FOwnerKey, FChildKey, Attach>(
    db: &Database,
    owners: Vec<O>,
    fk_column: &'static str,
    owner_key: FOwnerKey,
    child_key: FChildKey,
    attach: Attach,
) -> Result<Vec<O>, Error>
where
    C: Model + Send + Sync + Unpin + Clone + 'static + for<'r> sqlx::FromRow<'r, AnyRow>,
    K: Eq + std::hash::Hash + Clone + 'static + for<'q> Encode<'q, Any> + Type<Any> + Send + Sync,
    FOwnerKey: Fn(&O) -> K,
    FChildKey: Fn(&C) -> K,
    Attach: FnMut(&mut O, Vec<C>),
{
    if owners.is_empty() {
        return Ok(owners);
    }

    let keys: Vec<K> = owners.iter().map(&owner_key).collect();
    let children: Vec<C> = db.model::<C>().where_in(fk_column, keys)?.scan::<C>().await?;
    Ok(row_mapper::attach_children(owners, children, owner_key, child_key, attach))
}

/// Eager-loads a many-to-one navigation onto `owners` — the inverse of
/// [`load_children`]: one batched `WHERE <parent_pk_column> IN (...)` query
/// against the parent model `P`, matched by `fk_key` (read off each owner)
/// against `parent_key` (read off each fetched parent) and attached via
/// `attach`. An `Order -> User` navigation (`orders.user_id -> users.id`)
/// is `repository::load_parent::<_, User, _, _, _, _>(&db, orders, "id", |o| o.user_id, |u| u.id, |o, u| o.user_name = u.name)`.
pub async fn load_parent<O, P, K, FOwnerFk, FParentKey, Attach>(
    db: &Database,
    owners: Vec<O>,
    parent_pk_column: &'static str,
    fk_key: FOwnerFk,
    parent_key: FParentKey,
    mut attach: Attach,
) -> Result<Vec<O>, Error>
where
    P: Model + Send + Sync + Unpin + Clone + 'static + for<'r> sqlx::FromRow<'r, AnyRow>,
    K: Eq + std::hash::Hash + Clone + 'static + for<'q> Encode<'q, Any> + Type<Any> + Send + Sync,
    FOwnerFk: Fn(&O) -> K,
    FParentKey: Fn(&P) -> K,
    Attach: FnMut(&mut O, P),
{
    if owners.is_empty() {
        return Ok(owners);
    }

    let keys: Vec<K> = owners.iter().map(&fk_key).collect();
    let parents: Vec<P> = db.model::<P>().where_in(parent_pk_column, keys)?.scan::<P>().await?;
    let mut by_key = std::collections::HashMap::new();
    for parent in parents {
        by_key.insert(parent_key(&parent), parent);
    }

    let mut owners = owners;
    for owner in &mut owners {
        if let Some(parent) = by_key.remove(&fk_key(owner)) {
            attach(owner, parent);
        }
    }
    Ok(owners)
}
