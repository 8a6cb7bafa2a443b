//! # Row Mapper Module
//!
//! Collapses the single result set a `QueryBuilder::include` eager load
//! produces back into a nested owner/owned struct graph.
//!
//! `QueryBuilder::include` selects both the base table and the included
//! child table with `"{table}"."{col}" AS "{table}__{col}"` aliases and
//! joins them with one `LEFT JOIN`, so every row carries one base entity's
//! columns plus (at most) one child row's columns, repeated once per
//! matching child. [`collapse_eager_load`] groups those rows back up keyed
//! by the base table's primary key, in the order rows arrived, per §4.7.
//!
//! This module also keeps the older, independent batched ("N+1 safe")
//! loading helpers (`group_by`/`attach_children`) used by
//! [`crate::repository::load_children`]/[`crate::repository::load_parent`]
//! for the case where the navigation collection lives on a plain struct
//! that isn't itself a `#[derive(Model)]` type and so has no `TableSpec`
//! for `include` to resolve a join against.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use sqlx::any::AnyRow;
use sqlx::{FromRow, Row, ValueRef};

use crate::error::Error;
use crate::model::Model;

/// Groups `items` by the key `key_fn` extracts, preserving the relative
/// order of items within each group.
pub fn group_by<K, V, F>(items: Vec<V>, key_fn: F) -> HashMap<K, Vec<V>>
where
    K: Eq + Hash,
    F: Fn(&V) -> K,
{
    let mut groups: HashMap<K, Vec<V>> = HashMap::new();
    for item in items {
        let key = key_fn(&item);
        groups.entry(key).or_default().push(item);
    }
    groups
}

/// Attaches each owner's children in place, consuming both vectors.
///
/// `owner_key`/`child_key` extract the join key from each side; `attach` is
/// called once per owner with its (possibly empty) group of children, in
/// the order children appeared in `children`. Owners with no matching
/// children receive an empty `Vec`.
pub fn attach_children<O, C, K, FOwner, FChild, Attach>(
    owners: Vec<O>,
    children: Vec<C>,
    owner_key: FOwner,
    child_key: FChild,
    mut attach: Attach,
) -> Vec<O>
where
    K: Eq + Hash + Clone,
    FOwner: Fn(&O) -> K,
    FChild: Fn(&C) -> K,
    Attach: FnMut(&mut O, Vec<C>),
{
    let mut groups = group_by(children, child_key);
    let mut owners = owners;

    for owner in &mut owners {
        let key = owner_key(owner);
        let bucket = groups.remove(&key).unwrap_or_default();
        attach(owner, bucket);
    }

    owners
}

/// Collapses one `LEFT JOIN`-aliased result set into `(base, children)`
/// pairs, keyed by the base table's primary key.
///
/// `rows` came back from a single `QueryBuilder::include` query: every row
/// carries `"{base_table}__*"` columns for the base entity and, when a
/// matching child row exists, `"{child_table}__*"` columns for it — all
/// NULL otherwise. Rows are visited in order; the first time a base
/// primary key is seen it's materialized and appended to the output, and
/// every row after that contributes at most one more (deduplicated) child
/// to the same base entity, preserving the row order within the group.
///
/// `base_pk_field`/`child_pk_field` are the model's raw field name (as
/// `Model::to_map()` keys them, e.g. `"id"`), not the cleaned SQL column
/// name — identity is compared on `Model::to_map()`'s string values so the
/// primary key's concrete Rust type never has to be decoded out of the row
/// for the grouping step itself.
pub fn collapse_eager_load<T, C>(
    rows: &[AnyRow],
    child_table: &str,
    child_pk_column: &str,
    base_pk_field: &str,
    child_pk_field: &str,
) -> Result<Vec<(T, Vec<C>)>, Error>
where
    T: Model + for<'r> FromRow<'r, AnyRow>,
    C: Model + for<'r> FromRow<'r, AnyRow>,
{
    let mut order: Vec<String> = Vec::new();
    let mut bases: HashMap<String, (T, Vec<C>)> = HashMap::new();
    let mut seen_children: HashMap<String, HashSet<String>> = HashMap::new();

    let child_pk_alias = format!("{}__{}", child_table, child_pk_column);

    for row in rows {
        let base = T::from_row(row).map_err(Error::from_fetch)?;
        let base_key = base.to_map().get(base_pk_field).cloned().unwrap_or_default();

        if !bases.contains_key(&base_key) {
            order.push(base_key.clone());
            bases.insert(base_key.clone(), (base, Vec::new()));
        }

        let child_present = row.try_get_raw(child_pk_alias.as_str()).map(|v| !v.is_null()).unwrap_or(false);

        if child_present {
            let child = C::from_row(row).map_err(Error::from_fetch)?;
            let child_key = child.to_map().get(child_pk_field).cloned().unwrap_or_default();

            if seen_children.entry(base_key.clone()).or_default().insert(child_key) {
                bases.get_mut(&base_key).expect("base just inserted").1.push(child);
            }
        }
    }

    Ok(order.into_iter().map(|key| bases.remove(&key).expect("key recorded in order")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Author {
        id: i32,
        name: String,
        books: Vec<Book>,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Book {
        id: i32,
        author_id: i32,
        title: String,
    }

    #[test]
    fn group_by_buckets_items_by_extracted_key() {
        let books = vec![
            Book { id: 1, author_id: 10, title: "A".into() },
            Book { id: 2, author_id: 20, title: "B".into() },
            Book { id: 3, author_id: 10, title: "C".into() },
        ];

        let groups = group_by(books, |b| b.author_id);
        assert_eq!(groups.get(&10).map(Vec::len), Some(2));
        assert_eq!(groups.get(&20).map(Vec::len), Some(1));
        assert_eq!(groups.get(&30), None);
    }

    #[test]
    fn attach_children_fills_in_matching_and_empty_groups() {
        let authors = vec![
            Author { id: 10, name: "Ada".into(), books: Vec::new() },
            Author { id: 20, name: "Grace".into(), books: Vec::new() },
        ];
        let books = vec![
            Book { id: 1, author_id: 10, title: "A".into() },
            Book { id: 2, author_id: 10, title: "C".into() },
        ];

        let attached = attach_children(
            authors,
            books,
            |a: &Author| a.id,
            |b: &Book| b.author_id,
            |author, books| author.books = books,
        );

        assert_eq!(attached[0].books.len(), 2);
        assert!(attached[1].books.is_empty());
    }
}
