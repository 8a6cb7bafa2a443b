//! # Predicate Module
//!
//! Realizes the "lambda AST" the distilled specification describes without
//! relying on expression-tree reflection: a typed [`Op`] enum plus a small
//! builder API operating on the field-name constants the `#[derive(Model)]`
//! macro emits (see the `{struct}_fields` modules). `.filter(col, "=", value)`
//! stays the teacher's original string-operator entry point; `Op` gives
//! callers who want compile-time-checked operators (and the operations the
//! string form can't express cleanly — `IN`, `BETWEEN`, `IS NULL`) a typed
//! surface over the same underlying `FilterFn` machinery `query_builder`
//! already executes.

use sqlx::{
    Any, Encode, Type,
    any::AnyArguments,
};

use crate::{database::Drivers, dialect::Dialect, error::Error, query_builder::FilterFn};

/// A comparison or membership operator recognized by the predicate builder.
///
/// Mirrors the binary-comparison, string-predicate, and membership shapes
/// the specification's PredicateCompiler recognizes; `In`/`Between`/
/// `IsNull`/`IsNotNull` are realized through their own dedicated builder
/// methods (see [`crate::query_builder::QueryBuilder::where_in`],
/// [`crate::query_builder::QueryBuilder::where_between`],
/// [`crate::query_builder::QueryBuilder::where_null`]) since they bind a
/// different number of parameters than a single-value comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    Contains,
    StartsWith,
    EndsWith,
}

impl Op {
    /// Renders the SQL operator token. `Contains`/`StartsWith`/`EndsWith`
    /// all compile to `LIKE`; the wildcard placement is applied to the
    /// bound value, not the operator, by [`Op::wrap_value`].
    fn sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Like | Op::Contains | Op::StartsWith | Op::EndsWith => "LIKE",
        }
    }

    /// Applies the operator's wildcard convention to a string value.
    /// No-op for every operator except the three string predicates.
    fn wrap_value(&self, value: String) -> String {
        match self {
            Op::Contains => format!("%{}%", value),
            Op::StartsWith => format!("{}%", value),
            Op::EndsWith => format!("%{}", value),
            _ => value,
        }
    }
}

/// Logical connector joining two conditions inside an [`OrGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

/// A builder-style OR group: a run of conditions that must be parenthesized
/// together and joined by `OR`, then AND-ed into the surrounding query.
///
/// Realizes the specification's "logical composition: AND and OR combine
/// child WhereConditions" shape — the surrounding query already AND-s every
/// top-level clause together, so only OR needs explicit grouping support.
pub struct OrGroup {
    clauses: Vec<(String, Box<dyn Fn(&mut AnyArguments<'_>) + Send + Sync>)>,
}

impl OrGroup {
    pub fn new() -> Self {
        Self { clauses: Vec::new() }
    }

    /// Adds one comparison to the group.
    pub fn or<V>(mut self, col: &'static str, op: Op, value: V) -> Self
    where
        V: 'static + for<'q> Encode<'q, Any> + Type<Any> + Send + Sync + Clone + ToString,
    {
        let rendered_value = op.wrap_value(value.to_string());
        let is_like = matches!(op, Op::Like | Op::Contains | Op::StartsWith | Op::EndsWith);
        let fragment = quote_column(col);
        let op_sql = op.sql().to_string();
        self.clauses.push((
            format!("{} {}", fragment, op_sql),
            Box::new(move |args| {
                if is_like {
                    let _ = args.add(rendered_value.clone());
                } else {
                    let _ = args.add(value.clone());
                }
            }),
        ));
        self
    }

    fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl Default for OrGroup {
    fn default() -> Self {
        Self::new()
    }
}

fn quote_column(col: &str) -> String {
    if let Some((table, column)) = col.split_once('.') {
        format!("\"{}\".\"{}\"", table, column)
    } else {
        format!("\"{}\"", col)
    }
}

/// Builds a [`FilterFn`] for a single typed comparison, used by
/// `QueryBuilder::where_op`.
pub(crate) fn compile_scalar<V>(col: &'static str, op: Op, value: V) -> FilterFn
where
    V: 'static + for<'q> Encode<'q, Any> + Type<Any> + Send + Sync + Clone + ToString,
{
    Box::new(move |query, args, driver, arg_counter| {
        query.push_str(" AND ");
        query.push_str(&quote_column(col));
        query.push(' ');
        query.push_str(op.sql());
        query.push(' ');
        query.push_str(&driver.placeholder(*arg_counter));
        if matches!(driver, Drivers::Postgres) {
            *arg_counter += 1;
        }

        let is_like = matches!(op, Op::Like | Op::Contains | Op::StartsWith | Op::EndsWith);
        if is_like {
            let _ = args.add(op.wrap_value(value.to_string()));
        } else {
            let _ = args.add(value.clone());
        }
    })
}

/// Builds a [`FilterFn`] for an `OrGroup`, parenthesizing its members.
pub(crate) fn compile_or_group(group: OrGroup) -> Result<FilterFn, Error> {
    if group.is_empty() {
        return Err(Error::compile("OR group must contain at least one condition"));
    }

    Ok(Box::new(move |query, args, driver, arg_counter| {
        query.push_str(" AND (");
        for (i, (fragment, bind)) in group.clauses.iter().enumerate() {
            if i > 0 {
                query.push_str(" OR ");
            }
            query.push_str(fragment);
            query.push(' ');
            query.push_str(&driver.placeholder(*arg_counter));
            if matches!(driver, Drivers::Postgres) {
                *arg_counter += 1;
            }
            bind(args);
        }
        query.push(')');
    }))
}

/// Builds a [`FilterFn`] for an `IN (...)` condition. Refuses an empty
/// value list (§8 boundary: "Empty IN list must refuse to compile").
pub(crate) fn compile_in<V>(col: &'static str, values: Vec<V>) -> Result<FilterFn, Error>
where
    V: 'static + for<'q> Encode<'q, Any> + Type<Any> + Send + Sync + Clone,
{
    if values.is_empty() {
        return Err(Error::compile("IN condition requires at least one value"));
    }

    Ok(Box::new(move |query, args, driver, arg_counter| {
        query.push_str(" AND ");
        query.push_str(&quote_column(col));
        query.push_str(" IN (");
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                query.push_str(", ");
            }
            query.push_str(&driver.placeholder(*arg_counter));
            if matches!(driver, Drivers::Postgres) {
                *arg_counter += 1;
            }
            let _ = args.add(value.clone());
        }
        query.push(')');
    }))
}

/// Builds a [`FilterFn`] for a `BETWEEN a AND b` condition.
pub(crate) fn compile_between<V>(col: &'static str, low: V, high: V) -> FilterFn
where
    V: 'static + for<'q> Encode<'q, Any> + Type<Any> + Send + Sync + Clone,
{
    Box::new(move |query, args, driver, arg_counter| {
        query.push_str(" AND ");
        query.push_str(&quote_column(col));
        query.push_str(" BETWEEN ");
        query.push_str(&driver.placeholder(*arg_counter));
        if matches!(driver, Drivers::Postgres) {
            *arg_counter += 1;
        }
        query.push_str(" AND ");
        query.push_str(&driver.placeholder(*arg_counter));
        if matches!(driver, Drivers::Postgres) {
            *arg_counter += 1;
        }
        let _ = args.add(low.clone());
        let _ = args.add(high.clone());
    })
}

/// Builds a [`FilterFn`] for `IS NULL` / `IS NOT NULL`.
pub(crate) fn compile_null(col: &'static str, is_null: bool) -> FilterFn {
    Box::new(move |query, _args, _driver, _arg_counter| {
        query.push_str(" AND ");
        query.push_str(&quote_column(col));
        query.push_str(if is_null { " IS NULL" } else { " IS NOT NULL" });
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_value_applies_wildcards() {
        assert_eq!(Op::Contains.wrap_value("ab".into()), "%ab%");
        assert_eq!(Op::StartsWith.wrap_value("ab".into()), "ab%");
        assert_eq!(Op::EndsWith.wrap_value("ab".into()), "%ab");
        assert_eq!(Op::Eq.wrap_value("ab".into()), "ab");
    }

    #[test]
    fn empty_in_list_refuses_to_compile() {
        let result = compile_in::<i32>("age", vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn empty_or_group_refuses_to_compile() {
        let result = compile_or_group(OrGroup::new());
        assert!(result.is_err());
    }

    #[test]
    fn or_group_renders_parenthesized_disjunction() {
        let group = OrGroup::new().or("age", Op::Gt, 18i32).or("age", Op::Lt, 5i32);
        let filter = compile_or_group(group).expect("non-empty group compiles");

        let mut query = String::new();
        let mut args = AnyArguments::default();
        let mut counter = 1usize;
        filter(&mut query, &mut args, &Drivers::SQLite, &mut counter);

        assert_eq!(query, " AND (\"age\" > ? OR \"age\" < ?)");
    }
}
