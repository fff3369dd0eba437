//! Strainer test utilities.
//!
//! Fixture models and schemas shared by the integration tests, helpers that
//! render sea-query statements, and tracing setup.

use std::sync::{Arc, Once};

use sea_query::{Alias, Asterisk, PostgresQueryBuilder, Query, SelectStatement, SimpleExpr};
use strainer::driver::{JoinType, KeyPair, Relationship};
use strainer::filter::SearchMarker;
use strainer::{FilterSchema, Model, ModelRegistry, ScalarKind, TypeAnnotation};

/// Install a test-writer subscriber honouring `RUST_LOG`. Safe to call from
/// every test.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Registry of the fixture models.
///
/// - `a`: `id` (key), `name`, `b_id`, `d_id`, `tags` (array); relationships
///   `b` via `b_id` and `d` via `d_id`, both to `b`, the latter a left join
/// - `b`: `id` (key), `c_id`; relationship `c` via `c_id`
/// - `c`: `id` (key), `x`
/// - `pair`: composite key `x`, `y`
pub fn registry() -> ModelRegistry {
    ModelRegistry::new()
        .with(
            Model::new("a")
                .primary_key("id")
                .column("name")
                .column("b_id")
                .column("d_id")
                .array_column("tags")
                .relationship("b", "b", [("b_id", "id")])
                .relationship_with(Relationship {
                    name: "d".to_string(),
                    target: "b".to_string(),
                    join_type: JoinType::Left,
                    pairs: vec![KeyPair {
                        local: "d_id".to_string(),
                        remote: "id".to_string(),
                    }],
                }),
        )
        .with(
            Model::new("b")
                .primary_key("id")
                .column("c_id")
                .relationship("c", "c", [("c_id", "id")]),
        )
        .with(Model::new("c").primary_key("id").column("x"))
        .with(Model::new("pair").primary_key("x").primary_key("y"))
}

fn int() -> TypeAnnotation {
    TypeAnnotation::optional(TypeAnnotation::Scalar(ScalarKind::Int))
}

fn text() -> TypeAnnotation {
    TypeAnnotation::optional(TypeAnnotation::Scalar(ScalarKind::Str))
}

/// Filter on `c`: `x`.
pub fn c_filter() -> Arc<FilterSchema> {
    FilterSchema::builder("CFilter")
        .field("x", int())
        .build()
        .unwrap_or_else(|err| panic!("CFilter: {err}"))
}

/// Filter on `b`: `id` and the nested `c`.
pub fn b_filter() -> Arc<FilterSchema> {
    FilterSchema::builder("BFilter")
        .field("id", int())
        .field("c", TypeAnnotation::optional(TypeAnnotation::Filter(c_filter())))
        .build()
        .unwrap_or_else(|err| panic!("BFilter: {err}"))
}

/// Filter on `a`.
///
/// `id`, `id__n` (list), `name__ilike`, `name__null`, `tags` (list, on the
/// array column), the search `q` over `name` and `id`, and the nested `b` and
/// `d`, both of [`b_filter`].
pub fn a_filter() -> Arc<FilterSchema> {
    let b = b_filter();
    FilterSchema::builder("AFilter")
        .field("id", int())
        .field(
            "id__n",
            TypeAnnotation::optional(TypeAnnotation::list(TypeAnnotation::Scalar(ScalarKind::Int))),
        )
        .field("name__ilike", text())
        .field(
            "name__null",
            TypeAnnotation::optional(TypeAnnotation::Scalar(ScalarKind::Bool)),
        )
        .field(
            "tags",
            TypeAnnotation::optional(TypeAnnotation::list(TypeAnnotation::Scalar(ScalarKind::Str))),
        )
        .search_field("q", text(), SearchMarker::new(["name", "id"]))
        .field("b", TypeAnnotation::optional(TypeAnnotation::Filter(Arc::clone(&b))))
        .field("d", TypeAnnotation::optional(TypeAnnotation::Filter(b)))
        .build()
        .unwrap_or_else(|err| panic!("AFilter: {err}"))
}

/// Render a statement as Postgres SQL with inlined values.
pub fn render(query: &SelectStatement) -> String {
    query.to_string(PostgresQueryBuilder)
}

/// Render `expr` as it appears in a `WHERE` clause.
pub fn where_sql(expr: SimpleExpr) -> String {
    let sql = render(
        Query::select()
            .column(Asterisk)
            .from(Alias::new("t"))
            .and_where(expr),
    );
    match sql.split_once(" WHERE ") {
        Some((_, clause)) => clause.to_string(),
        None => sql,
    }
}

/// Assertion helpers for rendered SQL.
pub mod assert {
    /// Assert that `haystack` contains `needle`.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected SQL to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that `haystack` does not contain `needle`.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected SQL to NOT contain '{needle}'\nActual: {haystack}"
        );
    }
}
