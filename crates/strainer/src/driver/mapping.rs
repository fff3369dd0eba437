//! Translation of populated filters into predicates and joins.

use std::collections::HashMap;

use sea_query::{Alias, Expr, SimpleExpr};

use super::model::{Column, JoinType, Model, ModelRegistry};
use super::operators::{self, Operand};
use crate::error::DriverError;
use crate::filter::{FieldKind, FilterData};
use crate::value::FieldValue;

/// Hands out join aliases for one translation.
///
/// Aliases are `<table>_<n>` with `n` counting from 1 per table, so two paths
/// to the same table never share a handle and repeated translations of the
/// same filter produce the same text.
#[derive(Debug, Default)]
pub struct AliasAllocator {
    counters: HashMap<String, usize>,
}

impl AliasAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, table: &str) -> String {
        let counter = self.counters.entry(table.to_string()).or_insert(0);
        *counter += 1;
        format!("{table}_{counter}")
    }
}

/// A join produced for a populated nested filter.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    /// Joined table.
    pub table: String,
    /// Alias the table is joined under.
    pub alias: String,
    pub join_type: JoinType,
    /// Key pairs of the relationship AND the nested filter's predicates.
    pub on_condition: SimpleExpr,
}

/// A model together with the name its columns are qualified with.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Source<'m> {
    pub model: &'m Model,
    pub qualifier: &'m str,
}

impl<'m> Source<'m> {
    pub fn table(model: &'m Model) -> Self {
        Self {
            model,
            qualifier: &model.table,
        }
    }

    pub fn column(&self, name: &str) -> SimpleExpr {
        Expr::col((Alias::new(self.qualifier), Alias::new(name))).into()
    }

    fn operand(&self, column: &Column) -> Operand {
        let expr = self.column(&column.name);
        if column.array {
            Operand::AnyElement(expr)
        } else {
            Operand::Column(expr)
        }
    }

    fn lookup(&self, data: &FilterData, field: &str, column: &str) -> Result<&'m Column, DriverError> {
        self.model
            .get_column(column)
            .ok_or_else(|| DriverError::AttributeNotFound {
                filter: data.schema().name().to_string(),
                field: field.to_string(),
                model: self.model.table.clone(),
                column: column.to_string(),
            })
    }
}

fn shape_error(data: &FilterData, field: &str) -> DriverError {
    DriverError::ValueShape {
        filter: data.schema().name().to_string(),
        field: field.to_string(),
    }
}

/// One top-level clause per set filter field and per set search field.
///
/// Nested filters contribute nothing here; see [`join_targets`].
pub(crate) fn column_clauses(
    data: &FilterData,
    source: Source<'_>,
) -> Result<Vec<SimpleExpr>, DriverError> {
    let schema = data.schema();
    let mut clauses = Vec::new();

    for name in schema.fields().keys() {
        let Some(value) = data.get(name) else {
            continue;
        };

        match schema.kind_of(name) {
            Some(FieldKind::Filter) => {
                let info = &schema.filter_fields()[name.as_str()];
                let column = source.lookup(data, name, &info.target)?;
                let clause = operators::filter_clause(
                    info.filter_type,
                    &source.operand(column),
                    info.is_sequence,
                    value,
                )
                .ok_or_else(|| shape_error(data, name))?;
                clauses.push(clause);
            }
            Some(FieldKind::Search) => {
                let info = &schema.search_fields()[name.as_str()];
                let mut targets = Vec::with_capacity(info.targets().len());
                for target in info.targets() {
                    let column = source.lookup(data, name, target)?;
                    let clause = operators::search_clause(
                        info.search_type,
                        &source.column(&column.name),
                        info.is_sequence,
                        value,
                    )
                    .ok_or_else(|| shape_error(data, name))?;
                    targets.push(clause);
                }
                clauses.push(operators::any_of(targets));
            }
            Some(FieldKind::Nested) | None => {}
        }
    }

    tracing::trace!(
        filter = %schema.name(),
        model = %source.model.table,
        clauses = clauses.len(),
        "built column clauses"
    );
    Ok(clauses)
}

/// Joins for every populated nested filter, parents before children.
/// Deeper on-clauses are qualified by the parent join's alias, not the bare related table.
pub(crate) fn join_targets(
    registry: &ModelRegistry,
    data: &FilterData,
    source: Source<'_>,
    aliases: &mut AliasAllocator,
) -> Result<Vec<JoinSpec>, DriverError> {
    let mut joins = Vec::new();
    collect_joins(registry, data, source, aliases, &mut joins)?;
    Ok(joins)
}

fn collect_joins(
    registry: &ModelRegistry,
    data: &FilterData,
    source: Source<'_>,
    aliases: &mut AliasAllocator,
    joins: &mut Vec<JoinSpec>,
) -> Result<(), DriverError> {
    let schema = data.schema();

    for name in schema.nested_filters().keys() {
        let nested = match data.get(name) {
            None => continue,
            Some(FieldValue::Nested(nested)) if nested.is_empty() => continue,
            Some(FieldValue::Nested(nested)) => nested,
            Some(_) => return Err(shape_error(data, name)),
        };

        let relationship = source.model.get_relationship(name).ok_or_else(|| {
            DriverError::RelationshipNotFound {
                filter: schema.name().to_string(),
                field: name.to_string(),
                model: source.model.table.clone(),
            }
        })?;
        let target = registry.model(&relationship.target)?;
        let alias = aliases.next(&target.table);
        tracing::debug!(
            filter = %schema.name(),
            relationship = %relationship.name,
            alias = %alias,
            "allocated join alias"
        );

        let joined = Source {
            model: target,
            qualifier: &alias,
        };
        let mut conditions: Vec<SimpleExpr> = relationship
            .pairs
            .iter()
            .map(|pair| {
                Expr::col((Alias::new(&alias), Alias::new(&pair.remote)))
                    .equals((Alias::new(source.qualifier), Alias::new(&pair.local)))
            })
            .collect();
        conditions.extend(column_clauses(nested, joined)?);

        joins.push(JoinSpec {
            table: target.table.clone(),
            alias: alias.to_string(),
            join_type: relationship.join_type,
            on_condition: operators::all_of(conditions),
        });
        collect_joins(registry, nested, joined, aliases, joins)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use sea_query::{Asterisk, PostgresQueryBuilder, Query};

    use super::*;
    use crate::filter::{FilterSchema, ScalarKind, SearchMarker, TypeAnnotation};

    fn int() -> TypeAnnotation {
        TypeAnnotation::Scalar(ScalarKind::Int)
    }

    fn registry() -> ModelRegistry {
        ModelRegistry::new()
            .with(
                Model::new("a")
                    .primary_key("id")
                    .column("name")
                    .column("b_id")
                    .relationship("b", "b", [("b_id", "id")]),
            )
            .with(
                Model::new("b")
                    .primary_key("id")
                    .column("c_id")
                    .relationship("c", "c", [("c_id", "id")]),
            )
            .with(Model::new("c").primary_key("id").column("x"))
    }

    fn schemas() -> Arc<FilterSchema> {
        let c = FilterSchema::builder("C").field("x", int()).build().unwrap();
        let b = FilterSchema::builder("B")
            .field("id", int())
            .field("c", TypeAnnotation::Filter(c))
            .build()
            .unwrap();
        FilterSchema::builder("A")
            .field("id", int())
            .search_field(
                "q",
                TypeAnnotation::Scalar(ScalarKind::Str),
                SearchMarker::new(["name", "id"]),
            )
            .field("b", TypeAnnotation::Filter(b))
            .build()
            .unwrap()
    }

    fn where_sql(clauses: Vec<SimpleExpr>) -> String {
        let mut query = Query::select();
        query.column(Asterisk).from(Alias::new("a"));
        for clause in clauses {
            query.and_where(clause);
        }
        let sql = query.to_string(PostgresQueryBuilder);
        sql.split_once(" WHERE ").unwrap().1.to_string()
    }

    #[test]
    fn aliases_count_per_table() {
        let mut aliases = AliasAllocator::new();
        assert_eq!(aliases.next("b"), "b_1");
        assert_eq!(aliases.next("c"), "c_1");
        assert_eq!(aliases.next("b"), "b_2");
    }

    #[test]
    fn search_targets_are_combined() {
        let registry = registry();
        let schema = schemas();
        let data = FilterData::new(&schema)
            .with("id", 1_i64)
            .unwrap()
            .with("q", "a")
            .unwrap();
        let clauses = column_clauses(&data, Source::table(registry.model("a").unwrap())).unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(where_sql(vec![clauses[0].clone()]), r#""a"."id" = 1"#);
        assert_eq!(
            where_sql(vec![clauses[1].clone()]),
            r#"("a"."name" ILIKE '%a%') OR ("a"."id" ILIKE '%a%')"#
        );
    }

    #[test]
    fn nested_joins_recurse_through_aliases() {
        let registry = registry();
        let schema = schemas();
        let b_schema = &schema.nested_filters()["b"];
        let c_schema = &b_schema.nested_filters()["c"];
        let c = FilterData::new(c_schema).with("x", 3_i64).unwrap();
        let b = FilterData::new(b_schema)
            .with("id", 2_i64)
            .unwrap()
            .with("c", c)
            .unwrap();
        let data = FilterData::new(&schema).with("b", b).unwrap();

        let mut aliases = AliasAllocator::new();
        let joins = join_targets(
            &registry,
            &data,
            Source::table(registry.model("a").unwrap()),
            &mut aliases,
        )
        .unwrap();

        assert_eq!(joins.len(), 2);
        assert_eq!((joins[0].table.as_str(), joins[0].alias.as_str()), ("b", "b_1"));
        assert_eq!((joins[1].table.as_str(), joins[1].alias.as_str()), ("c", "c_1"));
        assert_eq!(
            where_sql(vec![joins[0].on_condition.clone()]),
            r#""b_1"."id" = "a"."b_id" AND "b_1"."id" = 2"#
        );
        assert_eq!(
            where_sql(vec![joins[1].on_condition.clone()]),
            r#""c_1"."id" = "b_1"."c_id" AND "c_1"."x" = 3"#
        );
    }

    #[test]
    fn empty_nested_filters_are_skipped() {
        let registry = registry();
        let schema = schemas();
        let b = FilterData::new(&schema.nested_filters()["b"]);
        let data = FilterData::new(&schema).with("b", b).unwrap();
        let joins = join_targets(
            &registry,
            &data,
            Source::table(registry.model("a").unwrap()),
            &mut AliasAllocator::new(),
        )
        .unwrap();
        assert!(joins.is_empty());
    }

    #[test]
    fn missing_metadata_is_reported() {
        let registry = ModelRegistry::new().with(Model::new("a").primary_key("id"));
        let schema = schemas();
        let model = registry.model("a").unwrap();

        let data = FilterData::new(&schema).with("q", "a").unwrap();
        assert!(matches!(
            column_clauses(&data, Source::table(model)),
            Err(DriverError::AttributeNotFound { field, column, .. })
                if field == "q" && column == "name"
        ));

        let b = FilterData::new(&schema.nested_filters()["b"]).with("id", 1_i64).unwrap();
        let data = FilterData::new(&schema).with("b", b).unwrap();
        assert!(matches!(
            join_targets(&registry, &data, Source::table(model), &mut AliasAllocator::new()),
            Err(DriverError::RelationshipNotFound { field, model, .. })
                if field == "b" && model == "a"
        ));
    }
}
