//! Query driver.
//!
//! Translates populated filters, sort values and pagination values into
//! sea-query fragments against the models of a [`ModelRegistry`]:
//! - one top-level predicate per set filter or search field
//! - one aliased join per populated nested filter, recursively
//! - `ORDER BY` for a sort value, `LIMIT`/`OFFSET` for pagination
//! - `COUNT(DISTINCT pk)` statements for single-key models
//!
//! Every operation either returns complete fragments or an error; statements
//! passed to the `apply_*` helpers are left untouched on failure.

mod mapping;
pub mod model;
pub mod operators;

pub use mapping::{AliasAllocator, JoinSpec};
pub use model::{Column, JoinType, KeyPair, Model, ModelRegistry, Relationship};

use sea_query::{Alias, Asterisk, Expr, Order, Query, SelectStatement, SimpleExpr};

use self::mapping::Source;
use crate::error::DriverError;
use crate::filter::FilterData;
use crate::pagination::Pagination;
use crate::sort::{Sort, SortByOrder};

/// The optional parts applied by [`QueryDriver::apply`].
#[derive(Clone, Copy, Default)]
pub struct QueryParts<'a> {
    pub filter: Option<&'a FilterData>,
    pub sort: Option<&'a Sort>,
    pub pagination: Option<&'a dyn Pagination>,
}

/// Translator bound to a model registry.
#[derive(Debug, Clone, Copy)]
pub struct QueryDriver<'r> {
    registry: &'r ModelRegistry,
}

impl<'r> QueryDriver<'r> {
    pub fn new(registry: &'r ModelRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r ModelRegistry {
        self.registry
    }

    /// Top-level predicates of `filter` against `model`.
    pub fn predicates(&self, filter: &FilterData, model: &str) -> Result<Vec<SimpleExpr>, DriverError> {
        let model = self.registry.model(model)?;
        mapping::column_clauses(filter, Source::table(model))
    }

    /// Joins for the populated nested filters of `filter`, with freshly
    /// allocated aliases. Deeper on-clauses are qualified by the parent join's
    /// alias rather than the unaliased related table.
    pub fn join_targets(&self, filter: &FilterData, model: &str) -> Result<Vec<JoinSpec>, DriverError> {
        let model = self.registry.model(model)?;
        mapping::join_targets(
            self.registry,
            filter,
            Source::table(model),
            &mut AliasAllocator::new(),
        )
    }

    /// Ordering for `sort`, or `None` when no sort column is set.
    pub fn order(&self, sort: &Sort, model: &str) -> Result<Option<(SimpleExpr, Order)>, DriverError> {
        let Some(sort_by) = sort.sort_by.as_deref() else {
            return Ok(None);
        };
        let model = self.registry.model(model)?;
        if model.get_column(sort_by).is_none() {
            return Err(DriverError::AttributeNotFound {
                filter: "Sort".to_string(),
                field: "sort_by".to_string(),
                model: model.table.clone(),
                column: sort_by.to_string(),
            });
        }
        let order = match sort.sort_by_order {
            SortByOrder::Asc => Order::Asc,
            SortByOrder::Desc => Order::Desc,
        };
        Ok(Some((Source::table(model).column(sort_by), order)))
    }

    /// `(limit, offset)` of a pagination value.
    pub fn pagination<P: Pagination + ?Sized>(&self, pagination: &P) -> (u64, u64) {
        pagination.limit_offset()
    }

    /// `SELECT "t".* FROM "t"`.
    pub fn select(&self, model: &str) -> Result<SelectStatement, DriverError> {
        let model = self.registry.model(model)?;
        let mut query = Query::select();
        query
            .column((Alias::new(&model.table), Asterisk))
            .from(Alias::new(&model.table));
        Ok(query)
    }

    /// Add the joins and predicates of `filter` to `query`.
    pub fn apply_filter(
        &self,
        query: &mut SelectStatement,
        filter: &FilterData,
        model: &str,
    ) -> Result<(), DriverError> {
        let joins = self.join_targets(filter, model)?;
        let predicates = self.predicates(filter, model)?;
        add_joins(query, joins);
        for predicate in predicates {
            query.and_where(predicate);
        }
        Ok(())
    }

    pub fn apply_sort(
        &self,
        query: &mut SelectStatement,
        sort: &Sort,
        model: &str,
    ) -> Result<(), DriverError> {
        if let Some((expr, order)) = self.order(sort, model)? {
            query.order_by_expr(expr, order);
        }
        Ok(())
    }

    pub fn apply_pagination<P: Pagination + ?Sized>(&self, query: &mut SelectStatement, pagination: &P) {
        let (limit, offset) = self.pagination(pagination);
        query.limit(limit).offset(offset);
    }

    /// Apply every part that is present, or none of them on error.
    pub fn apply(
        &self,
        query: &mut SelectStatement,
        model: &str,
        parts: QueryParts<'_>,
    ) -> Result<(), DriverError> {
        let (joins, predicates) = match parts.filter {
            Some(filter) => (
                self.join_targets(filter, model)?,
                self.predicates(filter, model)?,
            ),
            None => (Vec::new(), Vec::new()),
        };
        let order = match parts.sort {
            Some(sort) => self.order(sort, model)?,
            None => None,
        };

        add_joins(query, joins);
        for predicate in predicates {
            query.and_where(predicate);
        }
        if let Some((expr, order)) = order {
            query.order_by_expr(expr, order);
        }
        if let Some(pagination) = parts.pagination {
            self.apply_pagination(query, pagination);
        }
        Ok(())
    }

    /// `SELECT COUNT(DISTINCT "t"."pk") AS "count" FROM "t"` with the joins
    /// and predicates of `filter`.
    pub fn count_statement(&self, model: &str, filter: &FilterData) -> Result<SelectStatement, DriverError> {
        let entity = self.registry.model(model)?;
        let keys = entity.primary_keys();
        let [pk] = keys.as_slice() else {
            return Err(DriverError::CompositePrimaryKey {
                model: entity.table.clone(),
                keys: keys.len(),
            });
        };

        let joins = self.join_targets(filter, model)?;
        let predicates = self.predicates(filter, model)?;

        let mut query = Query::select();
        query
            .expr_as(
                Expr::cust_with_exprs(
                    "COUNT(DISTINCT $1)",
                    [Source::table(entity).column(&pk.name)],
                ),
                Alias::new("count"),
            )
            .from(Alias::new(&entity.table));
        add_joins(&mut query, joins);
        for predicate in predicates {
            query.and_where(predicate);
        }
        Ok(query)
    }
}

fn add_joins(query: &mut SelectStatement, joins: Vec<JoinSpec>) {
    for join in joins {
        query.join_as(
            join.join_type.into(),
            Alias::new(join.table),
            Alias::new(join.alias),
            join.on_condition,
        );
    }
}
