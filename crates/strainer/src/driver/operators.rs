//! Predicate builders for filter and search operators.

use sea_query::extension::postgres::PgExpr;
use sea_query::{Alias, Expr, SimpleExpr};

use crate::filter::types::{FilterType, SearchType};
use crate::value::{FieldValue, Scalar};

/// Name bound to each element when an array column is unnested.
pub const ELEMENT: &str = "elem";

/// Left-hand side of a predicate.
#[derive(Debug, Clone)]
pub enum Operand {
    /// A plain column.
    Column(SimpleExpr),
    /// An array column; the predicate holds if any element satisfies it.
    AnyElement(SimpleExpr),
}

/// The values a predicate compares against.
#[derive(Debug, Clone, Copy)]
enum Values<'a> {
    One(&'a Scalar),
    Many(&'a [Scalar]),
}

impl<'a> Values<'a> {
    /// `None` when the value does not have the shape the field declares.
    fn of(is_sequence: bool, value: &'a FieldValue) -> Option<Self> {
        match (is_sequence, value) {
            (false, FieldValue::Single(v)) => Some(Values::One(v)),
            (true, FieldValue::Many(vs)) => Some(Values::Many(vs)),
            _ => None,
        }
    }
}

/// Build the predicate of a filter field.
///
/// Returns `None` when `value` does not match `is_sequence`.
pub fn filter_clause(
    filter_type: FilterType,
    operand: &Operand,
    is_sequence: bool,
    value: &FieldValue,
) -> Option<SimpleExpr> {
    let values = Values::of(is_sequence, value)?;
    let clause = match operand {
        Operand::Column(column) => compare(filter_type, column, values),
        // Nullness applies to the array itself, not to its elements.
        Operand::AnyElement(column) if filter_type == FilterType::Null => {
            compare(filter_type, column, values)
        }
        Operand::AnyElement(column) => {
            let element = SimpleExpr::from(Expr::col(Alias::new(ELEMENT)));
            any_element(column, compare(filter_type, &element, values))
        }
    };
    Some(clause)
}

/// Build the predicate of one search target.
///
/// Returns `None` when `value` does not match `is_sequence`.
pub fn search_clause(
    search_type: SearchType,
    column: &SimpleExpr,
    is_sequence: bool,
    value: &FieldValue,
) -> Option<SimpleExpr> {
    let values = Values::of(is_sequence, value)?;
    let filter_type = match search_type {
        SearchType::CaseSensitive => FilterType::Like,
        SearchType::CaseInsensitive => FilterType::Ilike,
    };
    Some(compare(filter_type, column, values))
}

fn compare(filter_type: FilterType, column: &SimpleExpr, values: Values<'_>) -> SimpleExpr {
    let col = || Expr::expr(column.clone());

    match (filter_type, values) {
        (FilterType::Eq, Values::One(v)) => col().eq(sql_value(v)),
        (FilterType::Eq, Values::Many([])) => false_expr(),
        (FilterType::Eq, Values::Many(vs)) => col().is_in(vs.iter().map(sql_value)),
        (FilterType::Ne, Values::One(v)) => col().ne(sql_value(v)),
        (FilterType::Ne, Values::Many([])) => true_expr(),
        (FilterType::Ne, Values::Many(vs)) => col().is_not_in(vs.iter().map(sql_value)),
        (FilterType::Null, Values::One(v)) => null_check(col(), v.is_truthy()),
        (FilterType::Null, Values::Many(vs)) => null_check(col(), vs.iter().any(Scalar::is_truthy)),
        (FilterType::Gt, _) => each(values, |v| col().gt(sql_value(v))),
        (FilterType::Ge, _) => each(values, |v| col().gte(sql_value(v))),
        (FilterType::Lt, _) => each(values, |v| col().lt(sql_value(v))),
        (FilterType::Le, _) => each(values, |v| col().lte(sql_value(v))),
        (FilterType::Like, _) => each(values, |v| col().like(pattern(v))),
        (FilterType::Ilike, _) => each(values, |v| col().ilike(pattern(v))),
    }
}

/// Apply `build` to a single value, or OR it over every element.
fn each(values: Values<'_>, build: impl Fn(&Scalar) -> SimpleExpr) -> SimpleExpr {
    match values {
        Values::One(v) => build(v),
        Values::Many(vs) => any_of(vs.iter().map(build)),
    }
}

fn null_check(column: Expr, truthy: bool) -> SimpleExpr {
    if truthy {
        column.is_null()
    } else {
        column.is_not_null()
    }
}

fn sql_value(scalar: &Scalar) -> sea_query::Value {
    sea_query::Value::from(scalar)
}

/// `%value%`, with the value used verbatim.
fn pattern(scalar: &Scalar) -> String {
    format!("%{}%", scalar.as_pattern_text())
}

fn any_element(array: &SimpleExpr, predicate: SimpleExpr) -> SimpleExpr {
    Expr::cust_with_exprs(
        format!("EXISTS (SELECT 1 FROM unnest($1) AS {ELEMENT} WHERE $2)"),
        [array.clone(), predicate],
    )
}

pub(crate) fn true_expr() -> SimpleExpr {
    Expr::cust("TRUE")
}

pub(crate) fn false_expr() -> SimpleExpr {
    Expr::cust("FALSE")
}

/// OR the expressions together; an empty list is `FALSE`.
pub fn any_of(exprs: impl IntoIterator<Item = SimpleExpr>) -> SimpleExpr {
    let mut iter = exprs.into_iter();
    let Some(first) = iter.next() else {
        return false_expr();
    };
    iter.fold(first, SimpleExpr::or)
}

/// AND the expressions together; an empty list is `TRUE`.
pub fn all_of(exprs: impl IntoIterator<Item = SimpleExpr>) -> SimpleExpr {
    let mut iter = exprs.into_iter();
    let Some(first) = iter.next() else {
        return true_expr();
    };
    iter.fold(first, SimpleExpr::and)
}
