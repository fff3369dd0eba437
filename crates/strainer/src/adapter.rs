//! Binding of flat request parameters to filter schemas.
//!
//! A schema with nested filters is exposed as a flat list of leaf parameters
//! whose names carry the path to the owning schema, e.g. `b__d__e` for the
//! attribute `e` of the nested filter `d` of the nested filter `b`.
//! [`squash_filter`] lists the leaves, [`inflate_filter`] routes supplied
//! values back into a populated [`FilterData`], and [`FilterQuery`] does both
//! for a URL query string.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::InputError;
use crate::filter::{Constraints, DefaultPolicy, FilterData, FilterSchema, TypeAnnotation};
use crate::pagination::{DEFAULT_LIMIT, OffsetPagination, PagePagination};
use crate::sort::{Sort, SortByOrder};
use crate::value::FieldValue;

/// `prefix<delimiter>item`, or `item` when there is no prefix.
pub fn add_prefix(item: &str, prefix: &str, delimiter: &str) -> String {
    if prefix.is_empty() {
        return item.to_string();
    }
    format!("{prefix}{delimiter}{item}")
}

/// Strip `prefix<delimiter>` from `item` if present.
pub fn remove_prefix<'a>(item: &'a str, prefix: &str, delimiter: &str) -> &'a str {
    if prefix.is_empty() {
        return item;
    }
    item.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(delimiter))
        .unwrap_or(item)
}

/// One leaf parameter of a squashed schema.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParam {
    /// Full parameter name, including the path prefix.
    pub name: String,
    pub annotation: TypeAnnotation,
    pub is_sequence: bool,
    pub default: DefaultPolicy,
    pub constraints: Constraints,
}

/// Leaf parameters of `schema`: filter fields, then search fields, then the
/// leaves of every nested filter under its prefixed name.
pub fn squash_filter(
    schema: &FilterSchema,
    prefix: &str,
    delimiter: &str,
) -> IndexMap<String, QueryParam> {
    let mut squashed = IndexMap::new();

    let leaves = schema
        .filter_fields()
        .keys()
        .chain(schema.search_fields().keys());
    for key in leaves {
        let Some(spec) = schema.field(key) else {
            continue;
        };
        let name = add_prefix(key, prefix, delimiter);
        squashed.insert(
            name.clone(),
            QueryParam {
                name,
                annotation: spec.annotation.clone(),
                is_sequence: schema.is_sequence(key),
                default: spec.default.clone(),
                constraints: spec.constraints.clone(),
            },
        );
    }

    for (key, nested) in schema.nested_filters() {
        squashed.extend(squash_filter(
            nested,
            &add_prefix(key, prefix, delimiter),
            delimiter,
        ));
    }

    squashed
}

/// Build a populated filter from flat, prefixed parameters.
///
/// `None` values are skipped, keys that name no leaf are ignored, and a
/// nested filter none of whose leaves were supplied is left unset.
pub fn inflate_filter(
    schema: &Arc<FilterSchema>,
    prefix: &str,
    delimiter: &str,
    data: &IndexMap<String, Option<FieldValue>>,
) -> Result<FilterData, InputError> {
    let mut filter = FilterData::new(schema);
    let mut nested_values: IndexMap<String, Option<FieldValue>> = IndexMap::new();

    for (key, value) in data {
        let Some(value) = value else {
            continue;
        };
        let key = remove_prefix(key, prefix, delimiter);
        if schema.filter_fields().contains_key(key) || schema.search_fields().contains_key(key) {
            filter.set(key, value.clone())?;
        } else {
            nested_values.insert(key.to_string(), Some(value.clone()));
        }
    }

    for (name, nested_schema) in schema.nested_filters() {
        let scoped = format!("{name}{delimiter}");
        let subset: IndexMap<String, Option<FieldValue>> = nested_values
            .iter()
            .filter(|(key, _)| key.starts_with(&scoped))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let nested = inflate_filter(nested_schema, name, delimiter, &subset)?;
        if nested.is_empty() {
            tracing::trace!(schema = %schema.name(), field = %name, "skipped empty nested filter");
            continue;
        }
        filter.set(name, nested)?;
    }

    Ok(filter)
}

/// Values of a query string grouped by key, in first-seen order.
fn query_pairs(query: &str) -> IndexMap<String, Vec<String>> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut pairs: IndexMap<String, Vec<String>> = IndexMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        pairs
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    pairs
}

/// Last non-empty value of `key`.
fn last_value<'q>(pairs: &'q IndexMap<String, Vec<String>>, key: &str) -> Option<&'q str> {
    pairs
        .get(key)?
        .iter()
        .rev()
        .find(|v| !v.is_empty())
        .map(String::as_str)
}

/// Binds URL query strings to one filter schema.
#[derive(Debug, Clone)]
pub struct FilterQuery {
    schema: Arc<FilterSchema>,
    prefix: String,
    delimiter: String,
}

impl FilterQuery {
    /// Bind `schema` without a prefix, joining nested names with the schema's
    /// delimiter.
    pub fn new(schema: &Arc<FilterSchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            prefix: String::new(),
            delimiter: schema.config().delimiter.clone(),
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// The leaf parameters this binding accepts.
    pub fn params(&self) -> IndexMap<String, QueryParam> {
        squash_filter(&self.schema, &self.prefix, &self.delimiter)
    }

    /// Parse a query string such as `a=1&b__c=2&tags=x&tags=y`.
    ///
    /// Repeated keys fill sequence parameters; scalar parameters take the last
    /// value. Empty values count as absent. Absent parameters take their
    /// declared default, and absent required parameters are an error.
    pub fn parse(&self, query: &str) -> Result<FilterData, InputError> {
        let pairs = query_pairs(query);
        let mut values = IndexMap::new();

        for (name, param) in self.params() {
            let value = match self.parse_param(&param, pairs.get(&name))? {
                Some(value) => Some(value),
                None => match &param.default {
                    DefaultPolicy::Required => return Err(InputError::Missing(name)),
                    DefaultPolicy::Empty => None,
                    DefaultPolicy::Value(value) => Some(value.clone()),
                },
            };
            if let Some(value) = &value {
                param.constraints.check(&name, value)?;
            }
            values.insert(name, value);
        }

        inflate_filter(&self.schema, &self.prefix, &self.delimiter, &values)
    }

    fn parse_param(
        &self,
        param: &QueryParam,
        raw: Option<&Vec<String>>,
    ) -> Result<Option<FieldValue>, InputError> {
        let raw: Vec<&str> = raw
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .collect();
        if raw.is_empty() {
            return Ok(None);
        }

        let kind = param
            .annotation
            .scalar_kind()
            .ok_or_else(|| InputError::Invalid {
                param: param.name.clone(),
                reason: "parameter type cannot be read from a query string".to_string(),
            })?;
        let parse = |s: &str| {
            kind.parse(s).map_err(|reason| InputError::Invalid {
                param: param.name.clone(),
                reason,
            })
        };

        if param.is_sequence {
            let items = raw.into_iter().map(parse).collect::<Result<Vec<_>, _>>()?;
            Ok(Some(FieldValue::Many(items)))
        } else {
            match raw.last() {
                Some(last) => Ok(Some(FieldValue::Single(parse(last)?))),
                None => Ok(None),
            }
        }
    }
}

fn parse_u64(pairs: &IndexMap<String, Vec<String>>, key: &str, default: u64) -> Result<u64, InputError> {
    match last_value(pairs, key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| InputError::Invalid {
            param: key.to_string(),
            reason: format!("`{raw}` is not a non-negative integer"),
        }),
    }
}

/// `sort_by` and `sort_by_order` from a query string.
pub fn parse_sort(query: &str) -> Result<Sort, InputError> {
    let pairs = query_pairs(query);
    let sort_by_order = match last_value(&pairs, "sort_by_order") {
        Some(raw) => raw.parse()?,
        None => SortByOrder::default(),
    };
    Ok(Sort {
        sort_by: last_value(&pairs, "sort_by").map(str::to_string),
        sort_by_order,
    })
}

/// `limit` and `offset` from a query string.
pub fn parse_offset_pagination(query: &str) -> Result<OffsetPagination, InputError> {
    let pairs = query_pairs(query);
    OffsetPagination::new(
        parse_u64(&pairs, "limit", DEFAULT_LIMIT)?,
        parse_u64(&pairs, "offset", 0)?,
    )
}

/// `page` and `per_page` from a query string.
pub fn parse_page_pagination(query: &str) -> Result<PagePagination, InputError> {
    let pairs = query_pairs(query);
    PagePagination::new(
        parse_u64(&pairs, "page", 1)?,
        parse_u64(&pairs, "per_page", DEFAULT_LIMIT)?,
    )
}
