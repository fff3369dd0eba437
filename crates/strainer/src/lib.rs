//! Strainer: declarative query filters.
//!
//! A filter schema declares which attributes of a request can filter, search,
//! join through relationships, sort and paginate. Schemas are compiled once,
//! either through [`FilterSchema::builder`] or `#[derive(Filter)]`, and
//! populated instances are translated into sea-query statements by the
//! [`QueryDriver`]. The [`adapter`] module binds flat request parameters to
//! schemas.

extern crate self as strainer;

pub mod adapter;
pub mod config;
pub mod driver;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod sort;
pub mod value;

pub use config::FilterConfig;
pub use driver::{JoinSpec, Model, ModelRegistry, QueryDriver, QueryParts};
pub use error::{ConfigError, DriverError, Error, InputError, Result};
pub use filter::{
    Annotated, Constraints, Filter, FilterData, FilterSchema, FilterType, ScalarKind, SearchType,
    TypeAnnotation,
};
pub use pagination::{OffsetPagination, PagePagination, Pagination};
pub use sort::{Sort, SortByOrder};
pub use value::{FieldValue, IntoFieldValue, Scalar, ToScalar};

/// `#[derive(Filter)]`: compile a struct declaration into a filter schema.
pub use strainer_macros::Filter;
