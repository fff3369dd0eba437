//! Filter schemas: declarations, compilation and populated instances.

pub mod annotation;
pub mod data;
pub mod definer;
pub mod extractors;
pub mod fields;
pub mod schema;
pub mod types;

pub use annotation::{Annotated, ScalarKind, SequenceKind, TypeAnnotation};
pub use data::FilterData;
pub use definer::FilterTypeDefiner;
pub use extractors::{FilterFieldExtractor, NestedFilterExtractor, SearchFieldExtractor};
pub use fields::{
    AttributeSpec, Constraints, DeclaredDefault, Declaration, DefaultPolicy, FieldSpec,
    FilterFieldInfo, FilterMarker, SearchFieldInfo, SearchMarker,
};
pub use schema::{FieldKind, Filter, FilterSchema, SchemaBuilder};
pub use types::{FilterType, SearchType, default_suffixes};
