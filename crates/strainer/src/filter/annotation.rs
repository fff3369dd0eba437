//! Declared attribute types.
//!
//! A [`TypeAnnotation`] is the static description of an attribute's type that
//! the extractors inspect: whether it is optional, whether it is a sequence and
//! whether it is itself a filter schema.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::schema::FilterSchema;
use crate::value::Scalar;

/// Element type of a scalar attribute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Str,
    Uuid,
}

impl ScalarKind {
    /// Whether `value` can stand for this kind. Integers widen to floats.
    pub fn accepts(self, value: &Scalar) -> bool {
        matches!(
            (self, value),
            (ScalarKind::Bool, Scalar::Boolean(_))
                | (ScalarKind::Int, Scalar::Integer(_))
                | (ScalarKind::Float, Scalar::Float(_) | Scalar::Integer(_))
                | (ScalarKind::Str, Scalar::String(_))
                | (ScalarKind::Uuid, Scalar::Uuid(_))
        )
    }

    /// Parse raw request text into a value of this kind.
    pub fn parse(self, raw: &str) -> Result<Scalar, String> {
        match self {
            ScalarKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" | "t" | "y" => Ok(Scalar::Boolean(true)),
                "false" | "0" | "no" | "off" | "f" | "n" => Ok(Scalar::Boolean(false)),
                _ => Err(format!("`{raw}` is not a boolean")),
            },
            ScalarKind::Int => raw
                .parse::<i64>()
                .map(Scalar::Integer)
                .map_err(|_| format!("`{raw}` is not an integer")),
            ScalarKind::Float => raw
                .parse::<f64>()
                .map(Scalar::Float)
                .map_err(|_| format!("`{raw}` is not a number")),
            ScalarKind::Str => Ok(Scalar::String(raw.to_string())),
            ScalarKind::Uuid => Uuid::parse_str(raw)
                .map(Scalar::Uuid)
                .map_err(|_| format!("`{raw}` is not a UUID")),
        }
    }
}

/// Container kind of a sequence attribute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    List,
    Set,
    Tuple,
}

/// Static type of a declared attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeAnnotation {
    /// A single value.
    Scalar(ScalarKind),
    /// A container of values.
    Sequence(SequenceKind, Box<TypeAnnotation>),
    /// `inner` or none.
    Optional(Box<TypeAnnotation>),
    /// Any of the members; [`TypeAnnotation::NoneType`] marks a nullable union.
    Union(Vec<TypeAnnotation>),
    /// The null type.
    NoneType,
    /// Another filter schema; declares a nested filter.
    Filter(Arc<FilterSchema>),
}

impl TypeAnnotation {
    pub fn optional(inner: TypeAnnotation) -> Self {
        TypeAnnotation::Optional(Box::new(inner))
    }

    pub fn list(inner: TypeAnnotation) -> Self {
        TypeAnnotation::Sequence(SequenceKind::List, Box::new(inner))
    }

    pub fn set(inner: TypeAnnotation) -> Self {
        TypeAnnotation::Sequence(SequenceKind::Set, Box::new(inner))
    }

    /// Strip a nullable wrapper.
    ///
    /// `Optional(T)` becomes `T`, and a union of exactly one non-null member
    /// with the null type becomes that member. Anything else is returned as is.
    pub fn simplify_optional(&self) -> &TypeAnnotation {
        match self {
            TypeAnnotation::Optional(inner) => inner.as_ref(),
            TypeAnnotation::Union(members) => {
                let mut rest = members
                    .iter()
                    .filter(|m| !matches!(m, TypeAnnotation::NoneType));
                match (rest.next(), rest.next()) {
                    (Some(only), None) => only,
                    _ => self,
                }
            }
            other => other,
        }
    }

    /// Whether the annotation, after stripping a nullable wrapper, is a
    /// container whose kind is listed in `sequence_types`.
    pub fn is_sequence(&self, sequence_types: &[SequenceKind]) -> bool {
        match self.simplify_optional() {
            TypeAnnotation::Sequence(kind, _) => sequence_types.contains(kind),
            _ => false,
        }
    }

    /// The nested schema, if the annotation (after stripping a nullable
    /// wrapper) is a filter schema.
    pub fn nested_schema(&self) -> Option<&Arc<FilterSchema>> {
        match self.simplify_optional() {
            TypeAnnotation::Filter(schema) => Some(schema),
            _ => None,
        }
    }

    /// Kind of the scalar values this annotation accepts, looking through
    /// nullable wrappers and sequences.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.simplify_optional() {
            TypeAnnotation::Scalar(kind) => Some(*kind),
            TypeAnnotation::Sequence(_, inner) => inner.scalar_kind(),
            _ => None,
        }
    }
}

/// Types that can be declared as filter attributes.
pub trait Annotated {
    fn annotation() -> TypeAnnotation;
}

macro_rules! scalar_annotations {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Annotated for $ty {
                fn annotation() -> TypeAnnotation {
                    TypeAnnotation::Scalar(ScalarKind::$kind)
                }
            }
        )*
    };
}

scalar_annotations! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Str,
    Uuid => Uuid,
}

impl<T: Annotated> Annotated for Option<T> {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::optional(T::annotation())
    }
}

impl<T: Annotated> Annotated for Vec<T> {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::list(T::annotation())
    }
}

impl<T: Annotated, S> Annotated for HashSet<T, S> {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::set(T::annotation())
    }
}

impl<T: Annotated> Annotated for BTreeSet<T> {
    fn annotation() -> TypeAnnotation {
        TypeAnnotation::set(T::annotation())
    }
}
