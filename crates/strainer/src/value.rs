//! Values carried by populated filters.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::filter::FilterData;

/// A single comparable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean value.
    Boolean(bool),
    /// Integer value.
    Integer(i64),
    /// Float value.
    Float(f64),
    /// UUID value.
    Uuid(Uuid),
    /// String value.
    String(String),
}

impl Scalar {
    /// Truthiness used by the null operator: `false`, `0`, `0.0` and the empty
    /// string are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Boolean(b) => *b,
            Scalar::Integer(i) => *i != 0,
            Scalar::Float(f) => *f != 0.0,
            Scalar::Uuid(_) => true,
            Scalar::String(s) => !s.is_empty(),
        }
    }

    /// Text used inside `%...%` patterns.
    pub fn as_pattern_text(&self) -> String {
        match self {
            Scalar::Boolean(b) => b.to_string(),
            Scalar::Integer(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Uuid(u) => u.to_string(),
            Scalar::String(s) => s.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<&Scalar> for sea_query::Value {
    fn from(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Boolean(b) => (*b).into(),
            Scalar::Integer(i) => (*i).into(),
            Scalar::Float(f) => (*f).into(),
            Scalar::Uuid(u) => (*u).into(),
            Scalar::String(s) => s.clone().into(),
        }
    }
}

/// The value of one explicitly set attribute of a populated filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Value of a scalar field.
    Single(Scalar),
    /// Value of a sequence field.
    Many(Vec<Scalar>),
    /// Populated nested filter.
    Nested(FilterData),
}

impl FieldValue {
    pub fn as_nested(&self) -> Option<&FilterData> {
        match self {
            FieldValue::Nested(data) => Some(data),
            _ => None,
        }
    }
}

impl From<Scalar> for FieldValue {
    fn from(scalar: Scalar) -> Self {
        FieldValue::Single(scalar)
    }
}

impl From<FilterData> for FieldValue {
    fn from(data: FilterData) -> Self {
        FieldValue::Nested(data)
    }
}

impl<T: ToScalar> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::Many(items.iter().map(ToScalar::to_scalar).collect())
    }
}

/// Conversion of a plain Rust value into a [`Scalar`].
pub trait ToScalar {
    fn to_scalar(&self) -> Scalar;
}

/// Conversion of a struct field into the value a populated filter stores.
///
/// `None` means the attribute was not supplied and stays unset.
pub trait IntoFieldValue {
    fn to_field_value(&self) -> Option<FieldValue>;
}

macro_rules! scalar_impls {
    ($($ty:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl ToScalar for $ty {
                fn to_scalar(&self) -> Scalar {
                    Scalar::$variant(<$conv>::from(self.to_owned()))
                }
            }

            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(<$conv>::from(value))
                }
            }

            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Single(Scalar::from(value))
                }
            }

            impl IntoFieldValue for $ty {
                fn to_field_value(&self) -> Option<FieldValue> {
                    Some(FieldValue::Single(self.to_scalar()))
                }
            }
        )*
    };
}

scalar_impls! {
    bool => Boolean as bool,
    i8 => Integer as i64,
    i16 => Integer as i64,
    i32 => Integer as i64,
    i64 => Integer as i64,
    u8 => Integer as i64,
    u16 => Integer as i64,
    u32 => Integer as i64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => String as String,
    Uuid => Uuid as Uuid,
}

impl ToScalar for &str {
    fn to_scalar(&self) -> Scalar {
        Scalar::String((*self).to_string())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(Scalar::from(value))
    }
}

impl ToScalar for Scalar {
    fn to_scalar(&self) -> Scalar {
        self.clone()
    }
}

impl<T: IntoFieldValue> IntoFieldValue for Option<T> {
    fn to_field_value(&self) -> Option<FieldValue> {
        self.as_ref().and_then(IntoFieldValue::to_field_value)
    }
}

impl<T: ToScalar> IntoFieldValue for Vec<T> {
    fn to_field_value(&self) -> Option<FieldValue> {
        Some(FieldValue::Many(self.iter().map(ToScalar::to_scalar).collect()))
    }
}

impl<T: ToScalar, S> IntoFieldValue for HashSet<T, S> {
    fn to_field_value(&self) -> Option<FieldValue> {
        Some(FieldValue::Many(self.iter().map(ToScalar::to_scalar).collect()))
    }
}

impl<T: ToScalar> IntoFieldValue for BTreeSet<T> {
    fn to_field_value(&self) -> Option<FieldValue> {
        Some(FieldValue::Many(self.iter().map(ToScalar::to_scalar).collect()))
    }
}
