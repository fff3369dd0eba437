//! Populated filter instances.

use std::sync::Arc;

use indexmap::IndexMap;

use super::fields::DefaultPolicy;
use super::schema::{FieldKind, Filter, FilterSchema};
use crate::error::InputError;
use crate::value::{FieldValue, Scalar};

/// The attributes a caller explicitly supplied for one filter schema.
///
/// Unset attributes are absent even when their declaration has a default,
/// and are never translated into predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterData {
    schema: Arc<FilterSchema>,
    values: IndexMap<String, FieldValue>,
}

impl FilterData {
    pub fn new(schema: &Arc<FilterSchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            values: IndexMap::new(),
        }
    }

    /// Empty data for a derived filter type.
    pub fn of<F: Filter>() -> Self {
        Self::new(F::schema())
    }

    pub fn schema(&self) -> &Arc<FilterSchema> {
        &self.schema
    }

    /// Set an attribute, checking that the value has the declared shape.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), InputError> {
        let value = value.into();
        self.check_shape(name, &value)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Builder form of [`FilterData::set`].
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Result<Self, InputError> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn unset(&mut self, name: &str) -> Option<FieldValue> {
        self.values.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn nested(&self, name: &str) -> Option<&FilterData> {
        self.values.get(name).and_then(FieldValue::as_nested)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Explicitly set attributes in the order they were set.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The supplied value, or the declared default when unset.
    pub fn value_or_default(&self, name: &str) -> Option<FieldValue> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        match &self.schema.field(name)?.default {
            DefaultPolicy::Value(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Check that every required attribute is set and that every supplied
    /// value satisfies its constraints, descending into nested filters.
    pub fn validate(&self) -> Result<(), InputError> {
        for (name, spec) in self.schema.fields() {
            match self.values.get(name) {
                None if spec.default.is_required() => {
                    return Err(InputError::Missing(format!("{}.{name}", self.schema.name())));
                }
                None => {}
                Some(FieldValue::Nested(nested)) => nested.validate()?,
                Some(value) => spec.constraints.check(name, value)?,
            }
        }
        Ok(())
    }

    /// Store a value without checking its shape.
    ///
    /// Used by derived [`Filter`] impls, whose field types already fix the
    /// shape.
    #[doc(hidden)]
    pub fn insert_unchecked(&mut self, name: &str, value: FieldValue) {
        self.values.insert(name.to_string(), value);
    }

    /// Copy every set attribute of `base` into `self`.
    #[doc(hidden)]
    pub fn extend_unchecked(&mut self, base: FilterData) {
        self.values.extend(base.values);
    }

    // Unions of several scalar kinds accept any scalar.
    fn accepts(&self, name: &str, value: &Scalar) -> bool {
        self.schema
            .field(name)
            .and_then(|spec| spec.annotation.scalar_kind())
            .is_none_or(|kind| kind.accepts(value))
    }

    fn check_shape(&self, name: &str, value: &FieldValue) -> Result<(), InputError> {
        let shape_error = || InputError::ValueShape {
            schema: self.schema.name().to_string(),
            field: name.to_string(),
        };

        match (self.schema.kind_of(name), value) {
            (None, _) => Err(InputError::UnknownField {
                schema: self.schema.name().to_string(),
                field: name.to_string(),
            }),
            (Some(FieldKind::Nested), FieldValue::Nested(data)) => {
                let expected = &self.schema.nested_filters()[name];
                if Arc::ptr_eq(expected, &data.schema) || **expected == *data.schema {
                    Ok(())
                } else {
                    Err(shape_error())
                }
            }
            (Some(FieldKind::Filter | FieldKind::Search), FieldValue::Many(values))
                if self.schema.is_sequence(name) =>
            {
                if values.iter().all(|v| self.accepts(name, v)) {
                    Ok(())
                } else {
                    Err(shape_error())
                }
            }
            (Some(FieldKind::Filter | FieldKind::Search), FieldValue::Single(value))
                if !self.schema.is_sequence(name) =>
            {
                if self.accepts(name, value) {
                    Ok(())
                } else {
                    Err(shape_error())
                }
            }
            _ => Err(shape_error()),
        }
    }
}
