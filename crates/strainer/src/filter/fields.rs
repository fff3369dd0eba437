//! Attribute declarations and the descriptors compiled from them.

use serde::{Deserialize, Serialize};

use super::annotation::TypeAnnotation;
use super::types::{FilterType, SearchType};
use crate::error::{ConfigError, InputError};
use crate::value::{FieldValue, Scalar};

// -------------------------------------------------------------------------
// Declarations
// -------------------------------------------------------------------------

/// Validation rules and documentation attached to an attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub ge: Option<f64>,
    pub gt: Option<f64>,
    pub le: Option<f64>,
    pub lt: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }

    /// Check a supplied value against these constraints.
    ///
    /// Numeric bounds apply to each numeric element, length bounds to strings
    /// and to the number of elements of a sequence.
    pub fn check(&self, param: &str, value: &FieldValue) -> Result<(), InputError> {
        match value {
            FieldValue::Single(scalar) => {
                self.check_bounds(param, scalar)?;
                if let Some(s) = scalar.as_str() {
                    self.check_length(param, s.chars().count())?;
                }
            }
            FieldValue::Many(items) => {
                self.check_length(param, items.len())?;
                for item in items {
                    self.check_bounds(param, item)?;
                }
            }
            FieldValue::Nested(_) => {}
        }
        Ok(())
    }

    fn check_bounds(&self, param: &str, scalar: &Scalar) -> Result<(), InputError> {
        let Some(n) = scalar.as_f64() else {
            return Ok(());
        };
        let violation = if self.ge.is_some_and(|ge| n < ge) {
            self.ge.map(|ge| format!("must be greater than or equal to {ge}"))
        } else if self.gt.is_some_and(|gt| n <= gt) {
            self.gt.map(|gt| format!("must be greater than {gt}"))
        } else if self.le.is_some_and(|le| n > le) {
            self.le.map(|le| format!("must be less than or equal to {le}"))
        } else if self.lt.is_some_and(|lt| n >= lt) {
            self.lt.map(|lt| format!("must be less than {lt}"))
        } else {
            None
        };
        match violation {
            Some(reason) => Err(InputError::Constraint {
                param: param.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    fn check_length(&self, param: &str, len: usize) -> Result<(), InputError> {
        if let Some(min) = self.min_length.filter(|min| len < *min) {
            return Err(InputError::Constraint {
                param: param.to_string(),
                reason: format!("length must be at least {min}"),
            });
        }
        if let Some(max) = self.max_length.filter(|max| len > *max) {
            return Err(InputError::Constraint {
                param: param.to_string(),
                reason: format!("length must be at most {max}"),
            });
        }
        Ok(())
    }
}

/// Explicit filter metadata on an attribute. Unset parts are filled in by the
/// extractor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterMarker {
    pub target: Option<String>,
    pub filter_type: Option<FilterType>,
}

impl FilterMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn op(mut self, filter_type: FilterType) -> Self {
        self.filter_type = Some(filter_type);
        self
    }
}

/// Marks an attribute as a search over one or more columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMarker {
    pub targets: Vec<String>,
    pub search_type: Option<SearchType>,
}

impl SearchMarker {
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            search_type: None,
        }
    }

    pub fn op(mut self, search_type: SearchType) -> Self {
        self.search_type = Some(search_type);
        self
    }
}

/// How an attribute was declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AttributeSpec {
    /// No marker: a filter field whose operator comes from its name suffix,
    /// or a nested filter when the annotation is a schema.
    #[default]
    Plain,
    Filter(FilterMarker),
    Search(SearchMarker),
}

/// The default as written in the declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DeclaredDefault {
    /// Nothing declared.
    #[default]
    Missing,
    /// Explicitly required; stays required in optional mode.
    Required,
    Value(FieldValue),
}

/// The default after the extractors normalized it.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultPolicy {
    /// The caller must supply a value.
    Required,
    /// Defaults to unset.
    Empty,
    Value(FieldValue),
}

impl DefaultPolicy {
    pub fn is_required(&self) -> bool {
        matches!(self, DefaultPolicy::Required)
    }
}

/// One declared attribute of a schema body.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub annotation: TypeAnnotation,
    pub spec: AttributeSpec,
    pub default: DeclaredDefault,
    pub constraints: Constraints,
}

impl Declaration {
    pub fn new(name: impl Into<String>, annotation: TypeAnnotation) -> Self {
        Self {
            name: name.into(),
            annotation,
            spec: AttributeSpec::Plain,
            default: DeclaredDefault::Missing,
            constraints: Constraints::default(),
        }
    }

    pub fn filter(mut self, marker: FilterMarker) -> Self {
        self.spec = AttributeSpec::Filter(marker);
        self
    }

    pub fn search(mut self, marker: SearchMarker) -> Self {
        self.spec = AttributeSpec::Search(marker);
        self
    }

    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = DeclaredDefault::Value(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.default = DeclaredDefault::Required;
        self
    }

    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}

// -------------------------------------------------------------------------
// Compiled descriptors
// -------------------------------------------------------------------------

/// Compiled view of any attribute: its type, default and constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub annotation: TypeAnnotation,
    pub default: DefaultPolicy,
    pub constraints: Constraints,
}

/// Descriptor of a filter field.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterFieldInfo {
    /// Column the predicate applies to.
    pub target: String,
    pub filter_type: FilterType,
    pub is_sequence: bool,
    pub constraints: Constraints,
}

/// Descriptor of a search field.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFieldInfo {
    targets: Vec<String>,
    pub search_type: SearchType,
    pub is_sequence: bool,
    pub constraints: Constraints,
}

impl SearchFieldInfo {
    /// Create a descriptor. `targets` must not be empty.
    pub fn new(
        field: &str,
        targets: Vec<String>,
        search_type: SearchType,
        is_sequence: bool,
        constraints: Constraints,
    ) -> Result<Self, ConfigError> {
        if targets.is_empty() {
            return Err(ConfigError::EmptySearchTargets {
                field: field.to_string(),
            });
        }
        Ok(Self {
            targets,
            search_type,
            is_sequence,
            constraints,
        })
    }

    /// Columns searched, in declaration order. Never empty.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn search_field_requires_targets() {
        let err = SearchFieldInfo::new(
            "q",
            Vec::new(),
            SearchType::CaseInsensitive,
            false,
            Constraints::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptySearchTargets { field } if field == "q"));

        let info = SearchFieldInfo::new(
            "q",
            vec!["name".into(), "email".into()],
            SearchType::CaseSensitive,
            true,
            Constraints::default(),
        )
        .unwrap();
        assert_eq!(info.targets(), ["name", "email"]);
    }

    #[test]
    fn markers_are_built_fluently() {
        let marker = FilterMarker::new().target("created_at").op(FilterType::Ge);
        assert_eq!(marker.target.as_deref(), Some("created_at"));
        assert_eq!(marker.filter_type, Some(FilterType::Ge));

        let search = SearchMarker::new(["title", "body"]).op(SearchType::CaseSensitive);
        assert_eq!(search.targets, vec!["title", "body"]);
        assert_eq!(search.search_type, Some(SearchType::CaseSensitive));
    }

    #[test]
    fn numeric_bounds() {
        let constraints = Constraints {
            ge: Some(1.0),
            lt: Some(10.0),
            ..Constraints::default()
        };
        assert!(constraints.check("limit", &FieldValue::from(1_i64)).is_ok());
        assert!(constraints.check("limit", &FieldValue::from(9.5_f64)).is_ok());

        let err = constraints.check("limit", &FieldValue::from(0_i64)).unwrap_err();
        assert!(matches!(err, InputError::Constraint { param, .. } if param == "limit"));
        assert!(constraints.check("limit", &FieldValue::from(10_i64)).is_err());

        let many = FieldValue::from(vec![2_i64, 12]);
        assert!(constraints.check("ids", &many).is_err());
    }

    #[test]
    fn length_bounds() {
        let constraints = Constraints {
            min_length: Some(2),
            max_length: Some(3),
            ..Constraints::default()
        };
        assert!(constraints.check("q", &FieldValue::from("ab")).is_ok());
        assert!(constraints.check("q", &FieldValue::from("a")).is_err());
        assert!(constraints.check("q", &FieldValue::from("abcd")).is_err());
        assert!(constraints.check("q", &FieldValue::from(vec!["a", "b"])).is_ok());
        assert!(constraints.check("q", &FieldValue::from(vec!["a"])).is_err());
    }

    #[test]
    fn non_numeric_values_skip_bounds() {
        let constraints = Constraints {
            gt: Some(0.0),
            ..Constraints::default()
        };
        assert!(constraints.check("name", &FieldValue::from("x")).is_ok());
        assert!(!constraints.is_empty());
        assert!(Constraints::default().is_empty());
    }
}
