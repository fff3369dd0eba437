//! Field descriptor extractors.
//!
//! Each extractor turns one [`Declaration`] into its normalized [`FieldSpec`]
//! and the descriptor stored in the matching schema map.

use std::sync::Arc;

use super::annotation::SequenceKind;
use super::definer::FilterTypeDefiner;
use super::fields::{
    AttributeSpec, DeclaredDefault, Declaration, DefaultPolicy, FieldSpec, FilterFieldInfo,
    FilterMarker, SearchFieldInfo, SearchMarker,
};
use super::schema::FilterSchema;
use super::types::{FilterType, SearchType};
use crate::config::FilterConfig;
use crate::error::ConfigError;

/// Normalize a declared default.
///
/// An explicit "required" stays required. A concrete default is kept. An
/// attribute with no default becomes [`DefaultPolicy::Empty`] in optional
/// mode and [`DefaultPolicy::Required`] otherwise.
pub fn defaults_to_override(declared: &DeclaredDefault, optional: bool) -> DefaultPolicy {
    match declared {
        DeclaredDefault::Required => DefaultPolicy::Required,
        DeclaredDefault::Value(value) => DefaultPolicy::Value(value.clone()),
        DeclaredDefault::Missing if optional => DefaultPolicy::Empty,
        DeclaredDefault::Missing => DefaultPolicy::Required,
    }
}

fn field_spec(decl: &Declaration, optional: bool) -> FieldSpec {
    FieldSpec {
        annotation: decl.annotation.clone(),
        default: defaults_to_override(&decl.default, optional),
        constraints: decl.constraints.clone(),
    }
}

// -------------------------------------------------------------------------
// Nested filters
// -------------------------------------------------------------------------

/// Extracts attributes whose type is another filter schema.
#[derive(Debug, Clone)]
pub struct NestedFilterExtractor {
    optional: bool,
}

impl NestedFilterExtractor {
    pub fn new(optional: bool) -> Self {
        Self { optional }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.optional)
    }

    /// Nested attributes are joins, so they cannot carry an operator marker.
    pub fn extract(
        &self,
        schema: &str,
        decl: &Declaration,
        nested: &Arc<FilterSchema>,
    ) -> Result<(FieldSpec, Arc<FilterSchema>), ConfigError> {
        if !matches!(decl.spec, AttributeSpec::Plain) {
            return Err(ConfigError::MarkerOnNested {
                schema: schema.to_string(),
                field: decl.name.clone(),
            });
        }
        Ok((field_spec(decl, self.optional), Arc::clone(nested)))
    }
}

// -------------------------------------------------------------------------
// Search fields
// -------------------------------------------------------------------------

/// Extracts attributes carrying a [`SearchMarker`].
#[derive(Debug, Clone)]
pub struct SearchFieldExtractor {
    optional: bool,
    default_search_type: SearchType,
    sequence_types: Vec<SequenceKind>,
}

impl SearchFieldExtractor {
    pub fn new(
        optional: bool,
        default_search_type: SearchType,
        sequence_types: Vec<SequenceKind>,
    ) -> Self {
        Self {
            optional,
            default_search_type,
            sequence_types,
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(
            config.optional,
            config.default_search_type,
            config.sequence_types.clone(),
        )
    }

    pub fn extract(
        &self,
        decl: &Declaration,
        marker: &SearchMarker,
    ) -> Result<(FieldSpec, SearchFieldInfo), ConfigError> {
        let info = SearchFieldInfo::new(
            &decl.name,
            marker.targets.clone(),
            marker.search_type.unwrap_or(self.default_search_type),
            decl.annotation.is_sequence(&self.sequence_types),
            decl.constraints.clone(),
        )?;
        Ok((field_spec(decl, self.optional), info))
    }
}

// -------------------------------------------------------------------------
// Filter fields
// -------------------------------------------------------------------------

/// Extracts plain attributes and attributes carrying a [`FilterMarker`].
#[derive(Debug, Clone)]
pub struct FilterFieldExtractor {
    optional: bool,
    default_filter_type: FilterType,
    sequence_types: Vec<SequenceKind>,
    definer: FilterTypeDefiner,
}

impl FilterFieldExtractor {
    pub fn new(
        optional: bool,
        default_filter_type: FilterType,
        sequence_types: Vec<SequenceKind>,
        definer: FilterTypeDefiner,
    ) -> Self {
        Self {
            optional,
            default_filter_type,
            sequence_types,
            definer,
        }
    }

    pub fn from_config(config: &FilterConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.optional,
            config.default_filter_type,
            config.sequence_types.clone(),
            config.definer()?,
        ))
    }

    /// Resolve target and operator.
    ///
    /// Without a marker, or with a marker naming neither, both come from the
    /// name suffix. A marker naming only the operator targets the raw
    /// attribute name; one naming only the target uses the default operator.
    pub fn extract(
        &self,
        decl: &Declaration,
        marker: Option<&FilterMarker>,
    ) -> (FieldSpec, FilterFieldInfo) {
        let (target, filter_type) = match marker {
            None
            | Some(FilterMarker {
                target: None,
                filter_type: None,
            }) => self.definer.define(&decl.name),
            Some(FilterMarker {
                target: None,
                filter_type: Some(ty),
            }) => (decl.name.clone(), *ty),
            Some(FilterMarker {
                target: Some(target),
                filter_type: None,
            }) => (target.clone(), self.default_filter_type),
            Some(FilterMarker {
                target: Some(target),
                filter_type: Some(ty),
            }) => (target.clone(), *ty),
        };

        let info = FilterFieldInfo {
            target,
            filter_type,
            is_sequence: decl.annotation.is_sequence(&self.sequence_types),
            constraints: decl.constraints.clone(),
        };
        (field_spec(decl, self.optional), info)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::filter::annotation::{ScalarKind, TypeAnnotation};
    use crate::value::FieldValue;

    fn int() -> TypeAnnotation {
        TypeAnnotation::Scalar(ScalarKind::Int)
    }

    fn filter_extractor(optional: bool) -> FilterFieldExtractor {
        let config = FilterConfig {
            optional,
            default_filter_type: FilterType::Like,
            ..FilterConfig::default()
        };
        FilterFieldExtractor::from_config(&config).unwrap()
    }

    fn empty_schema() -> Arc<FilterSchema> {
        FilterSchema::builder("Empty").build().unwrap()
    }

    #[test]
    fn requiredness_rules() {
        let value = FieldValue::from(5_i64);
        assert_eq!(
            defaults_to_override(&DeclaredDefault::Required, true),
            DefaultPolicy::Required
        );
        assert_eq!(
            defaults_to_override(&DeclaredDefault::Value(value.clone()), true),
            DefaultPolicy::Value(value.clone())
        );
        assert_eq!(
            defaults_to_override(&DeclaredDefault::Value(value.clone()), false),
            DefaultPolicy::Value(value)
        );
        assert_eq!(
            defaults_to_override(&DeclaredDefault::Missing, true),
            DefaultPolicy::Empty
        );
        assert_eq!(
            defaults_to_override(&DeclaredDefault::Missing, false),
            DefaultPolicy::Required
        );
    }

    #[test]
    fn plain_field_uses_suffix() {
        let decl = Declaration::new("age__gte", int());
        let (spec, info) = filter_extractor(true).extract(&decl, None);
        assert_eq!(info.target, "age");
        assert_eq!(info.filter_type, FilterType::Ge);
        assert!(!info.is_sequence);
        assert_eq!(spec.default, DefaultPolicy::Empty);
    }

    #[test]
    fn plain_field_required_outside_optional_mode() {
        let decl = Declaration::new("age", int());
        let (spec, info) = filter_extractor(false).extract(&decl, None);
        assert_eq!(spec.default, DefaultPolicy::Required);
        assert_eq!(info.filter_type, FilterType::Like);
    }

    #[test]
    fn empty_marker_behaves_like_plain() {
        let decl = Declaration::new("name__n", TypeAnnotation::list(int()));
        let (_, info) = filter_extractor(true).extract(&decl, Some(&FilterMarker::new()));
        assert_eq!(info.target, "name");
        assert_eq!(info.filter_type, FilterType::Ne);
        assert!(info.is_sequence);
    }

    #[test]
    fn marker_with_only_type_targets_raw_name() {
        let decl = Declaration::new("name__n", int());
        let marker = FilterMarker::new().op(FilterType::Gt);
        let (_, info) = filter_extractor(true).extract(&decl, Some(&marker));
        assert_eq!(info.target, "name__n");
        assert_eq!(info.filter_type, FilterType::Gt);
    }

    #[test]
    fn marker_with_only_target_uses_default_type() {
        let decl = Declaration::new("name__n", int());
        let marker = FilterMarker::new().target("title");
        let (_, info) = filter_extractor(true).extract(&decl, Some(&marker));
        assert_eq!(info.target, "title");
        assert_eq!(info.filter_type, FilterType::Like);
    }

    #[test]
    fn marker_with_both_is_kept() {
        let decl = Declaration::new("x", int()).required();
        let marker = FilterMarker::new().target("y").op(FilterType::Lt);
        let (spec, info) = filter_extractor(true).extract(&decl, Some(&marker));
        assert_eq!((info.target.as_str(), info.filter_type), ("y", FilterType::Lt));
        assert_eq!(spec.default, DefaultPolicy::Required);
    }

    #[test]
    fn search_field_defaults() {
        let extractor = SearchFieldExtractor::from_config(&FilterConfig::default());
        let decl = Declaration::new("q", TypeAnnotation::Scalar(ScalarKind::Str));
        let (spec, info) = extractor
            .extract(&decl, &SearchMarker::new(["name", "email"]))
            .unwrap();
        assert_eq!(info.search_type, SearchType::CaseInsensitive);
        assert_eq!(info.targets(), ["name", "email"]);
        assert!(!info.is_sequence);
        assert_eq!(spec.default, DefaultPolicy::Empty);
    }

    #[test]
    fn search_field_explicit_type_and_sequence() {
        let extractor = SearchFieldExtractor::from_config(&FilterConfig::default());
        let decl = Declaration::new(
            "q",
            TypeAnnotation::optional(TypeAnnotation::list(TypeAnnotation::Scalar(ScalarKind::Str))),
        );
        let marker = SearchMarker::new(["name"]).op(SearchType::CaseSensitive);
        let (_, info) = extractor.extract(&decl, &marker).unwrap();
        assert_eq!(info.search_type, SearchType::CaseSensitive);
        assert!(info.is_sequence);
    }

    #[test]
    fn search_field_without_targets_fails() {
        let extractor = SearchFieldExtractor::from_config(&FilterConfig::default());
        let decl = Declaration::new("q", TypeAnnotation::Scalar(ScalarKind::Str));
        let empty: [&str; 0] = [];
        assert!(matches!(
            extractor.extract(&decl, &SearchMarker::new(empty)),
            Err(ConfigError::EmptySearchTargets { .. })
        ));
    }

    #[test]
    fn nested_defaults() {
        let nested = empty_schema();
        let decl = Declaration::new("b", TypeAnnotation::Filter(Arc::clone(&nested)));

        let (spec, schema) = NestedFilterExtractor::new(true)
            .extract("A", &decl, &nested)
            .unwrap();
        assert_eq!(spec.default, DefaultPolicy::Empty);
        assert!(Arc::ptr_eq(&schema, &nested));

        let (spec, _) = NestedFilterExtractor::new(false)
            .extract("A", &decl, &nested)
            .unwrap();
        assert_eq!(spec.default, DefaultPolicy::Required);

        let required = decl.clone().required();
        let (spec, _) = NestedFilterExtractor::new(true)
            .extract("A", &required, &nested)
            .unwrap();
        assert_eq!(spec.default, DefaultPolicy::Required);
    }

    #[test]
    fn nested_rejects_markers() {
        let nested = empty_schema();
        let annotation = TypeAnnotation::Filter(Arc::clone(&nested));
        let extractor = NestedFilterExtractor::new(true);

        let with_filter = Declaration::new("b", annotation.clone()).filter(FilterMarker::new());
        assert!(matches!(
            extractor.extract("A", &with_filter, &nested),
            Err(ConfigError::MarkerOnNested { schema, field }) if schema == "A" && field == "b"
        ));

        let with_search = Declaration::new("b", annotation).search(SearchMarker::new(["id"]));
        assert!(extractor.extract("A", &with_search, &nested).is_err());
    }
}
