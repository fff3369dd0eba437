//! Schema-wide filter configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::filter::annotation::SequenceKind;
use crate::filter::definer::{FilterTypeDefiner, validate_delimiter};
use crate::filter::types::{FilterType, SearchType, default_suffixes};

/// Configuration shared by every attribute of a filter schema.
///
/// Can be written in TOML:
///
/// ```toml
/// delimiter = "___"
/// optional = false
/// default_search_type = "case_sensitive"
///
/// [suffixes]
/// not = "ne"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Separator between an attribute name and its operator suffix (default: `__`).
    pub delimiter: String,

    /// Give every attribute without a default an empty default (default: true).
    pub optional: bool,

    /// Operator for markers naming only a target (default: `eq`).
    pub default_filter_type: FilterType,

    /// Operator for search markers without one (default: case-insensitive).
    pub default_search_type: SearchType,

    /// Suffix to operator table used by the suffix definer.
    pub suffixes: IndexMap<String, FilterType>,

    /// Container kinds treated as sequences (default: list and set).
    pub sequence_types: Vec<SequenceKind>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            delimiter: "__".to_string(),
            optional: true,
            default_filter_type: FilterType::Eq,
            default_search_type: SearchType::CaseInsensitive,
            suffixes: default_suffixes(),
            sequence_types: vec![SequenceKind::List, SequenceKind::Set],
        }
    }
}

impl FilterConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: FilterConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_delimiter(&self.delimiter)
    }

    /// Build the suffix definer for this configuration.
    pub fn definer(&self) -> Result<FilterTypeDefiner, ConfigError> {
        FilterTypeDefiner::new(
            self.delimiter.clone(),
            self.default_filter_type,
            self.suffixes.clone(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FilterConfig::default();
        assert_eq!(config.delimiter, "__");
        assert!(config.optional);
        assert_eq!(config.default_filter_type, FilterType::Eq);
        assert_eq!(config.default_search_type, SearchType::CaseInsensitive);
        assert_eq!(config.sequence_types, vec![SequenceKind::List, SequenceKind::Set]);
        assert_eq!(config.suffixes, default_suffixes());
    }

    #[test]
    fn from_toml_overrides_some_keys() {
        let config = FilterConfig::from_toml_str(
            r#"
            delimiter = "___"
            optional = false
            default_search_type = "case_sensitive"
            sequence_types = ["list", "tuple"]

            [suffixes]
            not = "ne"
            "#,
        )
        .unwrap();

        assert_eq!(config.delimiter, "___");
        assert!(!config.optional);
        assert_eq!(config.default_filter_type, FilterType::Eq);
        assert_eq!(config.default_search_type, SearchType::CaseSensitive);
        assert_eq!(config.sequence_types, vec![SequenceKind::List, SequenceKind::Tuple]);
        assert_eq!(config.suffixes.len(), 1);
        assert_eq!(config.suffixes["not"], FilterType::Ne);
    }

    #[test]
    fn from_toml_rejects_bad_delimiter() {
        assert!(matches!(
            FilterConfig::from_toml_str(r#"delimiter = "-""#),
            Err(ConfigError::InvalidDelimiter(d)) if d == "-"
        ));
    }

    #[test]
    fn from_toml_rejects_unknown_operator() {
        assert!(matches!(
            FilterConfig::from_toml_str("default_filter_type = \"between\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn definer_uses_config() {
        let config = FilterConfig {
            default_filter_type: FilterType::Like,
            ..FilterConfig::default()
        };
        let definer = config.definer().unwrap();
        assert_eq!(definer.define("name"), ("name".to_string(), FilterType::Like));
        assert_eq!(definer.define("age__gte"), ("age".to_string(), FilterType::Ge));
    }
}
