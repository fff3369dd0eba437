//! Filter and search operator kinds.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Comparison operator applied by a filter field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Equality, or set membership for sequences.
    #[default]
    Eq,
    /// Inequality, or set exclusion for sequences.
    Ne,
    /// `IS NULL` when the value is truthy, `IS NOT NULL` otherwise.
    Null,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Substring match (`LIKE '%value%'`).
    Like,
    /// Case-insensitive substring match (`ILIKE '%value%'`).
    Ilike,
}

impl FilterType {
    pub const ALL: [FilterType; 9] = [
        FilterType::Eq,
        FilterType::Ne,
        FilterType::Null,
        FilterType::Gt,
        FilterType::Ge,
        FilterType::Lt,
        FilterType::Le,
        FilterType::Like,
        FilterType::Ilike,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterType::Eq => "eq",
            FilterType::Ne => "ne",
            FilterType::Null => "null",
            FilterType::Gt => "gt",
            FilterType::Ge => "ge",
            FilterType::Lt => "lt",
            FilterType::Le => "le",
            FilterType::Like => "like",
            FilterType::Ilike => "ilike",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownFilterType(s.to_string()))
    }
}

/// Pattern operator applied by a search field across its targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// `LIKE '%value%'`.
    CaseSensitive,
    /// `ILIKE '%value%'`.
    #[default]
    CaseInsensitive,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::CaseSensitive => "case_sensitive",
            SearchType::CaseInsensitive => "case_insensitive",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "case_sensitive" => Ok(SearchType::CaseSensitive),
            "case_insensitive" => Ok(SearchType::CaseInsensitive),
            other => Err(ConfigError::UnknownSearchType(other.to_string())),
        }
    }
}

/// Suffix table used when a schema does not configure its own.
///
/// Several spellings map to the same operator (`n`, `ne` and `neq` all mean
/// inequality). Iteration order is stable.
pub fn default_suffixes() -> IndexMap<String, FilterType> {
    [
        ("eq", FilterType::Eq),
        ("n", FilterType::Ne),
        ("ne", FilterType::Ne),
        ("neq", FilterType::Ne),
        ("null", FilterType::Null),
        ("isnull", FilterType::Null),
        ("gt", FilterType::Gt),
        ("ge", FilterType::Ge),
        ("gte", FilterType::Ge),
        ("lt", FilterType::Lt),
        ("le", FilterType::Le),
        ("lte", FilterType::Le),
        ("l", FilterType::Like),
        ("like", FilterType::Like),
        ("il", FilterType::Ilike),
        ("ilike", FilterType::Ilike),
    ]
    .into_iter()
    .map(|(suffix, ty)| (suffix.to_string(), ty))
    .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn every_filter_type_has_a_suffix() {
        let suffixes = default_suffixes();
        for ty in FilterType::ALL {
            assert!(
                suffixes.values().any(|v| *v == ty),
                "no default suffix for {ty}"
            );
        }
    }

    #[test]
    fn suffix_aliases() {
        let suffixes = default_suffixes();
        assert_eq!(suffixes["neq"], FilterType::Ne);
        assert_eq!(suffixes["isnull"], FilterType::Null);
        assert_eq!(suffixes["gte"], FilterType::Ge);
        assert_eq!(suffixes["lte"], FilterType::Le);
        assert_eq!(suffixes["l"], FilterType::Like);
        assert_eq!(suffixes["il"], FilterType::Ilike);
    }

    #[test]
    fn parse_filter_type() {
        assert_eq!("ilike".parse::<FilterType>().unwrap(), FilterType::Ilike);
        assert!(matches!(
            "between".parse::<FilterType>(),
            Err(ConfigError::UnknownFilterType(s)) if s == "between"
        ));
    }

    #[test]
    fn parse_search_type() {
        assert_eq!(
            "case_sensitive".parse::<SearchType>().unwrap(),
            SearchType::CaseSensitive
        );
        assert!("fuzzy".parse::<SearchType>().is_err());
        assert_eq!(SearchType::default(), SearchType::CaseInsensitive);
    }

    #[test]
    fn serde_names() {
        let json = serde_json::to_string(&FilterType::Ilike).unwrap();
        assert_eq!(json, "\"ilike\"");
        let ty: SearchType = serde_json::from_str("\"case_sensitive\"").unwrap();
        assert_eq!(ty, SearchType::CaseSensitive);
    }
}
