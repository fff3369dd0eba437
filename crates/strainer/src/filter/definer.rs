//! Suffix-based operator resolution for plain filter fields.

use indexmap::IndexMap;

use super::types::FilterType;
use crate::error::ConfigError;

/// Splits an attribute name such as `price__gte` into its target column and
/// the operator named by its suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTypeDefiner {
    delimiter: String,
    default: FilterType,
    suffixes: IndexMap<String, FilterType>,
}

impl FilterTypeDefiner {
    /// Create a definer. The delimiter must be two or more underscores.
    pub fn new(
        delimiter: impl Into<String>,
        default: FilterType,
        suffixes: IndexMap<String, FilterType>,
    ) -> Result<Self, ConfigError> {
        let delimiter = delimiter.into();
        validate_delimiter(&delimiter)?;
        Ok(Self {
            delimiter,
            default,
            suffixes,
        })
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn default_type(&self) -> FilterType {
        self.default
    }

    /// Resolve `name` into `(target, operator)`.
    ///
    /// Only the text after the last delimiter is treated as a suffix. A name
    /// whose suffix is not in the table is returned whole, unstripped, with the
    /// default operator: `name__asdf` targets the column `name__asdf`.
    pub fn define(&self, name: &str) -> (String, FilterType) {
        let Some((prefix, suffix)) = name.rsplit_once(self.delimiter.as_str()) else {
            return (name.to_string(), self.default);
        };

        match self.suffixes.get(suffix) {
            Some(ty) => (prefix.to_string(), *ty),
            None => (name.to_string(), self.default),
        }
    }
}

/// Check that `delimiter` consists of at least two underscores.
pub fn validate_delimiter(delimiter: &str) -> Result<(), ConfigError> {
    if delimiter.len() >= 2 && delimiter.bytes().all(|b| b == b'_') {
        Ok(())
    } else {
        Err(ConfigError::InvalidDelimiter(delimiter.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn definer() -> FilterTypeDefiner {
        let suffixes = [
            ("n".to_string(), FilterType::Ne),
            ("lt".to_string(), FilterType::Lt),
        ]
        .into_iter()
        .collect();
        FilterTypeDefiner::new("__", FilterType::Eq, suffixes).unwrap()
    }

    #[test]
    fn rejects_bad_delimiters() {
        for bad in ["", "_", "--", "_-", "__a"] {
            assert!(
                matches!(
                    FilterTypeDefiner::new(bad, FilterType::Eq, IndexMap::new()),
                    Err(ConfigError::InvalidDelimiter(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_underscore_runs() {
        assert!(FilterTypeDefiner::new("__", FilterType::Eq, IndexMap::new()).is_ok());
        assert!(FilterTypeDefiner::new("___", FilterType::Eq, IndexMap::new()).is_ok());
    }

    #[test]
    fn known_suffix_is_stripped() {
        let d = definer();
        assert_eq!(d.define("name__n"), ("name".to_string(), FilterType::Ne));
        assert_eq!(d.define("name__lt"), ("name".to_string(), FilterType::Lt));
    }

    #[test]
    fn no_delimiter_uses_default() {
        assert_eq!(definer().define("name"), ("name".to_string(), FilterType::Eq));
    }

    #[test]
    fn unknown_suffix_keeps_whole_name() {
        assert_eq!(
            definer().define("name__asdf"),
            ("name__asdf".to_string(), FilterType::Eq)
        );
    }

    #[test]
    fn rightmost_delimiter_wins() {
        let suffixes: IndexMap<_, _> = [("eq".to_string(), FilterType::Eq)].into_iter().collect();

        let d = FilterTypeDefiner::new("__", FilterType::Eq, suffixes.clone()).unwrap();
        assert_eq!(d.define("name__eq").0, "name");
        assert_eq!(d.define("name___eq").0, "name_");
        assert_eq!(d.define("a__b__eq").0, "a__b");

        let d = FilterTypeDefiner::new("___", FilterType::Eq, suffixes).unwrap();
        assert_eq!(d.define("name___eq").0, "name");
    }
}
