//! Sort values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortByOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortByOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortByOrder::Asc => f.write_str("asc"),
            SortByOrder::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortByOrder {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortByOrder::Asc),
            "desc" => Ok(SortByOrder::Desc),
            other => Err(InputError::Invalid {
                param: "sort_by_order".to_string(),
                reason: format!("expected `asc` or `desc`, got `{other}`"),
            }),
        }
    }
}

/// Column to order by, if any, and direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_by_order: SortByOrder,
}

impl Sort {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            sort_by: Some(column.into()),
            sort_by_order: SortByOrder::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            sort_by: Some(column.into()),
            sort_by_order: SortByOrder::Desc,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unsorted_ascending() {
        let sort = Sort::default();
        assert_eq!(sort.sort_by, None);
        assert_eq!(sort.sort_by_order, SortByOrder::Asc);
    }

    #[test]
    fn parse_order() {
        assert_eq!("desc".parse::<SortByOrder>().unwrap(), SortByOrder::Desc);
        assert!(matches!(
            "down".parse::<SortByOrder>(),
            Err(InputError::Invalid { param, .. }) if param == "sort_by_order"
        ));
    }

    #[test]
    fn deserialize() {
        let sort: Sort = serde_json::from_str(r#"{"sort_by": "id", "sort_by_order": "desc"}"#).unwrap();
        assert_eq!(sort, Sort::desc("id"));

        let sort: Sort = serde_json::from_str("{}").unwrap();
        assert_eq!(sort, Sort::default());
    }
}
