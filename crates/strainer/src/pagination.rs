//! Pagination values.

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Largest page size accepted by either pagination style.
pub const MAX_LIMIT: u64 = 1000;

/// Default page size.
pub const DEFAULT_LIMIT: u64 = 100;

/// Anything that resolves to a `LIMIT`/`OFFSET` pair.
pub trait Pagination {
    fn limit(&self) -> u64;

    fn offset(&self) -> u64;

    fn limit_offset(&self) -> (u64, u64) {
        (self.limit(), self.offset())
    }
}

fn check_limit(param: &str, value: u64) -> Result<u64, InputError> {
    if value == 0 || value > MAX_LIMIT {
        return Err(InputError::Constraint {
            param: param.to_string(),
            reason: format!("must be between 1 and {MAX_LIMIT}"),
        });
    }
    Ok(value)
}

// -------------------------------------------------------------------------
// Offset pagination
// -------------------------------------------------------------------------

/// `limit`/`offset` pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOffsetPagination")]
pub struct OffsetPagination {
    limit: u64,
    offset: u64,
}

#[derive(Deserialize)]
struct RawOffsetPagination {
    #[serde(default = "default_limit")]
    limit: u64,
    #[serde(default)]
    offset: u64,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl OffsetPagination {
    /// `limit` must be in `1..=MAX_LIMIT`.
    pub fn new(limit: u64, offset: u64) -> Result<Self, InputError> {
        Ok(Self {
            limit: check_limit("limit", limit)?,
            offset,
        })
    }
}

impl Default for OffsetPagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl TryFrom<RawOffsetPagination> for OffsetPagination {
    type Error = InputError;

    fn try_from(raw: RawOffsetPagination) -> Result<Self, Self::Error> {
        Self::new(raw.limit, raw.offset)
    }
}

impl Pagination for OffsetPagination {
    fn limit(&self) -> u64 {
        self.limit
    }

    fn offset(&self) -> u64 {
        self.offset
    }
}

// -------------------------------------------------------------------------
// Page pagination
// -------------------------------------------------------------------------

/// `page`/`per_page` pagination; pages start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPagePagination")]
pub struct PagePagination {
    page: u64,
    per_page: u64,
}

#[derive(Deserialize)]
struct RawPagePagination {
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_limit")]
    per_page: u64,
}

fn default_page() -> u64 {
    1
}

impl PagePagination {
    pub fn new(page: u64, per_page: u64) -> Result<Self, InputError> {
        if page == 0 {
            return Err(InputError::Constraint {
                param: "page".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            page,
            per_page: check_limit("per_page", per_page)?,
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }
}

impl Default for PagePagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_LIMIT,
        }
    }
}

impl TryFrom<RawPagePagination> for PagePagination {
    type Error = InputError;

    fn try_from(raw: RawPagePagination) -> Result<Self, Self::Error> {
        Self::new(raw.page, raw.per_page)
    }
}

impl Pagination for PagePagination {
    fn limit(&self) -> u64 {
        self.per_page
    }

    fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}
