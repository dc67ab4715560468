//! Paging and sorting input for list endpoints.
//!
//! The sort token is client input. It only ever reaches SQL after it has been
//! matched literally against a static safelist, and what is substituted is the
//! safelist's own string.

use crate::error::AppError;
use crate::service::validation::{permitted_value, Validator};

pub const MAX_PAGE: i64 = 10_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A sort column proven to come from a safelist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortOrder {
    column: &'static str,
    direction: SortDirection,
}

impl SortOrder {
    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

/// Splits a safelisted token into column and direction. Returns `None` when the
/// raw token (sign included) is not a member of `safelist`.
pub fn resolve_sort(sort: &str, safelist: &'static [&'static str]) -> Option<SortOrder> {
    let entry: &'static str = safelist.iter().copied().find(|s| *s == sort)?;
    Some(match entry.strip_prefix('-') {
        Some(column) => SortOrder {
            column,
            direction: SortDirection::Desc,
        },
        None => SortOrder {
            column: entry,
            direction: SortDirection::Asc,
        },
    })
}

#[derive(Clone, Debug)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    pub sort_safelist: &'static [&'static str],
}

impl Filters {
    pub fn new(page: i64, page_size: i64, sort: impl Into<String>, sort_safelist: &'static [&'static str]) -> Self {
        Filters {
            page,
            page_size,
            sort: sort.into(),
            sort_safelist,
        }
    }

    /// Resolved sort order. Fails with a validation error for tokens outside the safelist.
    pub fn sort_order(&self) -> Result<SortOrder, AppError> {
        resolve_sort(&self.sort, self.sort_safelist).ok_or_else(|| {
            let mut v = Validator::new();
            v.add_error("sort", "invalid sort value");
            AppError::Validation(v.into_errors())
        })
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

pub fn validate_filters(v: &mut Validator, f: &Filters) {
    v.check(f.page > 0, "page", "must be greater than zero");
    v.check(f.page <= MAX_PAGE, "page", "must be a maximum of 10 million");
    v.check(f.page_size > 0, "page_size", "must be greater than zero");
    v.check(f.page_size <= MAX_PAGE_SIZE, "page_size", "must be a maximum of 100");
    v.check(
        permitted_value(f.sort.as_str(), f.sort_safelist),
        "sort",
        "invalid sort value",
    );
}
