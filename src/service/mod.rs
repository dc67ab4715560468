//! Validation, filtering and paging shared by the repositories.

mod filters;
mod paging;
mod validation;
pub use filters::{resolve_sort, validate_filters, Filters, SortDirection, SortOrder, MAX_PAGE, MAX_PAGE_SIZE};
pub use paging::{calculate_metadata, Metadata};
pub use validation::{permitted_value, ValidationErrors, Validator};
