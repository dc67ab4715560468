//! Pagination metadata for list responses.

use serde::Serialize;

/// Page description returned next to a list result. All zero for an empty result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

/// Page and page size are echoed back unclamped; a page past `last_page` is a valid empty page.
pub fn calculate_metadata(total_records: i64, page: i64, page_size: i64) -> Metadata {
    if total_records <= 0 || page_size <= 0 {
        return Metadata::default();
    }
    Metadata {
        page,
        page_size,
        first_page: 1,
        last_page: (total_records + page_size - 1) / page_size,
        total_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_records_is_all_zero() {
        assert_eq!(calculate_metadata(0, 3, 20), Metadata::default());
    }

    #[test]
    fn last_page_is_ceiling() {
        for page_size in 1..=100 {
            for total in [1_i64, 2, 7, 99, 100, 101, 1_000, 12_345] {
                let m = calculate_metadata(total, 1, page_size);
                let expected = total / page_size + i64::from(total % page_size != 0);
                assert_eq!(m.last_page, expected, "total {total} size {page_size}");
                assert_eq!(m.first_page, 1);
                assert_eq!(m.total_records, total);
                assert_ne!(m, Metadata::default());
            }
        }
    }

    #[test]
    fn page_is_not_clamped() {
        let m = calculate_metadata(45, 9, 20);
        assert_eq!(m.page, 9);
        assert_eq!(m.page_size, 20);
        assert_eq!(m.last_page, 3);
    }
}
