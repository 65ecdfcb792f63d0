pub mod bookings;
pub mod payments;
pub mod trips;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

impl Pagination {
    pub fn new(current_page: u64, total_pages: u64, total_items: u64) -> Self {
        Self {
            current_page,
            total_pages,
            total_items,
        }
    }
}

/// Clamp raw query-string paging values to something sane.
pub fn normalize_paging(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).clamp(1, 100);
    (page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_paging_defaults_and_clamps() {
        assert_eq!(normalize_paging(None, None), (1, 10));
        assert_eq!(normalize_paging(Some(0), Some(0)), (1, 1));
        assert_eq!(normalize_paging(Some(3), Some(500)), (3, 100));
    }
}
