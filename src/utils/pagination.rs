use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// `?page=&limit=` query parameters shared by every list endpoint.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(params: PageParams, total_items: i64) -> Self {
        let page = params.page();
        let limit = params.limit();
        let total_pages = (total_items + limit - 1) / limit;
        Self {
            current_page: page,
            total_pages,
            total_items,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: i64, limit: i64) -> PageParams {
        PageParams {
            page: Some(page),
            limit: Some(limit),
        }
    }

    #[test]
    fn defaults_and_clamping() {
        let p = PageParams::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(p.offset(), 0);

        let p = params(0, 1000);
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn offset_math() {
        assert_eq!(params(3, 10).offset(), 20);
        assert_eq!(params(1, 25).offset(), 0);
    }

    #[test]
    fn page_counts() {
        let p = Pagination::new(params(2, 10), 35);
        assert_eq!(p.total_pages, 4);
        assert!(p.has_next_page);
        assert!(p.has_prev_page);

        let p = Pagination::new(params(1, 10), 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next_page);
        assert!(!p.has_prev_page);
    }
}
