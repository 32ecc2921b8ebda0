pub const MAX_PAGE_SIZE: i64 = 100;

/// Page and limit clamped into their valid ranges; out-of-range values are
/// corrected rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn clamp(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}
