//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 20;

/// Maximum page size for list endpoints.
pub const MAX_LIMIT: i64 = 100;

/// Generic 1-based pagination parameters (`?page=&limit=`).
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// The requested page, clamped to at least 1.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// The requested page size, defaulting to 20 and capped at 100.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Row offset for the requested page.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), DEFAULT_LIMIT);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn limit_is_capped() {
        let params = PageParams {
            page: Some(3),
            limit: Some(1000),
        };
        assert_eq!(params.limit(), MAX_LIMIT);
        assert_eq!(params.offset(), 200);
    }

    #[test]
    fn nonpositive_page_clamps_to_first() {
        let params = PageParams {
            page: Some(0),
            limit: None,
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.offset(), 0);
    }
}
