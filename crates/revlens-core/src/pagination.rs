//! Page/limit normalisation for review listings.
//!
//! Invalid values reset to defaults rather than clamping to the nearest bound:
//! `limit=200` becomes 10, not 100.

use serde::{Deserialize, Serialize};

use crate::{ReviewError, ReviewRecord};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Normalised listing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number, always >= 1. Echoed back as requested.
    pub page: u64,
    /// Rows per page, always in 1..=100.
    pub limit: u32,
    /// Rows to skip: `(page - 1) * limit`, saturating at `u64::MAX`.
    pub offset: u64,
}

impl PageRequest {
    /// Apply the default-on-invalid policy and compute the offset.
    pub fn normalize(page: i64, limit: i64) -> Self {
        let page = if page < 1 { DEFAULT_PAGE } else { page };
        let limit = if !(1..=MAX_LIMIT).contains(&limit) {
            DEFAULT_LIMIT
        } else {
            limit
        };
        let page = page.unsigned_abs();
        let limit = limit as u32;
        Self {
            page,
            limit,
            offset: (page - 1).saturating_mul(u64::from(limit)),
        }
    }

    /// `ceil(total / limit)`; zero when there are no rows.
    pub fn total_pages(&self, total: u64) -> u64 {
        let limit = u64::from(self.limit);
        total.div_ceil(limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::normalize(DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

/// Parse raw query-string values. Missing values take the defaults.
///
/// Non-integer input is a [`ReviewError::Validation`]; range problems are not,
/// they are handled by [`PageRequest::normalize`].
pub fn parse_page_params(
    page: Option<&str>,
    limit: Option<&str>,
) -> Result<(i64, i64), ReviewError> {
    fn parse(raw: Option<&str>, default: i64) -> Result<i64, ReviewError> {
        match raw {
            None => Ok(default),
            Some(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ReviewError::validation("Invalid page or limit parameter")),
        }
    }
    Ok((parse(page, DEFAULT_PAGE)?, parse(limit, DEFAULT_LIMIT)?))
}

/// One page of reviews, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPage {
    pub reviews: Vec<ReviewRecord>,
    pub total: u64,
    pub page: u64,
    pub limit: u32,
    pub total_pages: u64,
}

impl ReviewPage {
    pub fn assemble(request: PageRequest, total: u64, reviews: Vec<ReviewRecord>) -> Self {
        Self {
            reviews,
            total,
            page: request.page,
            limit: request.limit,
            total_pages: request.total_pages(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn triple(p: PageRequest) -> (u64, u32, u64) {
        (p.page, p.limit, p.offset)
    }

    #[test]
    fn page_below_one_clamps_to_one() {
        assert_eq!(triple(PageRequest::normalize(0, 10)), (1, 10, 0));
        assert_eq!(triple(PageRequest::normalize(-5, 10)), (1, 10, 0));
    }

    #[test]
    fn out_of_range_limit_resets_to_default() {
        assert_eq!(triple(PageRequest::normalize(2, 200)), (2, 10, 10));
        assert_eq!(triple(PageRequest::normalize(2, 101)), (2, 10, 10));
        assert_eq!(triple(PageRequest::normalize(1, 0)), (1, 10, 0));
        assert_eq!(triple(PageRequest::normalize(1, -3)), (1, 10, 0));
    }

    #[test]
    fn limit_bounds_are_inclusive() {
        assert_eq!(triple(PageRequest::normalize(1, 1)), (1, 1, 0));
        assert_eq!(triple(PageRequest::normalize(3, 100)), (3, 100, 200));
    }

    #[test]
    fn offset_from_page_and_limit() {
        assert_eq!(triple(PageRequest::normalize(3, 5)), (3, 5, 10));
    }

    #[test]
    fn huge_page_is_kept_and_offset_saturates() {
        let p = PageRequest::normalize(5_000_000_000, 10);
        assert_eq!(p.page, 5_000_000_000);
        assert_eq!(p.offset, 49_999_999_990);

        let p = PageRequest::normalize(i64::MAX, 100);
        assert_eq!(p.page, i64::MAX as u64);
        assert_eq!(p.offset, u64::MAX);
    }

    #[test]
    fn total_pages_rounds_up() {
        let p = PageRequest::normalize(3, 5);
        assert_eq!(p.total_pages(12), 3);
        assert_eq!(p.total_pages(10), 2);
        assert_eq!(p.total_pages(1), 1);
        assert_eq!(p.total_pages(0), 0);
    }

    #[test]
    fn parse_defaults_when_missing() {
        assert_eq!(parse_page_params(None, None).unwrap(), (1, 10));
        assert_eq!(parse_page_params(Some("4"), None).unwrap(), (4, 10));
    }

    #[test]
    fn parse_accepts_padded_and_negative() {
        assert_eq!(parse_page_params(Some(" 2 "), Some("-1")).unwrap(), (2, -1));
    }

    #[test]
    fn parse_rejects_non_numeric() {
        for (page, limit) in [(Some("abc"), None), (None, Some("1.5")), (Some(""), Some("10"))] {
            let err = parse_page_params(page, limit).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
            assert_eq!(err.to_string(), "Invalid page or limit parameter");
        }
    }

    #[test]
    fn assemble_reports_request_window() {
        let req = PageRequest::normalize(2, 5);
        let page = ReviewPage::assemble(req, 12, Vec::new());
        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 5);
        assert_eq!(page.total, 12);
        assert_eq!(page.total_pages, 3);
    }
}
