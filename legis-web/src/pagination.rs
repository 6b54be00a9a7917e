//! Page arithmetic shared by every list page
//!
//! The `page` query value is taken as text: anything that is not a positive
//! integer shows the first page, numbers past the end show the last page, and
//! an empty result is page 1 of 1.

use serde::Serialize;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Total number of pages, at least 1
    pub total_pages: i64,
    pub per_page: i64,
    pub total: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
}

impl Pagination {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Parse the raw `page` parameter; `None` when it is not an integer
pub fn parse_page(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

/// Calculate pagination metadata from total results and the raw `page` value
///
/// ```
/// use legis_web::pagination::paginate;
///
/// let p = paginate(45, Some("2"), 20);
/// assert_eq!((p.page, p.total_pages, p.offset), (2, 3, 20));
///
/// // Past the end: last page
/// assert_eq!(paginate(45, Some("99"), 20).page, 3);
/// ```
pub fn paginate(total: i64, raw_page: Option<&str>, per_page: i64) -> Pagination {
    let total_pages = ((total + per_page - 1) / per_page).max(1);
    let page = match parse_page(raw_page) {
        Some(n) if n > total_pages => total_pages,
        Some(n) if n >= 1 => n,
        _ => 1,
    };

    Pagination {
        page,
        total_pages,
        per_page,
        total,
        offset: (page - 1) * per_page,
    }
}
