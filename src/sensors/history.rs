use crate::db::models::SensorReading;

/// Rows shown per history page.
pub const HISTORY_PAGE_SIZE: i64 = 50;

/// Which slice of the reading log a history request maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number actually served.
    pub number: i64,
    pub num_pages: i64,
    pub page_size: i64,
    pub total: i64,
}

impl PageWindow {
    /// Resolve a raw `?page=` value against `total` rows.
    ///
    /// Missing or non-integer input serves page 1. Integers below 1 or past
    /// the end serve the last page. An empty log still has one empty page.
    pub fn resolve(requested: Option<&str>, total: i64, page_size: i64) -> Self {
        let page_size = page_size.max(1);
        let total = total.max(0);
        let num_pages = if total == 0 {
            1
        } else {
            (total + page_size - 1) / page_size
        };

        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if (1..=num_pages).contains(&n) => n,
            Some(Ok(_)) => num_pages,
            Some(Err(_)) | None => 1,
        };

        Self {
            number,
            num_pages,
            page_size,
            total,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.page_size
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub window: PageWindow,
    pub readings: Vec<SensorReading>,
}
