/// Pagination block computed from a total row count and the requested window.
pub struct PageWindow {
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

pub fn page_window(total: i64, page: u32, limit: u32) -> PageWindow {
    let total = total.max(0) as u64;
    let limit = limit.max(1) as u64;

    let total_pages = total.div_ceil(limit) as u32;

    PageWindow {
        total_pages,
        has_next_page: page < total_pages,
        has_prev_page: page > 1,
    }
}

pub fn offset(page: u32, limit: u32) -> i64 {
    (page.max(1) as i64 - 1) * limit as i64
}

/// Percentage of `recent` against `total`, rounded to one decimal.
pub fn growth_rate(recent: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }

    let rate = recent as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::{growth_rate, offset, page_window};

    #[test]
    fn test_window_math() {
        let window = page_window(41, 1, 20);
        assert_eq!(window.total_pages, 3);
        assert!(window.has_next_page);
        assert!(!window.has_prev_page);

        let window = page_window(40, 2, 20);
        assert_eq!(window.total_pages, 2);
        assert!(!window.has_next_page);
        assert!(window.has_prev_page);
    }

    #[test]
    fn test_empty_window() {
        let window = page_window(0, 1, 20);
        assert_eq!(window.total_pages, 0);
        assert!(!window.has_next_page);
        assert!(!window.has_prev_page);
    }

    #[test]
    fn test_offset() {
        assert_eq!(offset(1, 20), 0);
        assert_eq!(offset(3, 20), 40);
        assert_eq!(offset(0, 20), 0);
    }

    #[test]
    fn test_growth_rate() {
        assert_eq!(growth_rate(1, 3), 33.3);
        assert_eq!(growth_rate(0, 10), 0.0);
        assert_eq!(growth_rate(5, 0), 0.0);
    }
}
