use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_LIMIT }
    }
}

impl PageRequest {
    /// Missing or zero values fall back to the defaults, the rest is clamped:
    /// `page >= 1`, `1 <= limit <= 50`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = match page {
            None | Some(0) => 1,
            Some(p) => p.max(1) as u64,
        };
        let limit = match limit {
            None | Some(0) => DEFAULT_LIMIT,
            Some(l) => (l.max(1) as u64).min(MAX_LIMIT),
        };
        Self { page, limit }
    }

    /// Raw query-string values. Reads the leading integer of each value, so `2.5` is page 2 and
    /// `10abc` is limit 10. Anything without one falls back to the default.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        Self::new(page.and_then(leading_int), limit.and_then(leading_int))
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

fn leading_int(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // too many digits saturates rather than failing
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_events: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_and_clamping() {
        assert_eq!(PageRequest::from_query(None, None), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::from_query(Some("abc"), Some("")), PageRequest::default());
        assert_eq!(PageRequest::new(Some(-3), Some(500)), PageRequest { page: 1, limit: 50 });
        assert_eq!(PageRequest::new(Some(2), Some(-1)), PageRequest { page: 2, limit: 1 });
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 10 });
    }

    #[test]
    fn query_values_use_their_leading_integer() {
        assert_eq!(PageRequest::from_query(Some("2.5"), Some("10abc")), PageRequest { page: 2, limit: 10 });
        assert_eq!(PageRequest::from_query(Some(" 3"), Some("+7")), PageRequest { page: 3, limit: 7 });
        assert_eq!(PageRequest::from_query(Some("-4"), Some("x10")), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::from_query(Some("-"), Some("99999999999999999999")), PageRequest { page: 1, limit: 50 });
    }

    #[test]
    fn twenty_three_records_make_three_pages() {
        let req = PageRequest::new(Some(4), Some(10));
        assert_eq!(req.total_pages(23), 3);
        assert_eq!(req.skip(), 30);
        assert_eq!(req.total_pages(0), 0);
    }

    proptest! {
        #[test]
        fn pages_cover_every_record_exactly_once(total in 0u64..2_000, limit in -5i64..80) {
            let req = PageRequest::new(Some(1), Some(limit));
            prop_assert!((1..=MAX_LIMIT).contains(&req.limit));

            let pages = req.total_pages(total);
            prop_assert!(pages * req.limit >= total);
            if pages > 0 {
                prop_assert!((pages - 1) * req.limit < total);
            }
        }

        #[test]
        fn skip_is_zero_on_first_page(limit in any::<i64>()) {
            let req = PageRequest::new(None, Some(limit));
            prop_assert_eq!(req.skip(), 0);
        }
    }
}
