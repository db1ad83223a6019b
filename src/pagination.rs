use serde::{Deserialize, Serialize};

use crate::validation::FieldErrors;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// A 1-based page request. Pages past the end are valid and empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

impl PageRequest {
    pub fn new(page: i64, page_size: usize) -> Self {
        let page_size = match page_size {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        Self { page, page_size }
    }

    pub fn from_params(params: &PageParams) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let page = match params.page.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => 1,
            Some(raw) => raw.parse::<i64>().unwrap_or_else(|_| {
                errors.add("page", "must be a valid integer");
                1
            }),
        };

        let page_size = match params.page_size.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => DEFAULT_PAGE_SIZE,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) => usize::try_from(n).unwrap_or(0),
                Err(_) => {
                    errors.add("page_size", "must be a valid integer");
                    DEFAULT_PAGE_SIZE
                },
            },
        };

        errors.into_result(Self::new(page, page_size))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub results: Vec<T>,
}

/// Slices `items` to the requested page. `count` is always the full length.
pub fn paginate<T>(items: Vec<T>, req: PageRequest) -> Page<T> {
    let count = items.len();
    let start = usize::try_from(req.page.saturating_sub(1))
        .ok()
        .filter(|_| req.page >= 1)
        .and_then(|p| p.checked_mul(req.page_size));

    let results = match start {
        Some(start) if start < count => items.into_iter().skip(start).take(req.page_size).collect(),
        _ => Vec::new(),
    };

    Page { count, results }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<usize> {
        (1..=n).collect()
    }

    #[test]
    fn last_partial_page() {
        let page = paginate(items(25), PageRequest::new(3, 10));
        assert_eq!(page.count, 25);
        assert_eq!(page.results, vec![21, 22, 23, 24, 25]);
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        for p in [10, 0, -2, i64::MAX] {
            let page = paginate(items(25), PageRequest::new(p, 10));
            assert_eq!(page.count, 25);
            assert!(page.results.is_empty(), "page {p}");
        }
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(PageRequest::new(1, 500).page_size, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(1, 0).page_size, DEFAULT_PAGE_SIZE);

        let page = paginate(items(250), PageRequest::new(1, 1000));
        assert_eq!(page.results.len(), 100);
        assert_eq!(page.count, 250);
    }

    #[test]
    fn params_defaults_and_errors() {
        let req = PageRequest::from_params(&PageParams::default()).unwrap();
        assert_eq!(req, PageRequest::default());

        let req = PageRequest::from_params(&PageParams {
            page: Some("2".into()),
            page_size: Some("-5".into()),
        })
        .unwrap();
        assert_eq!(req, PageRequest::new(2, DEFAULT_PAGE_SIZE));

        let errors = PageRequest::from_params(&PageParams {
            page: Some("last".into()),
            page_size: Some("ten".into()),
        })
        .unwrap_err();
        assert!(errors.contains("page"));
        assert!(errors.contains("page_size"));
    }
}
