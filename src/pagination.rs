use serde::Serialize;

pub const JOBS_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Slices `items` to the requested 1-based page.
///
/// The page is clamped below at 1 and above at `total_pages` when there is at
/// least one page. An empty input reports page 1 of 0.
pub fn paginate<T>(items: Vec<T>, requested_page: i64, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size) as i64;

    let mut current_page = requested_page.max(1);
    if total_pages == 0 {
        current_page = 1;
    } else if current_page > total_pages {
        current_page = total_pages;
    }

    let start = (current_page as usize - 1).saturating_mul(page_size);
    let items = items.into_iter().skip(start).take(page_size).collect();

    Page {
        items,
        current_page,
        total_pages,
        total_items,
        page_size,
    }
}
