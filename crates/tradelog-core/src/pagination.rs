//! Pagination engine.
//!
//! Computes page boundaries from a filtered total and clamps the requested
//! page into range. An empty result is a valid single empty page, never an
//! error.

use crate::page::PageState;
use serde::Serialize;

/// Boundaries of the effective page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    /// Index of the first row on the page (inclusive).
    pub start_index: usize,
    /// Index one past the last row on the page (exclusive).
    pub end_index: usize,
    /// Number of pages, at least 1.
    pub page_count: usize,
    /// Requested page clamped into `1..=page_count`.
    pub effective_page: usize,
    /// Total rows after filtering.
    pub total_count: usize,
}

/// Compute the window for `page_state` over `total_count` rows.
pub fn paginate(total_count: usize, page_state: &PageState) -> PageWindow {
    let size = page_state.size().get();
    let page_count = total_count.div_ceil(size).max(1);
    let effective_page = page_state.page().clamp(1, page_count);
    let start_index = (effective_page - 1) * size;
    let end_index = (start_index + size).min(total_count);

    PageWindow {
        // start never exceeds total: the last page starts inside the set.
        start_index: start_index.min(total_count),
        end_index,
        page_count,
        effective_page,
        total_count,
    }
}

impl PageWindow {
    /// True when the requested page had to be moved into range.
    pub fn was_clamped(&self, requested: &PageState) -> bool {
        requested.page() != self.effective_page
    }

    /// The page state the caller should adopt after pagination.
    pub fn clamped(&self, requested: &PageState) -> PageState {
        requested.with_page(self.effective_page)
    }

    pub fn has_next(&self) -> bool {
        self.effective_page < self.page_count
    }

    pub fn has_prev(&self) -> bool {
        self.effective_page > 1
    }

    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The rows of `items` on this page. `items` is the full filtered list.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end_index.min(items.len());
        let start = self.start_index.min(end);
        &items[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageSize;
    use proptest::prelude::*;

    #[test]
    fn test_empty_set_single_empty_page() {
        let window = paginate(0, &PageState::new(5, PageSize::TwentyFive));
        assert_eq!(window.page_count, 1);
        assert_eq!(window.effective_page, 1);
        assert_eq!(window.start_index, 0);
        assert_eq!(window.end_index, 0);
        assert!(window.is_empty());
        assert!(!window.has_next());
        assert!(!window.has_prev());
    }

    #[test]
    fn test_partial_last_page() {
        let window = paginate(145, &PageState::new(6, PageSize::TwentyFive));
        assert_eq!(window.page_count, 6);
        assert_eq!(window.start_index, 125);
        assert_eq!(window.end_index, 145);
        assert_eq!(window.len(), 20);
        assert!(window.has_prev());
        assert!(!window.has_next());
    }

    #[test]
    fn test_clamp_reported_to_caller() {
        let requested = PageState::new(9, PageSize::Ten);
        let window = paginate(31, &requested);
        assert_eq!(window.effective_page, 4);
        assert!(window.was_clamped(&requested));
        assert_eq!(window.clamped(&requested), PageState::new(4, PageSize::Ten));
        assert_eq!((window.start_index, window.end_index), (30, 31));
    }

    #[test]
    fn test_slice() {
        let items: Vec<u32> = (0..23).collect();
        let window = paginate(items.len(), &PageState::new(3, PageSize::Ten));
        assert_eq!(window.slice(&items), &[20, 21, 22]);
    }

    proptest! {
        #[test]
        fn prop_window_bounds(total in 0usize..10_000, page in 0usize..2_000, size_idx in 0usize..4) {
            let state = PageState::new(page, PageSize::ALL[size_idx]);
            let w = paginate(total, &state);
            prop_assert!(w.effective_page >= 1);
            prop_assert!(w.effective_page <= w.page_count);
            prop_assert!(w.start_index <= w.end_index);
            prop_assert!(w.end_index <= total);
            prop_assert!(w.len() <= state.size().get());
        }
    }
}
