//! Viewport-driven pagination.

use std::ops::Range;

/// Cards shown per page for a viewport width in pixels
pub fn items_per_page(viewport_width: u32) -> usize {
    match viewport_width {
        0..=599 => 1,
        600..=899 => 2,
        900..=1199 => 3,
        _ => 4,
    }
}

/// Clamped page within a list of items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub index: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_items: usize,
}

impl PageWindow {
    /// A page size of 0 is treated as 1
    pub fn new(total_items: usize, page_size: usize, requested: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size);
        let index = requested.min(total_pages.saturating_sub(1));
        Self {
            index,
            total_pages,
            page_size,
            total_items,
        }
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Item range of this page
    pub fn range(&self) -> Range<usize> {
        let start = (self.index * self.page_size).min(self.total_items);
        let end = (start + self.page_size).min(self.total_items);
        start..end
    }

    pub fn slice<'s, T>(&self, items: &'s [T]) -> &'s [T] {
        let range = self.range();
        &items[range.start.min(items.len())..range.end.min(items.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_items_per_page_breakpoints() {
        assert_eq!(items_per_page(320), 1);
        assert_eq!(items_per_page(599), 1);
        assert_eq!(items_per_page(600), 2);
        assert_eq!(items_per_page(899), 2);
        assert_eq!(items_per_page(900), 3);
        assert_eq!(items_per_page(1199), 3);
        assert_eq!(items_per_page(1200), 4);
        assert_eq!(items_per_page(1920), 4);
    }

    #[test]
    fn test_window_navigation() {
        let window = PageWindow::new(5, 2, 0);
        assert_eq!(window.total_pages, 3);
        assert!(window.has_next());
        assert!(!window.has_previous());
        assert_eq!(window.range(), 0..2);

        let last = PageWindow::new(5, 2, 2);
        assert!(!last.has_next());
        assert!(last.has_previous());
        assert_eq!(last.range(), 4..5);
    }

    #[test]
    fn test_requested_page_is_clamped() {
        let window = PageWindow::new(5, 2, 99);
        assert_eq!(window.index, 2);
    }

    #[test]
    fn test_empty_list() {
        let window = PageWindow::new(0, 4, 3);
        assert_eq!(window.index, 0);
        assert_eq!(window.total_pages, 0);
        assert!(!window.has_next());
        assert!(!window.has_previous());
        assert!(window.range().is_empty());
    }

    #[test]
    fn test_zero_page_size() {
        let window = PageWindow::new(3, 0, 1);
        assert_eq!(window.page_size, 1);
        assert_eq!(window.total_pages, 3);
        assert_eq!(window.slice(&[10, 20, 30]), &[20]);
    }

    proptest! {
        #[test]
        fn prop_page_in_bounds(total in 0usize..200, size in 0usize..10, requested in 0usize..500) {
            let window = PageWindow::new(total, size, requested);
            prop_assert!(window.index < window.total_pages.max(1));
            prop_assert!(window.range().end <= total);
            prop_assert!(window.range().len() <= window.page_size);
        }
    }
}
