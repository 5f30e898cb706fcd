//! List views derived from the catalog store.
//!
//! Every view is recomputed from `(&CatalogStore, &ViewQuery)` on each call;
//! nothing is cached. [`ViewQuery`] carries the per-view UI state: the
//! search term, the page size derived from the viewport width, and one page
//! cursor per genre group.

pub mod collate;
pub mod grouping;
pub mod pagination;
pub mod search;

pub use collate::compare_titles;
pub use grouping::{group_by_genre, GenreGroup};
pub use pagination::{items_per_page, PageWindow};

use crate::store::CatalogStore;
use shared::AnimeRecord;
use std::collections::HashMap;
use tracing::debug;

/// Default viewport width when none is known
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1300;

/// Search term, page size and per-genre page cursors
#[derive(Debug, Clone, PartialEq)]
pub struct ViewQuery {
    search_term: String,
    page_by_group: HashMap<String, usize>,
    page_size: usize,
    /// Catalog version the cursors belong to
    catalog_version: u64,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_WIDTH)
    }
}

impl ViewQuery {
    pub fn new(viewport_width: u32) -> Self {
        Self {
            search_term: String::new(),
            page_by_group: HashMap::new(),
            page_size: items_per_page(viewport_width),
            catalog_version: 0,
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Recompute the page size; a change resets every cursor
    ///
    /// Returns true if the page size changed.
    pub fn set_viewport_width(&mut self, viewport_width: u32) -> bool {
        let page_size = items_per_page(viewport_width);
        if page_size == self.page_size {
            return false;
        }
        debug!(
            from = self.page_size,
            to = page_size,
            "Page size changed, resetting cursors"
        );
        self.page_size = page_size;
        self.reset_pages();
        true
    }

    /// Follow the store's catalog version; a change resets every cursor
    pub fn sync_catalog(&mut self, version: u64) -> bool {
        if version == self.catalog_version {
            return false;
        }
        self.catalog_version = version;
        self.reset_pages();
        true
    }

    pub fn catalog_version(&self) -> u64 {
        self.catalog_version
    }

    pub fn reset_pages(&mut self) {
        self.page_by_group.clear();
    }

    /// Requested page of a group; unclamped
    pub fn page(&self, group_key: &str) -> usize {
        self.page_by_group.get(group_key).copied().unwrap_or(0)
    }

    pub fn set_page(&mut self, group_key: &str, page: usize) {
        self.page_by_group.insert(group_key.to_string(), page);
    }

    /// Advance a group's cursor if its window has a next page
    pub fn next_page(&mut self, group_key: &str, window: &PageWindow) -> bool {
        if !window.has_next() {
            return false;
        }
        self.set_page(group_key, window.index + 1);
        true
    }

    /// Move a group's cursor back if its window has a previous page
    pub fn previous_page(&mut self, group_key: &str, window: &PageWindow) -> bool {
        if !window.has_previous() {
            return false;
        }
        self.set_page(group_key, window.index - 1);
        true
    }
}

/// One genre group with its visible page
#[derive(Debug, Clone, PartialEq)]
pub struct GenrePage<'a> {
    pub key: String,
    pub label: String,
    /// Records on the current page
    pub items: Vec<&'a AnimeRecord>,
    pub window: PageWindow,
}

/// Search-filtered records in store order
pub fn catalog_view<'a>(store: &'a CatalogStore, query: &ViewQuery) -> Vec<&'a AnimeRecord> {
    search::filter(store.records(), query.search_term())
}

/// Search-filtered records sorted by title
pub fn alphabetical_view<'a>(store: &'a CatalogStore, query: &ViewQuery) -> Vec<&'a AnimeRecord> {
    let mut records = catalog_view(store, query);
    records.sort_by(|a, b| compare_titles(&a.title, &b.title));
    records
}

/// Search-filtered records grouped by primary genre, one page each
///
/// Cursors recorded against another catalog version count as page 0.
pub fn genre_view<'a>(store: &'a CatalogStore, query: &ViewQuery) -> Vec<GenrePage<'a>> {
    let current = query.catalog_version() == store.version();

    group_by_genre(catalog_view(store, query))
        .into_iter()
        .map(|group| {
            let requested = if current { query.page(&group.key) } else { 0 };
            let window = PageWindow::new(group.items.len(), query.page_size(), requested);
            GenrePage {
                items: window.slice(&group.items).to_vec(),
                key: group.key,
                label: group.label,
                window,
            }
        })
        .collect()
}

/// Search-filtered favorites in store order
pub fn favorites_view<'a>(store: &'a CatalogStore, query: &ViewQuery) -> Vec<&'a AnimeRecord> {
    search::filter(
        store
            .records()
            .iter()
            .filter(|record| store.is_favorite(&record.id)),
        query.search_term(),
    )
}

/// Search-filtered records in the order the gateway returned them
pub fn recent_view<'a>(store: &'a CatalogStore, query: &ViewQuery) -> Vec<&'a AnimeRecord> {
    catalog_view(store, query)
}

/// All records by global rating, best first; unrated counts as 0
pub fn top_view(store: &CatalogStore) -> Vec<&AnimeRecord> {
    let mut records: Vec<_> = store.records().iter().collect();
    records.sort_by(|a, b| {
        let a_rating = a.global_rating.unwrap_or(0.0);
        let b_rating = b.global_rating.unwrap_or(0.0);
        b_rating
            .total_cmp(&a_rating)
            .then_with(|| compare_titles(&a.title, &b.title))
    });
    records
}
