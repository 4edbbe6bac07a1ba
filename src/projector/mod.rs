//! Search filtering and pagination over catalog items or favorites.
//!
//! Everything here is a pure function of its inputs; callers pass an already
//! sanitized query.

use serde::{Serialize, Serializer};

use crate::config::ITEMS_PER_PAGE;
use crate::models::{CatalogItem, FavoriteEntry};

#[cfg(test)]
mod tests;

/// Fields the search filter matches against.
pub trait Searchable {
    fn display_name(&self) -> &str;
    fn manufacturer(&self) -> &str;
}

impl Searchable for CatalogItem {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn manufacturer(&self) -> &str {
        &self.manufacturer
    }
}

impl Searchable for FavoriteEntry {
    fn display_name(&self) -> &str {
        &self.item.name
    }

    fn manufacturer(&self) -> &str {
        &self.item.manufacturer
    }
}

/// One entry in the page-number strip. Serializes as a number or `"..."`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(usize),
    Ellipsis,
}

impl Serialize for PageMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Page(page) => serializer.serialize_u64(*page as u64),
            Self::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

/// What the consumer should render for a projected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewState {
    /// The source collection itself is empty.
    Empty,
    /// The source has items but none are visible for this query/page.
    NoResults,
    Populated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection<T> {
    pub items: Vec<T>,
    pub total_pages: usize,
    /// `None` for unpaginated views.
    pub current_page: Option<usize>,
    pub state: ViewState,
}

impl<T> Projection<T> {
    pub fn has_previous(&self) -> bool {
        self.current_page.is_some_and(|p| p > 1)
    }

    pub fn has_next(&self) -> bool {
        self.current_page.is_some_and(|p| p < self.total_pages)
    }

    /// Pagination controls only make sense with more than one page.
    pub fn show_pagination(&self) -> bool {
        self.current_page.is_some() && self.total_pages > 1
    }

    pub fn visible_pages(&self) -> Vec<PageMarker> {
        match self.current_page {
            Some(page) => visible_pages(page, self.total_pages),
            None => Vec::new(),
        }
    }
}

/// Keep items whose name or manufacturer contains `query`, ignoring case.
/// A blank query keeps everything.
pub fn filter<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    if query.trim().is_empty() {
        return items.iter().collect();
    }

    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| {
            item.display_name().to_lowercase().contains(&needle)
                || item.manufacturer().to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// 1-indexed page slice. Pages past the end (or page 0) are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Page numbers to show around `current`, with ellipses for elided ranges.
pub fn visible_pages(current: usize, total_pages: usize) -> Vec<PageMarker> {
    if total_pages <= 3 {
        return (1..=total_pages).map(PageMarker::Page).collect();
    }

    let (mut start, mut end) = (current.saturating_sub(1), current.saturating_add(1));
    if current <= 2 {
        start = 1;
        end = 3;
    }
    if current >= total_pages - 1 {
        start = total_pages - 2;
        end = total_pages;
    }

    let mut pages = Vec::with_capacity(end - start + 3);
    if start > 1 {
        pages.push(PageMarker::Ellipsis);
    }
    pages.extend((start..=end).map(PageMarker::Page));
    if end < total_pages {
        pages.push(PageMarker::Ellipsis);
    }
    pages
}

/// Filter then paginate; `page = None` returns the full filtered list.
pub fn project<T: Searchable + Clone>(
    source: &[T],
    query: &str,
    page: Option<usize>,
    page_size: usize,
) -> Projection<T> {
    let filtered = filter(source, query);
    let (visible, total, current_page) = match page {
        Some(page) => (
            paginate(&filtered, page, page_size),
            total_pages(filtered.len(), page_size),
            Some(page),
        ),
        None => (&filtered[..], usize::from(!filtered.is_empty()), None),
    };

    let state = if source.is_empty() {
        ViewState::Empty
    } else if visible.is_empty() {
        ViewState::NoResults
    } else {
        ViewState::Populated
    };

    Projection {
        items: visible.iter().map(|item| (*item).clone()).collect(),
        total_pages: total,
        current_page,
        state,
    }
}

/// Catalog view: paginated at the standard page size.
pub fn project_catalog(items: &[CatalogItem], query: &str, page: usize) -> Projection<CatalogItem> {
    project(items, query, Some(page), ITEMS_PER_PAGE)
}

/// Favorites view: never paginated.
pub fn project_favorites(entries: &[FavoriteEntry], query: &str) -> Projection<FavoriteEntry> {
    project(entries, query, None, ITEMS_PER_PAGE)
}
