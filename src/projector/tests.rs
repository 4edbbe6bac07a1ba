#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::models::{CatalogItem, FavoriteEntry};
    use crate::projector::{
        filter, paginate, project_catalog, project_favorites, total_pages, visible_pages,
        PageMarker::{Ellipsis, Page},
        ViewState,
    };

    fn ship(name: &str, manufacturer: &str) -> CatalogItem {
        CatalogItem {
            name: name.to_string(),
            manufacturer: manufacturer.to_string(),
            url: format!("https://swapi.info/api/starships/{}", name.to_lowercase().replace(' ', "-")),
            ..CatalogItem::default()
        }
    }

    fn fleet(count: usize) -> Vec<CatalogItem> {
        (1..=count)
            .map(|i| ship(&format!("Ship {i}"), "Kuat Drive Yards"))
            .collect()
    }

    #[test]
    fn test_filter_is_case_insensitive_and_order_preserving() {
        let items = vec![
            ship("Death Star", "Imperial Department of Military Research"),
            ship("Millennium Falcon", "Corellian Engineering Corporation"),
        ];

        let hits: Vec<&str> = filter(&items, "falcon").iter().map(|i| i.name.as_str()).collect();
        assert_eq!(hits, vec!["Millennium Falcon"]);
    }

    #[test]
    fn test_filter_matches_manufacturer() {
        let items = vec![
            ship("CR90 corvette", "Corellian Engineering Corporation"),
            ship("Star Destroyer", "Kuat Drive Yards"),
            ship("Millennium Falcon", "Corellian Engineering Corporation"),
        ];

        let hits: Vec<&str> = filter(&items, "CORELLIAN").iter().map(|i| i.name.as_str()).collect();
        assert_eq!(hits, vec!["CR90 corvette", "Millennium Falcon"]);
    }

    #[test]
    fn test_blank_query_passes_everything_through() {
        let items = vec![ship("B", "x"), ship("A", "y")];
        assert_eq!(filter(&items, "").len(), 2);

        let names: Vec<&str> = filter(&items, "   ").iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_paginate_slices() {
        let items: Vec<u32> = (1..=15).collect();
        assert_eq!(paginate(&items, 1, 10).len(), 10);
        assert_eq!(paginate(&items, 2, 10), &[11, 12, 13, 14, 15]);
        assert!(paginate(&items, 3, 10).is_empty());
        assert!(paginate(&items, 0, 10).is_empty());
        assert_eq!(total_pages(15, 10), 2);
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(20, 10), 2);
    }

    #[test]
    fn test_catalog_of_fifteen_has_two_pages() {
        let items = fleet(15);

        let first = project_catalog(&items, "", 1);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next());
        assert!(!first.has_previous());
        assert!(first.show_pagination());

        let second = project_catalog(&items, "", 2);
        assert_eq!(second.items.len(), 5);
        assert_eq!(second.items[0].name, "Ship 11");
        assert!(!second.has_next());
        assert!(second.has_previous());
    }

    #[test]
    fn test_page_beyond_total_is_empty() {
        let items = fleet(15);
        let page = project_catalog(&items, "", 7);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.state, ViewState::NoResults);
    }

    #[test]
    fn test_search_resets_page_count() {
        let mut items = fleet(25);
        items.push(ship("Millennium Falcon", "Corellian Engineering Corporation"));

        let page = project_catalog(&items, "falcon", 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.items.len(), 1);
        assert!(!page.show_pagination());
    }

    #[test]
    fn test_visible_pages_small_totals() {
        for current in 1..=3 {
            assert_eq!(visible_pages(current, 3), vec![Page(1), Page(2), Page(3)]);
        }
        assert_eq!(visible_pages(1, 1), vec![Page(1)]);
        assert!(visible_pages(1, 0).is_empty());
    }

    #[test]
    fn test_visible_pages_windows() {
        assert_eq!(visible_pages(9, 10), vec![Ellipsis, Page(8), Page(9), Page(10)]);
        assert_eq!(visible_pages(10, 10), vec![Ellipsis, Page(8), Page(9), Page(10)]);
        assert_eq!(visible_pages(1, 10), vec![Page(1), Page(2), Page(3), Ellipsis]);
        assert_eq!(visible_pages(2, 10), vec![Page(1), Page(2), Page(3), Ellipsis]);
        assert_eq!(
            visible_pages(5, 10),
            vec![Ellipsis, Page(4), Page(5), Page(6), Ellipsis]
        );
        assert_eq!(visible_pages(3, 4), vec![Ellipsis, Page(2), Page(3), Page(4)]);
    }

    #[test]
    fn test_visible_pages_past_the_end() {
        assert_eq!(visible_pages(usize::MAX, 4), vec![Ellipsis, Page(2), Page(3), Page(4)]);
        assert_eq!(visible_pages(50, 10), vec![Ellipsis, Page(8), Page(9), Page(10)]);
    }

    #[test]
    fn test_page_markers_serialize() {
        let json = serde_json::to_string(&visible_pages(5, 10)).unwrap();
        assert_eq!(json, r#"["...",4,5,6,"..."]"#);
    }

    #[test]
    fn test_empty_favorites_distinct_from_no_results() {
        let empty: Vec<FavoriteEntry> = Vec::new();
        let view = project_favorites(&empty, "");
        assert_eq!(view.state, ViewState::Empty);

        let entries = vec![FavoriteEntry::new(ship("Death Star", "Imperial"))];
        let view = project_favorites(&entries, "falcon");
        assert_eq!(view.state, ViewState::NoResults);
        assert!(view.items.is_empty());

        let view = project_favorites(&entries, "death");
        assert_eq!(view.state, ViewState::Populated);
        assert_eq!(view.items.len(), 1);
    }

    #[test]
    fn test_favorites_view_is_unpaginated() {
        let entries: Vec<FavoriteEntry> = fleet(23).into_iter().map(FavoriteEntry::new).collect();
        let view = project_favorites(&entries, "ship");
        assert_eq!(view.items.len(), 23);
        assert_eq!(view.current_page, None);
        assert!(!view.show_pagination());
        assert!(view.visible_pages().is_empty());
    }
}
