//! First stage: narrow the catalog to one genre.

use data_loader::{Catalog, CatalogItem, Genre, ItemId};
use tracing::debug;

/// Selects catalog items whose genre set contains the requested genre.
///
/// Output preserves catalog order, which the sampler relies on. A genre
/// with no items yields an empty vec.
pub struct GenreFilter<'a> {
    catalog: &'a Catalog,
}

impl<'a> GenreFilter<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn apply(&self, genre: Genre) -> Vec<&'a CatalogItem> {
        let items: Vec<&CatalogItem> = self.catalog.items_in_genre(genre).collect();
        debug!("GenreFilter({}): {} of {} items", genre, items.len(), self.catalog.len());
        items
    }

    /// Same selection, ids only
    pub fn item_ids(&self, genre: Genre) -> Vec<ItemId> {
        self.catalog.items_in_genre(genre).map(|item| item.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: ItemId, genres: Vec<Genre>) -> CatalogItem {
        CatalogItem {
            id,
            title: format!("Movie {}", id),
            year: None,
            genres,
            stats: None,
        }
    }

    fn create_test_catalog() -> Catalog {
        Catalog::from_items(vec![
            item(30, vec![Genre::Comedy, Genre::Romance]),
            item(10, vec![Genre::Drama]),
            item(20, vec![Genre::Comedy]),
            item(40, vec![Genre::Horror, Genre::Comedy]),
        ])
        .unwrap()
    }

    #[test]
    fn test_genre_filter_preserves_catalog_order() {
        let catalog = create_test_catalog();
        let filter = GenreFilter::new(&catalog);

        let ids: Vec<ItemId> = filter.apply(Genre::Comedy).iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![30, 20, 40]);
        assert_eq!(filter.item_ids(Genre::Comedy), ids);
    }

    #[test]
    fn test_genre_filter_no_matches() {
        let catalog = create_test_catalog();
        let filter = GenreFilter::new(&catalog);

        assert!(filter.apply(Genre::Western).is_empty());
    }
}
