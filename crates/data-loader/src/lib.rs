//! # Data Loader Crate
//!
//! Loads the item catalog, the historical rating corpus and the external id
//! mapping that the session recommender reads at startup.
//!
//! ## Main Components
//!
//! - **types**: Domain types (CatalogItem, RatingRow, RatingRecord, Catalog, RatingCorpus)
//! - **parser**: Parse the CSV files into Rust structs
//! - **index**: Load a data directory, compute item statistics, validate
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{DataIndex, Genre};
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("data"))?;
//!
//! let comedies: Vec<_> = index.catalog.items_in_genre(Genre::Comedy).collect();
//! println!("{} comedies, {} ratings", comedies.len(), index.ratings.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::{CATALOG_FILE, LINKS_FILE, RATINGS_FILE};
pub use types::{
    // Type aliases
    UserId,
    ItemId,
    // Rating scale
    MIN_RATING,
    MAX_RATING,
    // Core types
    Catalog,
    CatalogItem,
    DataIndex,
    ExternalLinks,
    Genre,
    ItemStats,
    RatingCorpus,
    RatingRecord,
    RatingRow,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn comedy(id: ItemId) -> CatalogItem {
        CatalogItem {
            id,
            title: format!("Comedy {} (1999)", id),
            year: Some(1999),
            genres: vec![Genre::Comedy],
            stats: None,
        }
    }

    #[test]
    fn test_data_index_creation() {
        let index = DataIndex::default();
        let (items, rows, users) = index.counts();

        assert_eq!(items, 0);
        assert_eq!(rows, 0);
        assert_eq!(users, 0);
    }

    #[test]
    fn test_insert_item() {
        let mut catalog = Catalog::new();
        catalog.insert(comedy(1)).unwrap();

        let retrieved = catalog.get(1).unwrap();
        assert_eq!(retrieved, &comedy(1));
        assert_eq!(retrieved.year, Some(1999));
        assert_eq!(catalog.position(1), Some(0));
        assert_ne!(catalog.items(), &[comedy(2)][..]);
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let mut catalog = Catalog::new();
        catalog.insert(comedy(7)).unwrap();

        let err = catalog.insert(comedy(7)).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateItem { id: 7 }));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_genre_tokens() {
        assert_eq!("Sci-Fi".parse::<Genre>().unwrap(), Genre::SciFi);
        assert_eq!("Children's".parse::<Genre>().unwrap(), Genre::Children);
        assert_eq!(Genre::FilmNoir.to_string(), "Film-Noir");
        assert!("-".parse::<Genre>().is_err());
        for genre in Genre::ALL {
            assert_eq!(genre.as_str().parse::<Genre>().unwrap(), genre);
        }
    }

    #[test]
    fn test_rating_row_completeness() {
        let full = RatingRow {
            user_id: Some(1),
            item_id: Some(2),
            rating: Some(4.0),
        };
        assert_eq!(
            full.complete(),
            Some(RatingRecord {
                user_id: 1,
                item_id: 2,
                rating: 4.0
            })
        );
        assert!(RatingRow { rating: None, ..full }.complete().is_none());
        assert!(RatingRow::default().complete().is_none());
    }

    #[test]
    fn test_corpus_queries() {
        let corpus = RatingCorpus::from_rows(vec![
            RatingRow {
                user_id: Some(1),
                item_id: Some(1),
                rating: Some(4.0),
            },
            RatingRow {
                user_id: Some(2),
                item_id: Some(1),
                rating: Some(2.0),
            },
            RatingRow {
                user_id: Some(3),
                item_id: None,
                rating: Some(5.0),
            },
        ]);

        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.records().count(), 2);
        assert!(corpus.contains_user(3));
        assert!(!corpus.contains_user(4));
        assert_eq!(corpus.global_mean(), Some(3.0));
        assert_eq!(RatingCorpus::default().global_mean(), None);
    }

    #[test]
    fn test_empty_queries() {
        let catalog = Catalog::new();

        assert!(catalog.get(999).is_none());
        assert_eq!(catalog.items_in_genre(Genre::Action).count(), 0);
        assert!(ExternalLinks::new().imdb_url(999).is_none());
    }
}
