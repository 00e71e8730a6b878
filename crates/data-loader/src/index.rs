//! Loading the data directory and deriving catalog statistics.
//!
//! - Parse the three CSV files (catalog and ratings in parallel)
//! - Compute per-item rating statistics from the corpus
//! - Re-rank the catalog when the file order cannot be trusted
//! - Validate the rating domain

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Catalog file, pre-sorted by descending rating
pub const CATALOG_FILE: &str = "movies_by_rating.csv";
/// Historical rating table
pub const RATINGS_FILE: &str = "user_movie_ratings.csv";
/// Item id -> external ids
pub const LINKS_FILE: &str = "links.csv";

impl DataIndex {
    /// Load the catalog, ratings and links from a directory
    ///
    /// Steps:
    /// 1. Parse catalog and ratings in parallel
    /// 2. Parse links (optional; a missing file only costs poster/IMDb metadata)
    /// 3. Build the catalog in file order
    /// 4. Validate the rating corpus
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading data from {:?}", data_dir);

        let catalog_path = data_dir.join(CATALOG_FILE);
        let ratings_path = data_dir.join(RATINGS_FILE);
        let links_path = data_dir.join(LINKS_FILE);

        let (items, rows) = rayon::join(
            || parser::parse_catalog(&catalog_path),
            || parser::parse_ratings(&ratings_path),
        );
        let items = items?;
        let rows = rows?;

        let links = if links_path.exists() {
            parser::parse_links(&links_path)?
        } else {
            warn!("No {} in {:?}; external links disabled", LINKS_FILE, data_dir);
            ExternalLinks::new()
        };

        let catalog = Catalog::from_items(items)?;
        let ratings = RatingCorpus::from_rows(rows);
        let index = DataIndex::new(catalog, ratings, links);
        index.validate()?;

        let (items, rows, users) = index.counts();
        info!(
            "Loaded {} items, {} rating rows from {} users, {} external links",
            items,
            rows,
            users,
            index.links.len()
        );
        Ok(index)
    }

    /// Validate data integrity
    ///
    /// Complete rating rows must lie on the 1-5 scale. Ratings for items
    /// outside the catalog are allowed: the catalog may be a curated subset
    /// of what the corpus covers.
    pub fn validate(&self) -> Result<()> {
        for record in self.ratings.records() {
            if !(MIN_RATING..=MAX_RATING).contains(&record.rating) {
                return Err(DataLoadError::InvalidValue {
                    field: "rating".to_string(),
                    value: record.rating.to_string(),
                });
            }
        }
        let incomplete = self.ratings.len() - self.ratings.records().count();
        if incomplete > 0 {
            warn!("{} rating rows are incomplete and will be ignored", incomplete);
        }
        Ok(())
    }
}

impl Catalog {
    /// Compute rating statistics for every catalog item from the corpus.
    ///
    /// Items nobody rated keep `stats = None`.
    pub fn compute_item_stats(&mut self, ratings: &RatingCorpus) {
        let mut totals: HashMap<ItemId, (f64, u32)> = HashMap::new();
        for record in ratings.records() {
            let entry = totals.entry(record.item_id).or_insert((0.0, 0));
            entry.0 += record.rating as f64;
            entry.1 += 1;
        }

        self.items.par_iter_mut().for_each(|item| {
            item.stats = totals.get(&item.id).map(|&(total, count)| {
                ItemStats::new((total / count as f64) as f32, count)
            });
        });
    }

    /// Reorder items by average rating (desc), then rating count (desc).
    ///
    /// The sort is stable, so ties keep their previous relative order. Items
    /// without statistics go last.
    pub fn sort_by_rating(&mut self) {
        self.items.sort_by(|a, b| match (&a.stats, &b.stats) {
            (Some(sa), Some(sb)) => sb
                .avg_rating
                .total_cmp(&sa.avg_rating)
                .then_with(|| sb.rating_count.cmp(&sa.rating_count)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        self.reindex();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: ItemId, genres: Vec<Genre>) -> CatalogItem {
        CatalogItem {
            id,
            title: format!("Item {} (2000)", id),
            year: Some(2000),
            genres,
            stats: None,
        }
    }

    fn record(user_id: UserId, item_id: ItemId, rating: f32) -> RatingRecord {
        RatingRecord {
            user_id,
            item_id,
            rating,
        }
    }

    #[test]
    fn test_compute_stats_and_sort() {
        let mut catalog = Catalog::from_items(vec![
            item(1, vec![Genre::Comedy]),
            item(2, vec![Genre::Comedy, Genre::Drama]),
            item(3, vec![Genre::Drama]),
            item(4, vec![Genre::Comedy]),
        ])
        .unwrap();
        let ratings = RatingCorpus::from_records(vec![
            record(1, 1, 2.0),
            record(2, 1, 3.0),
            record(1, 2, 5.0),
            record(1, 3, 4.0),
            record(2, 3, 4.0),
        ]);

        catalog.compute_item_stats(&ratings);
        let stats = catalog.get(1).unwrap().stats.unwrap();
        assert_eq!(stats.rating_count, 2);
        assert!((stats.avg_rating - 2.5).abs() < 1e-6);
        assert!(catalog.get(4).unwrap().stats.is_none());

        catalog.sort_by_rating();
        let order: Vec<ItemId> = catalog.items().iter().map(|i| i.id).collect();
        assert_eq!(order, vec![2, 3, 1, 4]);

        // Genre index follows the new order
        let comedies: Vec<ItemId> = catalog.items_in_genre(Genre::Comedy).map(|i| i.id).collect();
        assert_eq!(comedies, vec![2, 1, 4]);
        assert_eq!(catalog.position(1), Some(2));
    }

    #[test]
    fn test_validate_accepts_corpus_on_scale() {
        let index = DataIndex::new(
            Catalog::new(),
            RatingCorpus::from_records(vec![record(1, 1, 1.0), record(1, 2, 5.0)]),
            ExternalLinks::new(),
        );
        assert!(index.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_off_scale_rating() {
        let index = DataIndex::new(
            Catalog::new(),
            RatingCorpus::from_records(vec![record(1, 1, 0.5)]),
            ExternalLinks::new(),
        );
        assert!(matches!(
            index.validate(),
            Err(DataLoadError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_load_dataset() {
        // Requires the real data files; skipped when they are absent
        let data_dir = Path::new("../../data");

        if data_dir.join(CATALOG_FILE).exists() {
            let index = DataIndex::load_from_files(data_dir).unwrap();
            let (items, rows, _) = index.counts();
            assert!(items > 0);
            assert!(rows > 0);
        }
    }
}
