//! Core domain types for the catalog and the rating corpus.
//!
//! Everything here is loaded once at startup and then shared read-only
//! between sessions, so the containers only expose `&self` getters once
//! they are built.

use crate::error::{DataLoadError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Type Aliases
// =============================================================================

/// Identifier of a rater. Historical users and session users share the space.
pub type UserId = u32;

/// Identifier of a catalog item (the `movieId` column).
pub type ItemId = u32;

/// Lowest value on the rating scale.
pub const MIN_RATING: f32 = 1.0;

/// Highest value on the rating scale.
pub const MAX_RATING: f32 = 5.0;

// =============================================================================
// Genre
// =============================================================================

/// The fixed genre vocabulary a session can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Children,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Fantasy,
    FilmNoir,
    Horror,
    Imax,
    Musical,
    Mystery,
    Romance,
    SciFi,
    Thriller,
    War,
    Western,
}

impl Genre {
    /// Every genre, in the order the selection menu lists them.
    pub const ALL: [Genre; 19] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Animation,
        Genre::Children,
        Genre::Comedy,
        Genre::Crime,
        Genre::Documentary,
        Genre::Drama,
        Genre::Fantasy,
        Genre::FilmNoir,
        Genre::Horror,
        Genre::Imax,
        Genre::Musical,
        Genre::Mystery,
        Genre::Romance,
        Genre::SciFi,
        Genre::Thriller,
        Genre::War,
        Genre::Western,
    ];

    /// The token used in the data files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Animation => "Animation",
            Genre::Children => "Children",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Documentary => "Documentary",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::FilmNoir => "Film-Noir",
            Genre::Horror => "Horror",
            Genre::Imax => "IMAX",
            Genre::Musical => "Musical",
            Genre::Mystery => "Mystery",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Thriller => "Thriller",
            Genre::War => "War",
            Genre::Western => "Western",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = DataLoadError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        // Older MovieLens dumps spell it with an apostrophe
        if token == "Children's" {
            return Ok(Genre::Children);
        }
        Genre::ALL
            .iter()
            .copied()
            .find(|genre| genre.as_str() == token)
            .ok_or_else(|| DataLoadError::InvalidValue {
                field: "genre".to_string(),
                value: s.to_string(),
            })
    }
}

// =============================================================================
// Catalog Types
// =============================================================================

/// Aggregate rating statistics for a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemStats {
    pub avg_rating: f32,
    pub rating_count: u32,
    /// `avg_rating * ln(rating_count + 1)`
    pub popularity_score: f32,
}

impl ItemStats {
    pub fn new(avg_rating: f32, rating_count: u32) -> Self {
        Self {
            avg_rating,
            rating_count,
            popularity_score: avg_rating * (rating_count as f32 + 1.0).ln(),
        }
    }
}

/// One row of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
    /// Year extracted from a trailing "(1995)" in the title, if any
    pub year: Option<u16>,
    pub genres: Vec<Genre>,
    /// Missing when the catalog file carries no statistics for the item
    pub stats: Option<ItemStats>,
}

impl CatalogItem {
    pub fn has_genre(&self, genre: Genre) -> bool {
        self.genres.contains(&genre)
    }
}

// =============================================================================
// Rating Types
// =============================================================================

/// A row of the historical rating table exactly as it was read.
///
/// Any field may be empty in the source file; such rows never make it into
/// training (see [`RatingRow::complete`]).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingRow {
    pub user_id: Option<UserId>,
    pub item_id: Option<ItemId>,
    pub rating: Option<f32>,
}

impl RatingRow {
    /// Returns the record only when all three fields are present.
    pub fn complete(&self) -> Option<RatingRecord> {
        Some(RatingRecord {
            user_id: self.user_id?,
            item_id: self.item_id?,
            rating: self.rating?,
        })
    }
}

impl From<RatingRecord> for RatingRow {
    fn from(record: RatingRecord) -> Self {
        Self {
            user_id: Some(record.user_id),
            item_id: Some(record.item_id),
            rating: Some(record.rating),
        }
    }
}

/// A complete (user, item, rating) triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: UserId,
    pub item_id: ItemId,
    /// Rating value from 1.0 to 5.0
    pub rating: f32,
}

// =============================================================================
// Catalog - ordered item store
// =============================================================================

/// The item catalog, kept in load order.
///
/// The loader's collaborator writes the catalog sorted by descending rating,
/// and the candidate sampler depends on that order, so nothing here reorders
/// items unless [`Catalog::sort_by_rating`] is called explicitly.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    pub(crate) items: Vec<CatalogItem>,
    /// Item id -> position in `items`
    pub(crate) positions: HashMap<ItemId, usize>,
    /// Positions of the items carrying each genre, ascending
    pub(crate) genre_index: HashMap<Genre, Vec<usize>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from items in the given order.
    pub fn from_items(items: impl IntoIterator<Item = CatalogItem>) -> Result<Self> {
        let mut catalog = Self::new();
        for item in items {
            catalog.insert(item)?;
        }
        Ok(catalog)
    }

    /// Append an item. Item ids are unique.
    pub fn insert(&mut self, item: CatalogItem) -> Result<()> {
        if self.positions.contains_key(&item.id) {
            return Err(DataLoadError::DuplicateItem { id: item.id });
        }
        let position = self.items.len();
        self.positions.insert(item.id, position);
        for &genre in &item.genres {
            self.genre_index.entry(genre).or_default().push(position);
        }
        self.items.push(item);
        Ok(())
    }

    pub fn get(&self, id: ItemId) -> Option<&CatalogItem> {
        self.positions.get(&id).map(|&position| &self.items[position])
    }

    /// Position of an item in catalog order
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Items carrying `genre`, in catalog order.
    pub fn items_in_genre(&self, genre: Genre) -> impl Iterator<Item = &CatalogItem> + '_ {
        self.genre_index
            .get(&genre)
            .map(|positions| positions.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&position| &self.items[position])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rebuild the id and genre indices after `items` was reordered.
    pub(crate) fn reindex(&mut self) {
        self.positions.clear();
        self.genre_index.clear();
        for (position, item) in self.items.iter().enumerate() {
            self.positions.insert(item.id, position);
            for &genre in &item.genres {
                self.genre_index.entry(genre).or_default().push(position);
            }
        }
    }
}

// =============================================================================
// RatingCorpus - historical ratings
// =============================================================================

/// The historical rating table. Never mutated once loaded.
#[derive(Debug, Default, Clone)]
pub struct RatingCorpus {
    pub(crate) rows: Vec<RatingRow>,
    pub(crate) users: HashSet<UserId>,
}

impl RatingCorpus {
    pub fn from_rows(rows: Vec<RatingRow>) -> Self {
        let users = rows.iter().filter_map(|row| row.user_id).collect();
        Self { rows, users }
    }

    pub fn from_records(records: impl IntoIterator<Item = RatingRecord>) -> Self {
        Self::from_rows(records.into_iter().map(RatingRow::from).collect())
    }

    /// All rows, including incomplete ones
    pub fn rows(&self) -> &[RatingRow] {
        &self.rows
    }

    /// Complete rows only, in table order
    pub fn records(&self) -> impl Iterator<Item = RatingRecord> + '_ {
        self.rows.iter().filter_map(RatingRow::complete)
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.users.contains(&user_id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Mean of the complete rows, `None` when there are none.
    pub fn global_mean(&self) -> Option<f32> {
        let (sum, count) = self
            .records()
            .fold((0.0f64, 0usize), |(sum, count), r| (sum + r.rating as f64, count + 1));
        (count > 0).then(|| (sum / count as f64) as f32)
    }
}

// =============================================================================
// ExternalLinks - item id -> external ids
// =============================================================================

/// External identifiers for catalog items (the `links.csv` mapping).
///
/// Ids are kept as strings so that IMDb's leading zeros survive.
#[derive(Debug, Default, Clone)]
pub struct ExternalLinks {
    pub(crate) imdb: HashMap<ItemId, String>,
    pub(crate) tmdb: HashMap<ItemId, String>,
}

impl ExternalLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item_id: ItemId, imdb_id: Option<String>, tmdb_id: Option<String>) {
        if let Some(imdb_id) = imdb_id.filter(|id| !id.is_empty()) {
            self.imdb.insert(item_id, imdb_id);
        }
        if let Some(tmdb_id) = tmdb_id.filter(|id| !id.is_empty()) {
            self.tmdb.insert(item_id, tmdb_id);
        }
    }

    pub fn imdb_id(&self, item_id: ItemId) -> Option<&str> {
        self.imdb.get(&item_id).map(String::as_str)
    }

    pub fn tmdb_id(&self, item_id: ItemId) -> Option<&str> {
        self.tmdb.get(&item_id).map(String::as_str)
    }

    /// IMDb title page for an item, `None` if the item has no mapping
    pub fn imdb_url(&self, item_id: ItemId) -> Option<String> {
        self.imdb_id(item_id)
            .map(|id| format!("https://www.imdb.com/title/tt{}", id))
    }

    pub fn len(&self) -> usize {
        self.imdb.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imdb.is_empty()
    }
}

// =============================================================================
// DataIndex - everything loaded at startup
// =============================================================================

/// Bundle of the three inputs the recommender reads at startup.
#[derive(Debug, Default, Clone)]
pub struct DataIndex {
    pub catalog: Catalog,
    pub ratings: RatingCorpus,
    pub links: ExternalLinks,
}

impl DataIndex {
    pub fn new(catalog: Catalog, ratings: RatingCorpus, links: ExternalLinks) -> Self {
        Self {
            catalog,
            ratings,
            links,
        }
    }

    /// (items, rating rows, distinct users) for logging
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.catalog.len(), self.ratings.len(), self.ratings.user_count())
    }
}
