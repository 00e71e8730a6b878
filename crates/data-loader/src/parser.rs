//! Parsers for the CSV data files.
//!
//! - catalog: `movieId,title,genres[,avg_rating,rating_count]`
//! - ratings: `userId,movieId,rating[,timestamp]`
//! - links:   `movieId,imdbId[,tmdbId]`
//!
//! Each parser has a `*_from_reader` variant so tests can feed in-memory
//! CSV without touching the filesystem.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Genres field of items the catalog has no genre for
const NO_GENRES: &str = "(no genres listed)";

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "movieId")]
    item_id: ItemId,
    title: String,
    genres: String,
    #[serde(default, alias = "rating_mean", alias = "mean_rating")]
    avg_rating: Option<f32>,
    #[serde(default)]
    rating_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RatingCsvRow {
    #[serde(rename = "userId", default)]
    user_id: Option<UserId>,
    #[serde(rename = "movieId", default)]
    item_id: Option<ItemId>,
    #[serde(default)]
    rating: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct LinkRow {
    #[serde(rename = "movieId")]
    item_id: ItemId,
    #[serde(rename = "imdbId", default)]
    imdb_id: Option<String>,
    #[serde(rename = "tmdbId", default)]
    tmdb_id: Option<String>,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|_| DataLoadError::FileNotFound {
        path: path.display().to_string(),
    })
}

/// Parse the catalog file, keeping file order.
pub fn parse_catalog(path: &Path) -> Result<Vec<CatalogItem>> {
    parse_catalog_from_reader(open(path)?, &file_name(path))
}

pub fn parse_catalog_from_reader<R: Read>(reader: R, file: &str) -> Result<Vec<CatalogItem>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut items = Vec::new();

    for (idx, result) in reader.deserialize::<CatalogRow>().enumerate() {
        // +2: one for the header, one for 1-based lines
        let line_no = idx + 2;
        let row = result?;

        let genres = parse_genres(&row.genres).map_err(|e| DataLoadError::ParseError {
            file: file.to_string(),
            line: line_no,
            reason: e.to_string(),
        })?;

        let stats = match (row.avg_rating, row.rating_count) {
            (Some(avg), Some(count)) => Some(ItemStats::new(avg, count)),
            (Some(avg), None) => Some(ItemStats::new(avg, 0)),
            _ => None,
        };

        items.push(CatalogItem {
            id: row.item_id,
            year: extract_year_from_title(&row.title),
            title: row.title,
            genres,
            stats,
        });
    }
    Ok(items)
}

/// Parse the historical ratings file. Rows with empty fields are kept as
/// incomplete [`RatingRow`]s; malformed values are errors.
pub fn parse_ratings(path: &Path) -> Result<Vec<RatingRow>> {
    parse_ratings_from_reader(open(path)?, &file_name(path))
}

pub fn parse_ratings_from_reader<R: Read>(reader: R, file: &str) -> Result<Vec<RatingRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for (idx, result) in reader.deserialize::<RatingCsvRow>().enumerate() {
        let line_no = idx + 2;
        let row = result?;

        let out_of_range = row
            .rating
            .filter(|rating| !(MIN_RATING..=MAX_RATING).contains(rating));
        if let Some(rating) = out_of_range {
            return Err(DataLoadError::ParseError {
                file: file.to_string(),
                line: line_no,
                reason: format!("rating {} outside {}..={}", rating, MIN_RATING, MAX_RATING),
            });
        }

        rows.push(RatingRow {
            user_id: row.user_id,
            item_id: row.item_id,
            rating: row.rating,
        });
    }
    Ok(rows)
}

/// Parse the external id mapping.
pub fn parse_links(path: &Path) -> Result<ExternalLinks> {
    parse_links_from_reader(open(path)?)
}

pub fn parse_links_from_reader<R: Read>(reader: R) -> Result<ExternalLinks> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut links = ExternalLinks::new();
    for result in reader.deserialize::<LinkRow>() {
        let row = result?;
        links.insert(row.item_id, row.imdb_id, row.tmdb_id);
    }
    Ok(links)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extract year from an item title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
fn extract_year_from_title(title: &str) -> Option<u16> {
    let title = title.trim_end();
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        if let Ok(year) = title[start + 1..end].parse::<u16>() {
            return Some(year);
        }
    }
    None
}

/// Parse pipe-separated genres
///
/// Example: "Action|Adventure|Sci-Fi" -> vec![Genre::Action, Genre::Adventure, Genre::SciFi]
fn parse_genres(s: &str) -> Result<Vec<Genre>> {
    if s.trim() == NO_GENRES || s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split('|').map(str::parse).collect()
}
