//! Turn a session's raw rating inputs into rating records.

use crate::error::PipelineError;
use crate::sampler::DEFAULT_SAMPLE_SIZE;
use crate::session::{RatingInput, SessionUser};
use data_loader::{Catalog, ItemId, RatingRecord};
use std::collections::HashSet;
use tracing::debug;

/// Converts `(item, rating-or-skip)` pairs into [`RatingRecord`]s for the
/// session user. Skipped items produce no record at all.
#[derive(Debug, Clone, Copy)]
pub struct RatingIngestor {
    user: SessionUser,
    max_ratings: usize,
}

impl RatingIngestor {
    pub fn new(user: SessionUser) -> Self {
        Self {
            user,
            max_ratings: DEFAULT_SAMPLE_SIZE,
        }
    }

    /// Configure how many pairs one submission may carry (default: 5)
    pub fn with_max_ratings(mut self, max_ratings: usize) -> Self {
        self.max_ratings = max_ratings;
        self
    }

    /// Reject submissions that are too long, repeat an item or name an item
    /// outside the catalog.
    pub fn validate(
        &self,
        inputs: &[(ItemId, RatingInput)],
        catalog: &Catalog,
    ) -> Result<(), PipelineError> {
        if inputs.len() > self.max_ratings {
            return Err(PipelineError::TooManyRatings {
                max: self.max_ratings,
                found: inputs.len(),
            });
        }
        let mut seen = HashSet::new();
        for &(item_id, _) in inputs {
            if !catalog.contains(item_id) {
                return Err(PipelineError::UnknownItem(item_id));
            }
            if !seen.insert(item_id) {
                return Err(PipelineError::DuplicateRating(item_id));
            }
        }
        Ok(())
    }

    /// One record per rated pair, in input order.
    pub fn ingest(&self, inputs: &[(ItemId, RatingInput)]) -> Vec<RatingRecord> {
        let records: Vec<RatingRecord> = inputs
            .iter()
            .filter_map(|&(item_id, input)| match input {
                RatingInput::Stars(stars) => Some(RatingRecord {
                    user_id: self.user.id(),
                    item_id,
                    rating: f32::from(stars),
                }),
                RatingInput::Skip => None,
            })
            .collect();
        debug!(
            "Ingested {} ratings ({} skipped) for {}",
            records.len(),
            inputs.len() - records.len(),
            self.user
        );
        records
    }
}
