//! Combine session ratings with the historical corpus.
//!
//! The result is an owned table that lives for one retrain; the corpus
//! itself is shared read-only state and is never written to.

use data_loader::{RatingCorpus, RatingRecord};
use tracing::{debug, warn};

/// The rating table a session model is trained on.
#[derive(Debug, Clone, Default)]
pub struct MergedRatings {
    /// Session records first, then the complete historical rows
    pub records: Vec<RatingRecord>,
    /// How many records came from the session
    pub new_rows: usize,
    /// Historical rows discarded for missing a field
    pub dropped_rows: usize,
}

impl MergedRatings {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn session_records(&self) -> &[RatingRecord] {
        &self.records[..self.new_rows]
    }
}

pub struct DatasetMerger;

impl DatasetMerger {
    /// `new_records` followed by every complete row of `corpus`.
    pub fn merge(new_records: &[RatingRecord], corpus: &RatingCorpus) -> MergedRatings {
        let mut records = Vec::with_capacity(new_records.len() + corpus.len());
        records.extend_from_slice(new_records);
        records.extend(corpus.records());

        let dropped_rows = corpus.len() - (records.len() - new_records.len());
        if dropped_rows > 0 {
            warn!("Dropped {} incomplete historical rating rows", dropped_rows);
        }
        debug!(
            "Merged {} session ratings into {} historical rows",
            new_records.len(),
            corpus.len() - dropped_rows
        );

        MergedRatings {
            records,
            new_rows: new_records.len(),
            dropped_rows,
        }
    }
}
