//! Core traits for the ranking filters.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to scored predictions.

use crate::predictor::Prediction;
use crate::session::SessionContext;
use anyhow::Result;

/// Core trait for filtering predictions before truncation.
///
/// ## Design Note
/// - `Send + Sync` allows filters to be shared across session workers
/// - Filters take ownership of the Vec<Prediction> and return a filtered Vec
/// - Filters must keep the relative order of what they keep
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of predictions.
    ///
    /// # Arguments
    /// * `predictions` - The predictions to filter (takes ownership)
    /// * `context` - The session: user, genre and the items just rated
    fn apply(
        &self,
        predictions: Vec<Prediction>,
        context: &SessionContext,
    ) -> Result<Vec<Prediction>>;
}
