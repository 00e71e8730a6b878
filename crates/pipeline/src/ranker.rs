//! Order scored items and keep the top N the user has not just rated.

use crate::filter_pipeline::FilterPipeline;
use crate::filters::{AlreadyRatedFilter, GenreMembershipFilter};
use crate::predictor::Prediction;
use crate::session::SessionContext;
use anyhow::{Context, Result};
use data_loader::Catalog;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_RECOMMENDATION_COUNT: usize = 5;

pub struct Ranker {
    pipeline: FilterPipeline,
    limit: usize,
}

impl Ranker {
    /// Ranker with the standard filters: already-rated exclusion, then
    /// genre membership against `catalog`.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let pipeline = FilterPipeline::new()
            .add_filter(AlreadyRatedFilter)
            .add_filter(GenreMembershipFilter::new(catalog));
        Self::with_pipeline(pipeline)
    }

    pub fn with_pipeline(pipeline: FilterPipeline) -> Self {
        Self {
            pipeline,
            limit: DEFAULT_RECOMMENDATION_COUNT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Sort by descending score, filter, truncate.
    ///
    /// The sort is stable, so equal scores keep the order they came in
    /// (catalog order when fed from the Predictor). Returns
    /// `min(limit, remaining)` entries; an empty result is not an error.
    pub fn rank(
        &self,
        mut predictions: Vec<Prediction>,
        context: &SessionContext,
    ) -> Result<Vec<Prediction>> {
        predictions.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut ranked = self
            .pipeline
            .apply(predictions, context)
            .with_context(|| format!("Failed to filter predictions for {}", context.user))?;
        ranked.truncate(self.limit);

        debug!("Ranked {} recommendations for {}", ranked.len(), context.user);
        Ok(ranked)
    }
}
