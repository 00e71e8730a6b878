//! Filter to remove items the user rated in this session.
//!
//! Recommending something the user just rated would be pointless, so this
//! filter runs on every ranking.

use crate::predictor::Prediction;
use crate::session::SessionContext;
use crate::traits::Filter;
use anyhow::Result;

/// Removes predictions for items in `SessionContext.rated_items`.
///
/// Skipped items are not in that set and stay eligible.
pub struct AlreadyRatedFilter;

impl Filter for AlreadyRatedFilter {
    fn name(&self) -> &str {
        "AlreadyRatedFilter"
    }

    fn apply(
        &self,
        predictions: Vec<Prediction>,
        context: &SessionContext,
    ) -> Result<Vec<Prediction>> {
        let filtered: Vec<Prediction> = predictions
            .into_iter()
            .filter(|prediction| !context.rated_items.contains(&prediction.item_id))
            .collect();
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionUser;
    use data_loader::{Genre, RatingRecord};

    #[test]
    fn test_already_rated_filter() {
        let records = vec![
            RatingRecord {
                user_id: 1,
                item_id: 100,
                rating: 5.0,
            },
            RatingRecord {
                user_id: 1,
                item_id: 200,
                rating: 2.0,
            },
        ];
        let context = SessionContext::new(SessionUser::new(1), Genre::Drama, &records);

        let predictions = vec![
            Prediction { item_id: 100, score: 4.9 },
            Prediction { item_id: 101, score: 4.8 },
            Prediction { item_id: 200, score: 4.7 },
            Prediction { item_id: 300, score: 4.6 },
        ];

        let filtered = AlreadyRatedFilter.apply(predictions, &context).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].item_id, 101);
        assert_eq!(filtered[1].item_id, 300);
    }
}
