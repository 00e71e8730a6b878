//! Input validation errors.
//!
//! These are raised before a request enters the pipeline. Empty candidate
//! sets and training divergence are not errors at this level.

use data_loader::ItemId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Unknown genre: {0:?}")]
    UnknownGenre(String),

    #[error("Invalid rating {0:?}: expected 1-5 or \"skip\"")]
    InvalidRating(String),

    #[error("Too many ratings: at most {max}, got {found}")]
    TooManyRatings { max: usize, found: usize },

    #[error("Item {0} is not in the catalog")]
    UnknownItem(ItemId),

    #[error("Item {0} was rated more than once")]
    DuplicateRating(ItemId),
}
