//! Per-session recommendation pipeline.
//!
//! This crate provides the stages between a genre choice and a ranked list:
//! - GenreFilter and CandidateSampler pick the movies a session rates
//! - RatingIngestor and DatasetMerger turn those ratings into a training table
//! - `retrain_session_model` derives the session's own model
//! - Predictor scores the genre, Ranker orders and filters the scores
//!
//! ## Architecture
//! ```text
//! GenreFilter -> CandidateSampler -> (user rates) -> RatingIngestor
//!   -> DatasetMerger -> retrain -> Predictor -> Ranker
//! ```
//! Every stage takes shared read-only inputs and returns an owned value, so
//! concurrent sessions never touch each other's state.
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::*;
//!
//! let comedies = GenreFilter::new(&data.catalog).apply(Genre::Comedy);
//! let sample = CandidateSampler::new().sample(&comedies);
//!
//! let user = SessionUser::fresh(|id| data.ratings.contains_user(id));
//! let records = RatingIngestor::new(user).ingest(&inputs);
//! let merged = DatasetMerger::merge(&records, &data.ratings);
//! let outcome = retrain_session_model(&trainer, &merged, baseline.as_ref(), false);
//!
//! let ids = GenreFilter::new(&data.catalog).item_ids(Genre::Comedy);
//! let predictions = Predictor::new(&outcome.model).predict(user, &ids);
//! let context = SessionContext::new(user, Genre::Comedy, &records);
//! let top = Ranker::new(catalog).rank(predictions, &context)?;
//! ```

pub mod error;
pub mod filter_pipeline;
pub mod filters;
pub mod genre_filter;
pub mod ingest;
pub mod merge;
pub mod predictor;
pub mod ranker;
pub mod retrain;
pub mod sampler;
pub mod session;
pub mod traits;

// Re-export main types
pub use error::PipelineError;
pub use filter_pipeline::FilterPipeline;
pub use genre_filter::GenreFilter;
pub use ingest::RatingIngestor;
pub use merge::{DatasetMerger, MergedRatings};
pub use predictor::{Prediction, Predictor};
pub use ranker::{DEFAULT_RECOMMENDATION_COUNT, Ranker};
pub use retrain::{ModelSource, RetrainOutcome, retrain_session_model};
pub use sampler::{CandidateSampler, DEFAULT_POOL_SIZE, DEFAULT_SAMPLE_SEED, DEFAULT_SAMPLE_SIZE};
pub use session::{RatingInput, SessionContext, SessionUser, parse_genre};
pub use traits::Filter;
