//! Server crate for the reel-rate recommendation engine.
//!
//! This crate contains the orchestrator that runs a rating session through
//! every stage of the pipeline.

pub mod orchestrator;

pub use orchestrator::{
    Recommendation, RecommendationOrchestrator, RecommendationResponse, RecommenderConfig,
    SessionRequest,
};
