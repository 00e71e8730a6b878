//! # Recommendation Orchestrator
//!
//! This module coordinates one rating session end to end:
//! 1. Validate and ingest the submitted ratings
//! 2. Merge them with the historical corpus
//! 3. Retrain a session model (on a blocking worker)
//! 4. Score every item of the chosen genre
//! 5. Rank, exclude what was just rated, keep the top N
//! 6. Attach catalog metadata and IMDb links
//!
//! Catalog, corpus, links and baseline are loaded once and shared read-only.
//! Each call derives its own model, so concurrent sessions are independent.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use data_loader::{Catalog, CatalogItem, DataIndex, ExternalLinks, Genre, ItemId, RatingCorpus, RatingRecord};
use factor_model::{Hyperparameters, LatentFactorModel, ModelTrainer};
use pipeline::{
    CandidateSampler, DEFAULT_POOL_SIZE, DEFAULT_RECOMMENDATION_COUNT, DEFAULT_SAMPLE_SEED,
    DEFAULT_SAMPLE_SIZE, DatasetMerger, GenreFilter, ModelSource, Prediction, Predictor, Ranker,
    RatingIngestor, RatingInput, RetrainOutcome, SessionContext, SessionUser,
    retrain_session_model,
};

/// Tunables for a [`RecommendationOrchestrator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommenderConfig {
    /// How many top-rated genre items the sample is drawn from
    pub pool_size: usize,
    /// How many items a session is asked to rate
    pub sample_size: usize,
    /// How many recommendations a session gets back
    pub recommendation_count: usize,
    /// Sampler seed
    pub seed: u64,
    pub hyperparameters: Hyperparameters,
    /// Retrain even when the session rated nothing (default: reuse the baseline)
    pub retrain_on_empty_session: bool,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            sample_size: DEFAULT_SAMPLE_SIZE,
            recommendation_count: DEFAULT_RECOMMENDATION_COUNT,
            seed: DEFAULT_SAMPLE_SEED,
            hyperparameters: Hyperparameters::default(),
            retrain_on_empty_session: false,
        }
    }
}

impl RecommenderConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_hyperparameters(mut self, hyperparameters: Hyperparameters) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }

    pub fn with_recommendation_count(mut self, count: usize) -> Self {
        self.recommendation_count = count;
        self
    }

    pub fn with_retrain_on_empty_session(mut self, retrain: bool) -> Self {
        self.retrain_on_empty_session = retrain;
        self
    }
}

/// One submission: the items shown to the user, each rated or skipped.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub user: SessionUser,
    pub genre: Genre,
    pub ratings: Vec<(ItemId, RatingInput)>,
}

/// Final recommendation returned to the user
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub title: String,
    pub genres: Vec<String>,
    pub year: Option<u16>,
    pub score: f32,
    pub imdb_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecommendationResponse {
    pub session_user: SessionUser,
    pub model_source: ModelSource,
    pub recommendations: Vec<Recommendation>,
}

/// Main orchestrator that coordinates the recommendation pipeline
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    catalog: Arc<Catalog>,
    ratings: Arc<RatingCorpus>,
    links: Arc<ExternalLinks>,
    baseline: Option<Arc<LatentFactorModel>>,
    trainer: ModelTrainer,
    ranker: Arc<Ranker>,
    config: RecommenderConfig,
}

impl RecommendationOrchestrator {
    /// Create a new orchestrator with all components initialized
    ///
    /// # Arguments
    /// * `data` - Catalog, historical ratings and links, loaded once
    /// * `baseline` - Pre-trained model to warm-start from, if any
    /// * `config` - Sampling, ranking and training settings
    pub fn new(
        data: DataIndex,
        baseline: Option<LatentFactorModel>,
        config: RecommenderConfig,
    ) -> Self {
        let DataIndex {
            catalog,
            ratings,
            links,
        } = data;
        let catalog = Arc::new(catalog);
        let ranker = Arc::new(
            Ranker::new(Arc::clone(&catalog)).with_limit(config.recommendation_count),
        );
        Self {
            catalog,
            ratings: Arc::new(ratings),
            links: Arc::new(links),
            baseline: baseline.map(Arc::new),
            trainer: ModelTrainer::new(config.hyperparameters),
            ranker,
            config,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn imdb_url(&self, item_id: ItemId) -> Option<String> {
        self.links.imdb_url(item_id)
    }

    /// The items a session on `genre` is asked to rate.
    pub fn candidates(&self, genre: Genre) -> Vec<CatalogItem> {
        let filtered = GenreFilter::new(&self.catalog).apply(genre);
        let sampler = CandidateSampler::new()
            .with_pool_size(self.config.pool_size)
            .with_sample_size(self.config.sample_size)
            .with_seed(self.config.seed);
        sampler.sample(&filtered).into_iter().cloned().collect()
    }

    /// A session user id unknown to both the corpus and the baseline.
    pub fn new_session(&self) -> SessionUser {
        SessionUser::fresh(|id| {
            self.ratings.contains_user(id)
                || self
                    .baseline
                    .as_ref()
                    .is_some_and(|model| model.knows_user(id))
        })
    }

    /// Main entry point: turn one rating submission into recommendations
    ///
    /// # Returns
    /// Up to `recommendation_count` items of the session genre, best first,
    /// never one the user rated in this submission
    #[instrument(skip_all, fields(user = %request.user, genre = %request.genre))]
    pub async fn recommend(&self, request: &SessionRequest) -> Result<RecommendationResponse> {
        // Start timing
        let start_time = Instant::now();

        let ingestor =
            RatingIngestor::new(request.user).with_max_ratings(self.config.sample_size);
        ingestor
            .validate(&request.ratings, &self.catalog)
            .context("Invalid rating submission")?;
        let records = ingestor.ingest(&request.ratings);
        let context = SessionContext::new(request.user, request.genre, &records);

        let retrain_start = Instant::now();
        let outcome = self.retrain(records).await?;
        info!(
            "Session model ready ({}) in {:.2?}",
            outcome.source,
            retrain_start.elapsed()
        );

        let ranked = self.score_and_rank(&outcome, &context)?;
        let recommendations = self.attach_metadata(ranked);

        // Log total time
        info!(
            "Returned {} recommendations for {} in {:.2?}",
            recommendations.len(),
            request.user,
            start_time.elapsed()
        );

        Ok(RecommendationResponse {
            session_user: request.user,
            model_source: outcome.source,
            recommendations,
        })
    }

    /// Merge and retrain on a blocking worker; training is CPU-bound.
    async fn retrain(&self, records: Vec<RatingRecord>) -> Result<RetrainOutcome> {
        let ratings = Arc::clone(&self.ratings);
        let baseline = self.baseline.clone();
        let trainer = self.trainer.clone();
        let retrain_on_empty_session = self.config.retrain_on_empty_session;

        tokio::task::spawn_blocking(move || {
            let merged = DatasetMerger::merge(&records, &ratings);
            retrain_session_model(&trainer, &merged, baseline.as_ref(), retrain_on_empty_session)
        })
        .await
        .context("Retrain task panicked")
    }

    fn score_and_rank(
        &self,
        outcome: &RetrainOutcome,
        context: &SessionContext,
    ) -> Result<Vec<Prediction>> {
        let ids = GenreFilter::new(&self.catalog).item_ids(context.genre);
        let predictions = Predictor::new(&outcome.model).predict(context.user, &ids);
        self.ranker
            .rank(predictions, context)
            .context("Failed to rank predictions")
    }

    fn attach_metadata(&self, ranked: Vec<Prediction>) -> Vec<Recommendation> {
        ranked
            .into_iter()
            .filter_map(|prediction| {
                let Some(item) = self.catalog.get(prediction.item_id) else {
                    warn!("No catalog entry for item {}", prediction.item_id);
                    return None;
                };
                Some(Recommendation {
                    item_id: item.id,
                    title: item.title.clone(),
                    genres: item.genres.iter().map(|g| g.to_string()).collect(),
                    year: item.year,
                    score: prediction.score,
                    imdb_url: self.links.imdb_url(item.id),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::RatingRow;

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    /// 12 comedies then 3 dramas, 20 historical users, one incomplete row
    fn build_test_data() -> DataIndex {
        let mut items = Vec::new();
        for id in 1..=15u32 {
            let genres = if id <= 12 {
                vec![Genre::Comedy]
            } else {
                vec![Genre::Drama]
            };
            items.push(CatalogItem {
                id,
                title: format!("Movie {} (1999)", id),
                year: Some(1999),
                genres,
                stats: None,
            });
        }
        let catalog = Catalog::from_items(items).unwrap();

        let mut rows = Vec::new();
        for user_id in 1..=20u32 {
            for item_id in 1..=15u32 {
                if (user_id + item_id) % 2 == 0 {
                    rows.push(RatingRow::from(RatingRecord {
                        user_id,
                        item_id,
                        rating: ((user_id + 2 * item_id) % 5 + 1) as f32,
                    }));
                }
            }
        }
        rows.push(RatingRow {
            user_id: Some(1),
            item_id: None,
            rating: Some(3.0),
        });

        let mut links = ExternalLinks::new();
        links.insert(1, Some("0114709".to_string()), None);

        DataIndex::new(catalog, RatingCorpus::from_rows(rows), links)
    }

    fn test_config() -> RecommenderConfig {
        RecommenderConfig::default()
            .with_hyperparameters(Hyperparameters::default().with_n_factors(4).with_n_epochs(10))
    }

    fn build_test_baseline(data: &DataIndex, config: &RecommenderConfig) -> LatentFactorModel {
        let records: Vec<RatingRecord> = data.ratings.records().collect();
        ModelTrainer::new(config.hyperparameters)
            .train(&records, None)
            .unwrap()
    }

    fn build_test_orchestrator() -> RecommendationOrchestrator {
        let data = build_test_data();
        let config = test_config();
        let baseline = build_test_baseline(&data, &config);
        RecommendationOrchestrator::new(data, Some(baseline), config)
    }

    fn request(
        orchestrator: &RecommendationOrchestrator,
        user: SessionUser,
        ratings: &[RatingInput],
    ) -> SessionRequest {
        let candidates = orchestrator.candidates(Genre::Comedy);
        SessionRequest {
            user,
            genre: Genre::Comedy,
            ratings: candidates
                .iter()
                .map(|item| item.id)
                .zip(ratings.iter().copied())
                .collect(),
        }
    }

    // ============================================================================
    // Unit Tests: candidates / new_session
    // ============================================================================

    #[test]
    fn test_candidates_are_deterministic_genre_items() {
        let orchestrator = build_test_orchestrator();

        let first = orchestrator.candidates(Genre::Comedy);
        let second = orchestrator.candidates(Genre::Comedy);

        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
        assert!(first.iter().all(|item| item.has_genre(Genre::Comedy)));
    }

    #[test]
    fn test_candidates_for_empty_genre() {
        let orchestrator = build_test_orchestrator();
        assert!(orchestrator.candidates(Genre::Western).is_empty());
    }

    #[test]
    fn test_new_session_avoids_known_users() {
        let orchestrator = build_test_orchestrator();
        let user = orchestrator.new_session();
        assert!(user.id() > 20);
    }

    // ============================================================================
    // Integration Tests: recommend
    // ============================================================================

    #[tokio::test]
    async fn test_recommend_excludes_rated_items() {
        let orchestrator = build_test_orchestrator();
        let user = SessionUser::new(1_000_001);
        let ratings = [
            RatingInput::Stars(5),
            RatingInput::Stars(1),
            RatingInput::Skip,
            RatingInput::Stars(4),
            RatingInput::Stars(3),
        ];
        let request = request(&orchestrator, user, &ratings);

        let response = orchestrator.recommend(&request).await.unwrap();

        assert_eq!(response.session_user, user);
        assert_eq!(response.model_source, ModelSource::Retrained);
        assert_eq!(response.recommendations.len(), 5);

        let rated: Vec<ItemId> = request
            .ratings
            .iter()
            .filter(|(_, input)| *input != RatingInput::Skip)
            .map(|(id, _)| *id)
            .collect();
        for rec in &response.recommendations {
            assert!(!rated.contains(&rec.item_id), "rated item {} returned", rec.item_id);
            assert!(rec.genres.contains(&"Comedy".to_string()));
            assert!((1.0..=5.0).contains(&rec.score));
        }
        assert!(
            response
                .recommendations
                .windows(2)
                .all(|w| w[0].score >= w[1].score)
        );
    }

    #[tokio::test]
    async fn test_recommend_attaches_imdb_links_when_known() {
        let orchestrator = build_test_orchestrator();
        let request = request(&orchestrator, SessionUser::new(1_000_002), &[]);

        let response = orchestrator.recommend(&request).await.unwrap();

        for rec in &response.recommendations {
            if rec.item_id == 1 {
                assert_eq!(
                    rec.imdb_url.as_deref(),
                    Some("https://www.imdb.com/title/tt0114709")
                );
            } else {
                assert_eq!(rec.imdb_url, None);
            }
        }
    }

    #[tokio::test]
    async fn test_all_skipped_reuses_baseline() {
        let orchestrator = build_test_orchestrator();
        let request = request(
            &orchestrator,
            SessionUser::new(1_000_003),
            &[RatingInput::Skip; 5],
        );

        let response = orchestrator.recommend(&request).await.unwrap();

        assert_eq!(response.model_source, ModelSource::NoSessionRatings);
        assert_eq!(response.recommendations.len(), 5);
    }

    #[tokio::test]
    async fn test_all_skipped_retrains_when_configured() {
        let data = build_test_data();
        let config = test_config().with_retrain_on_empty_session(true);
        let baseline = build_test_baseline(&data, &config);
        let orchestrator = RecommendationOrchestrator::new(data, Some(baseline), config);
        let request = request(
            &orchestrator,
            SessionUser::new(1_000_004),
            &[RatingInput::Skip; 5],
        );

        let response = orchestrator.recommend(&request).await.unwrap();
        assert_eq!(response.model_source, ModelSource::Retrained);
    }

    #[tokio::test]
    async fn test_without_baseline_trains_from_scratch() {
        let data = build_test_data();
        let orchestrator = RecommendationOrchestrator::new(data, None, test_config());
        let request = request(
            &orchestrator,
            SessionUser::new(1_000_005),
            &[RatingInput::Stars(4), RatingInput::Skip],
        );

        let response = orchestrator.recommend(&request).await.unwrap();
        assert_eq!(response.model_source, ModelSource::Retrained);
        assert_eq!(response.recommendations.len(), 5);
    }

    #[tokio::test]
    async fn test_divergent_training_falls_back() {
        let data = build_test_data();
        let config = test_config();
        let baseline = build_test_baseline(&data, &config);
        let config =
            config.with_hyperparameters(config.hyperparameters.with_learning_rate(1000.0));
        let orchestrator = RecommendationOrchestrator::new(data, Some(baseline), config);
        let request = request(
            &orchestrator,
            SessionUser::new(1_000_006),
            &[RatingInput::Stars(5); 5],
        );

        let response = orchestrator.recommend(&request).await.unwrap();
        assert_eq!(response.model_source, ModelSource::Fallback);
        assert!(
            response
                .recommendations
                .iter()
                .all(|rec| rec.score.is_finite())
        );
    }

    #[tokio::test]
    async fn test_invalid_submissions_are_rejected() {
        let orchestrator = build_test_orchestrator();

        let unknown_item = SessionRequest {
            user: SessionUser::new(1_000_007),
            genre: Genre::Comedy,
            ratings: vec![(999, RatingInput::Stars(3))],
        };
        assert!(orchestrator.recommend(&unknown_item).await.is_err());

        let too_many = SessionRequest {
            user: SessionUser::new(1_000_007),
            genre: Genre::Comedy,
            ratings: (1..=6).map(|id| (id, RatingInput::Stars(3))).collect(),
        };
        assert!(orchestrator.recommend(&too_many).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_sessions_are_independent() {
        let orchestrator = build_test_orchestrator();
        let alone = request(
            &orchestrator,
            SessionUser::new(1_000_008),
            &[RatingInput::Stars(5), RatingInput::Stars(1)],
        );
        let other = request(
            &orchestrator,
            SessionUser::new(1_000_009),
            &[RatingInput::Stars(1); 5],
        );

        let expected = orchestrator.recommend(&alone).await.unwrap();

        let (first, second) = tokio::join!(
            orchestrator.recommend(&alone),
            orchestrator.recommend(&other)
        );
        let first = first.unwrap();
        second.unwrap();

        assert_eq!(first.recommendations, expected.recommendations);
    }
}
