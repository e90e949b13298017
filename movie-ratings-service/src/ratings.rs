use agent_flow::Graph;
use std::sync::Arc;
use tracing::{error, info};

use crate::backfill::SynthesisConfig;
use crate::cache::RatingsCache;
use crate::error::RatingsError;
use crate::llm::ChatModel;
use crate::models::MovieRatingResponse;
use crate::pipeline::{RatingPipeline, RatingSet};
use crate::search::SearchAdapter;
use crate::workflow::{build_ratings_workflow, run_agent_loop};

/// Answers movie rating queries: agent loop, recovery, backfill, and the optional cache.
pub struct RatingsService {
    graph: Graph,
    pipeline: RatingPipeline,
    cache: Option<RatingsCache>,
}

impl RatingsService {
    pub fn new(model: Arc<dyn ChatModel>, search: Arc<SearchAdapter>, max_tool_rounds: usize) -> Self {
        Self {
            graph: build_ratings_workflow(model, search, max_tool_rounds),
            pipeline: RatingPipeline::default(),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: RatingsCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_synthesis(mut self, config: SynthesisConfig) -> Self {
        self.pipeline = RatingPipeline::new(config);
        self
    }

    /// Ratings for `movie_name` as the outbound response. Never fails: errors are reported in
    /// the response body.
    pub async fn rate(&self, movie_name: &str) -> MovieRatingResponse {
        if let Some(ratings) = self.cache.as_ref().and_then(|c| c.get(movie_name)) {
            info!(movie = %movie_name, "Serving cached ratings");
            return MovieRatingResponse::success(ratings);
        }

        match self.collect(movie_name).await {
            Ok(set) => {
                info!(
                    movie = %movie_name,
                    genuine = set.genuine,
                    strategy = set.strategy.map(|s| s.name()),
                    "Ratings ready"
                );
                if let Some(cache) = &self.cache {
                    cache.insert(movie_name, set.ratings.clone());
                }
                MovieRatingResponse::success(set.ratings)
            }
            Err(e) => {
                error!(movie = %movie_name, error = %e, "Failed to produce ratings");
                MovieRatingResponse::error(e.to_string())
            }
        }
    }

    async fn collect(&self, movie_name: &str) -> Result<RatingSet, RatingsError> {
        let outcome = run_agent_loop(&self.graph, movie_name)
            .await
            .map_err(RatingsError::from);

        let mut rng = rand::rng();
        self.pipeline.assemble(outcome, movie_name, &mut rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelReply;
    use crate::llm::testing::ScriptedModel;
    use crate::models::{Platform, ResponseStatus};
    use crate::search::testing::ScriptedBackend;
    use std::time::Duration;

    fn service(model: Arc<ScriptedModel>) -> RatingsService {
        let search = Arc::new(SearchAdapter::new(
            Arc::new(ScriptedBackend::default()),
            3,
            Duration::ZERO,
        ));
        RatingsService::new(model, search, 4)
    }

    #[tokio::test]
    async fn every_success_covers_all_platforms_once() {
        let model = Arc::new(ScriptedModel::repeating(ModelReply::text(
            r#"[{"platform": "PVR", "movie_rating": 7.4, "type_of_movie": "Drama"}]"#,
        )));

        let response = service(model).rate("12th Fail").await;

        assert_eq!(response.status, ResponseStatus::Success);
        assert!(response.message.is_none());
        let platforms: Vec<Platform> = response.data.iter().map(|r| r.platform).collect();
        assert_eq!(platforms, Platform::ALL.to_vec());
        assert_eq!(response.data[2].movie_rating, 7.4);
        assert!(response.data.iter().all(|r| r.type_of_movie == "Drama"));
    }

    #[tokio::test]
    async fn cached_answers_skip_the_agent_loop() {
        let model = Arc::new(ScriptedModel::repeating(ModelReply::text("[]")));
        let service =
            service(model.clone()).with_cache(RatingsCache::new(Duration::from_secs(3600), 64));

        let first = service.rate("Dune: Part Two").await;
        let second = service.rate("  dune:  part two ").await;

        assert_eq!(model.calls(), 1);
        assert_eq!(first.data, second.data);
    }

    #[tokio::test]
    async fn synthesis_failure_is_an_error_response_and_not_cached() {
        let model = Arc::new(ScriptedModel::repeating(ModelReply::text("[]")));
        let service = service(model.clone())
            .with_cache(RatingsCache::new(Duration::from_secs(3600), 64))
            .with_synthesis(SynthesisConfig {
                base_min: 7.5,
                base_max: 9.0,
                jitter: -1.0,
            });

        let response = service.rate("Leo").await;
        assert_eq!(response.status, ResponseStatus::Error);
        assert!(response.data.is_empty());
        assert!(response.message.unwrap().contains("negative jitter"));

        service.rate("Leo").await;
        assert_eq!(model.calls(), 2);
    }
}
