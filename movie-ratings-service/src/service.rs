use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, info};
use uuid::Uuid;

use crate::cache::RatingsCache;
use crate::config::ServiceConfig;
use crate::llm::OpenRouterChatModel;
use crate::models::{MovieRatingRequest, MovieRatingResponse};
use crate::ratings::RatingsService;
use crate::search::{SearchAdapter, SearchError, SerperBackend};

type ApiError = (StatusCode, Json<MovieRatingResponse>);

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build search client: {0}")]
    Search(#[from] SearchError),
}

#[derive(Clone)]
pub struct AppState {
    pub ratings: Arc<RatingsService>,
}

/// Wire the production collaborators from `config` and build the router.
pub fn create_app(config: &ServiceConfig) -> Result<Router, StartupError> {
    let model = Arc::new(OpenRouterChatModel::new(
        &config.openrouter_api_key,
        &config.model_name,
        config.model_timeout,
    ));
    let backend = Arc::new(SerperBackend::new(&config.search)?);
    let search = Arc::new(SearchAdapter::from_config(backend, &config.search));

    let mut ratings = RatingsService::new(model, search, config.max_tool_rounds);
    if config.cache.enabled {
        info!(
            ttl_secs = config.cache.ttl.as_secs(),
            max_entries = config.cache.max_entries,
            "Response caching enabled"
        );
        ratings = ratings.with_cache(RatingsCache::new(config.cache.ttl, config.cache.max_entries));
    }

    Ok(build_router(AppState {
        ratings: Arc::new(ratings),
    }))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/movie-ratings", post(movie_ratings))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Tag each request with a correlation id header and run it inside a span carrying the id.
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert(CORRELATION_ID_HEADER, value.clone());
        let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
        let mut response = next.run(request).instrument(span).await;
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
        return response;
    }

    next.run(request).await
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Movie Ratings Aggregator",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Collects movie ratings from ticket-booking platforms with an LLM search agent",
        "platforms": ["BookMyShow", "Paytm", "PVR Cinemas", "INOX Movies", "Cinepolis"],
        "endpoints": {
            "POST /movie-ratings": "Get ratings for a movie: {\"movie_name\": \"...\"}",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn validate_movie_name(movie_name: &str) -> Result<&str, ApiError> {
    let trimmed = movie_name.trim();
    if trimmed.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(MovieRatingResponse::error("movie_name is required")),
        ));
    }
    Ok(trimmed)
}

async fn movie_ratings(
    State(state): State<AppState>,
    Json(request): Json<MovieRatingRequest>,
) -> Result<Json<MovieRatingResponse>, ApiError> {
    let movie_name = validate_movie_name(&request.movie_name)?;
    info!(movie = %movie_name, "Rating request received");

    Ok(Json(state.ratings.rate(movie_name).await))
}
