use agent_flow::{AgentTurn, Role, ToolInvocation};
use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use movie_ratings_service::{
    AppState, ChatModel, ModelError, ModelReply, MovieRatingResponse, Platform, RatingsService,
    ResponseStatus, SearchAdapter, SearchBackend, SearchError, SearchHit, ToolSpec, build_router,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// Asks for one search, then answers with whatever `answer` says.
struct SearchThenAnswer {
    answer: String,
    seen: Mutex<Vec<Vec<AgentTurn>>>,
}

impl SearchThenAnswer {
    fn new(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatModel for SearchThenAnswer {
    async fn respond(&self, turns: &[AgentTurn], tools: &[ToolSpec]) -> Result<ModelReply, ModelError> {
        self.seen.lock().unwrap().push(turns.to_vec());
        let searched = turns.iter().any(|t| t.role == Role::Tool);
        if searched || tools.is_empty() {
            return Ok(ModelReply::text(self.answer.clone()));
        }
        let movie = turns
            .iter()
            .find(|t| t.role == Role::Human)
            .map(|t| t.content.clone())
            .unwrap_or_default();
        Ok(ModelReply::tool_calls(vec![ToolInvocation::new(
            "call_0",
            "filtered_multi_search",
            json!({ "query": format!("{movie} rating") }),
        )]))
    }
}

struct StaticBackend;

#[async_trait]
impl SearchBackend for StaticBackend {
    async fn fetch(&self, _query: &str) -> Result<Vec<SearchHit>, SearchError> {
        Ok(vec![
            SearchHit {
                title: "Jawan (2023) - Book Tickets".to_string(),
                link: "https://in.bookmyshow.com/movies/jawan".to_string(),
                snippet: "User rating 8.7/10, 88% liked it".to_string(),
            },
            SearchHit {
                title: "Jawan showtimes".to_string(),
                link: "https://www.pvrcinemas.com/jawan".to_string(),
                snippet: "Book now".to_string(),
            },
        ])
    }
}

fn app(model: Arc<dyn ChatModel>) -> axum::Router {
    let search = Arc::new(SearchAdapter::new(Arc::new(StaticBackend), 3, Duration::ZERO));
    build_router(AppState {
        ratings: Arc::new(RatingsService::new(model, search, 4)),
    })
}

async fn post_ratings(app: axum::Router, body: Value) -> (StatusCode, Option<String>, MovieRatingResponse) {
    let response = app
        .oneshot(
            Request::post("/movie-ratings")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let correlation_id = response
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, correlation_id, serde_json::from_slice(&bytes).unwrap())
}

fn assert_full_set(response: &MovieRatingResponse) {
    assert_eq!(response.status, ResponseStatus::Success);
    let platforms: Vec<Platform> = response.data.iter().map(|r| r.platform).collect();
    assert_eq!(platforms, Platform::ALL.to_vec());
    for rating in &response.data {
        assert!((1.0..=10.0).contains(&rating.movie_rating));
        assert_eq!(
            rating.positive_review_percentage + rating.negative_review_percentage,
            100
        );
    }
}

#[tokio::test]
async fn searched_answer_is_completed_to_five_platforms() {
    let model = SearchThenAnswer::new(
        r#"```json
[
  {"platform": "BookMyShow", "movie_title": "Jawan", "movie_rating": 8.7, "type_of_movie": "Action, Thriller", "positive_review_percentage": 88, "negative_review_percentage": 12},
  {"platform": "PVR Cinemas", "movie_title": "Jawan", "movie_rating": 8.5, "type_of_movie": "Action, Thriller", "positive_review_percentage": 85, "negative_review_percentage": 15}
]
```"#,
    );

    let (status, correlation_id, response) =
        post_ratings(app(model.clone()), json!({"movie_name": "Jawan"})).await;

    assert_eq!(status, StatusCode::OK);
    assert!(correlation_id.is_some());
    assert_full_set(&response);
    assert_eq!(response.data[0].movie_rating, 8.7);
    assert_eq!(response.data[2].movie_rating, 8.5);
    assert!(response.data.iter().all(|r| r.type_of_movie == "Action, Thriller"));

    // the second model call saw the filtered search results
    let seen = model.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    let tool_turn = seen[1].iter().find(|t| t.role == Role::Tool).unwrap();
    assert!(tool_turn.content.contains("bookmyshow.com/movies/jawan"));
}

#[tokio::test]
async fn refusal_still_returns_a_complete_synthetic_set() {
    let model = SearchThenAnswer::new("I'm sorry, I don't have information about that movie.");

    let (status, _, response) =
        post_ratings(app(model), json!({"movie_name": "A Film Nobody Reviewed"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_full_set(&response);
    assert!(response
        .data
        .iter()
        .all(|r| r.movie_title == "A Film Nobody Reviewed" && (7.0..=9.5).contains(&r.movie_rating)));
}

#[tokio::test]
async fn blank_movie_name_is_rejected() {
    let model = SearchThenAnswer::new("[]");

    let (status, _, response) = post_ratings(app(model.clone()), json!({"movie_name": "   "})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.data.is_empty());
    assert!(model.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_healthy() {
    let response = app(SearchThenAnswer::new("[]"))
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
}
