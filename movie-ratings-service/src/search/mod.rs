//! Web search against the Serper API, biased toward ticket-booking platforms.

pub mod filter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::models::Platform;

pub use filter::filter_results;

/// Review and news sites excluded from the multi-source search
const EXCLUDED_SITES: [&str; 5] = [
    "timesofindia.com",
    "123telugu.com",
    "ndtv.com",
    "imdb.com",
    "wikipedia.org",
];

const BOOKING_KEYWORDS: &str = "movie tickets booking showtimes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// What a search tool hands back to the model: hits or an error message, never a panic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawResult {
    Hits { organic: Vec<SearchHit> },
    Failed { error: String },
}

impl RawResult {
    pub fn hits(organic: Vec<SearchHit>) -> Self {
        RawResult::Hits { organic }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        RawResult::Failed {
            error: error.into(),
        }
    }

    pub fn hit_count(&self) -> usize {
        match self {
            RawResult::Hits { organic } => organic.len(),
            RawResult::Failed { .. } => 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(String),

    #[error("search API returned HTTP {0}")]
    Status(u16),

    #[error("failed to parse search response: {0}")]
    Decode(String),

    #[error("search returned no results")]
    Empty,
}

/// Raw transport to a web-search API.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

pub struct SerperBackend {
    api_key: String,
    endpoint: String,
    results_per_query: u32,
    client: reqwest::Client,
}

impl SerperBackend {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            results_per_query: config.results_per_query,
            client,
        })
    }
}

#[async_trait]
impl SearchBackend for SerperBackend {
    async fn fetch(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let body = serde_json::json!({
            "q": query,
            "num": self.results_per_query,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let data: SerperResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(data.organic)
    }
}

/// Rewrite a model-issued query so results lean toward booking platforms.
///
/// A query naming a platform gets that platform's `site:` restriction. Anything else gets
/// booking keywords, plus `-site:` exclusions of review sites when `exclude_media` is set.
pub fn rewrite_query(query: &str, exclude_media: bool) -> String {
    let lowered = query.to_lowercase();

    if !lowered.contains("site:") {
        if let Some(platform) = Platform::ALL
            .into_iter()
            .find(|p| lowered.contains(p.token()))
        {
            return format!("{query} site:{}", platform.site());
        }
    }

    let mut rewritten = format!("{query} {BOOKING_KEYWORDS}");
    if exclude_media {
        for site in EXCLUDED_SITES {
            rewritten.push_str(" -site:");
            rewritten.push_str(site);
        }
    }
    rewritten
}

/// Search entry points used by the agent's tools.
pub struct SearchAdapter {
    backend: Arc<dyn SearchBackend>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl SearchAdapter {
    pub fn new(backend: Arc<dyn SearchBackend>, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            backend,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub fn from_config(backend: Arc<dyn SearchBackend>, config: &SearchConfig) -> Self {
        Self::new(backend, config.max_attempts, config.retry_delay)
    }

    /// Single-shot search. Transport failures come back as `RawResult::Failed`.
    pub async fn search(&self, query: &str) -> RawResult {
        let query = rewrite_query(query, false);
        info!(query = %query, "Searching");

        match self.backend.fetch(&query).await {
            Ok(hits) => RawResult::hits(hits),
            Err(e) => {
                warn!(query = %query, error = %e, "Search failed");
                RawResult::failed(e.to_string())
            }
        }
    }

    /// Search with media-site exclusions, retrying empty or failed responses with a fixed delay.
    pub async fn multi_search(&self, query: &str) -> RawResult {
        let query = rewrite_query(query, true);
        info!(query = %query, "Multi-searching");

        let mut last_error = SearchError::Empty;
        for attempt in 1..=self.max_attempts {
            match self.backend.fetch(&query).await {
                Ok(hits) if !hits.is_empty() => {
                    info!(attempt, hits = hits.len(), "Multi-search succeeded");
                    return RawResult::hits(hits);
                }
                Ok(_) => {
                    warn!(attempt, "Multi-search returned no results");
                    last_error = SearchError::Empty;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Multi-search attempt failed");
                    last_error = e;
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        match last_error {
            SearchError::Empty => RawResult::failed(format!(
                "No meaningful results found after {} attempts",
                self.max_attempts
            )),
            e => RawResult::failed(format!("Failed after {} attempts: {e}", self.max_attempts)),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that replays scripted responses and records the queries it saw.
    #[derive(Default)]
    pub struct ScriptedBackend {
        responses: Mutex<VecDeque<Result<Vec<SearchHit>, SearchError>>>,
        pub queries: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        pub fn new(responses: Vec<Result<Vec<SearchHit>, SearchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.queries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SearchBackend for ScriptedBackend {
        async fn fetch(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
            self.queries.lock().unwrap().push(query.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Vec::new()))
        }
    }

    pub fn hit(title: &str, link: &str, snippet: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            link: link.to_string(),
            snippet: snippet.to_string(),
        }
    }
}
