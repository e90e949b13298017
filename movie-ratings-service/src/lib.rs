pub mod backfill;
pub mod cache;
pub mod chat_bridge;
pub mod config;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod ratings;
pub mod search;
pub mod service;
pub mod tasks;
pub mod workflow;

pub use backfill::{BackfillGenerator, SynthesisConfig, SynthesisError};
pub use cache::RatingsCache;
pub use config::{ConfigError, ServiceConfig};
pub use error::RatingsError;
pub use llm::{ChatModel, ModelError, ModelReply, OpenRouterChatModel, ToolSpec};
pub use models::*;
pub use pipeline::{RatingPipeline, RatingSet};
pub use ratings::RatingsService;
pub use search::{RawResult, SearchAdapter, SearchBackend, SearchError, SearchHit, SerperBackend};
pub use service::{AppState, build_router, create_app};
pub use workflow::{build_ratings_workflow, run_agent_loop};
