use agent_flow::GraphError;
use thiserror::Error;

use crate::backfill::SynthesisError;
use crate::extraction::ExtractionError;

/// Everything that can go wrong while producing a movie's ratings.
///
/// Only `Synthesis` reaches the caller; the other variants make the service fall back to
/// synthetic data.
#[derive(Debug, Error)]
pub enum RatingsError {
    #[error("agent loop failed: {0}")]
    AgentLoop(#[from] GraphError),

    #[error("model declined to provide ratings")]
    RefusalDetected,

    #[error("malformed model output: {0}")]
    MalformedOutput(#[from] ExtractionError),

    #[error("failed to synthesize ratings: {0}")]
    Synthesis(#[from] SynthesisError),
}

impl RatingsError {
    /// Whether the service recovers from this error with synthetic ratings
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RatingsError::Synthesis(_))
    }
}
