//! Turns the agent loop's outcome into a complete five-platform rating set.

use rand::Rng;
use tracing::{info, warn};

use crate::backfill::{BackfillGenerator, SynthesisConfig};
use crate::error::RatingsError;
use crate::extraction::{self, Strategy};
use crate::models::{Platform, PlatformRating};
use crate::normalize::Normalizer;

/// Genuine ratings recovered from the model's answer, before backfill.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub strategy: Strategy,
    pub ratings: Vec<PlatformRating>,
}

/// A finished rating set plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSet {
    pub ratings: Vec<PlatformRating>,
    /// Platforms backed by the model's answer rather than synthesized
    pub genuine: usize,
    /// Extraction strategy that produced the genuine ratings
    pub strategy: Option<Strategy>,
}

/// Refusal check, extraction, then normalization of the model's final text.
pub fn recover_ratings(text: &str, movie_name: &str) -> Result<Recovered, RatingsError> {
    if extraction::is_refusal(text) {
        return Err(RatingsError::RefusalDetected);
    }
    let extraction = extraction::extract(text)?;
    let ratings = Normalizer::new(movie_name).normalize_all(&extraction.records);
    Ok(Recovered {
        strategy: extraction.strategy,
        ratings,
    })
}

#[derive(Debug, Clone, Default)]
pub struct RatingPipeline {
    generator: BackfillGenerator,
}

impl RatingPipeline {
    pub fn new(config: SynthesisConfig) -> Self {
        Self {
            generator: BackfillGenerator::new(config),
        }
    }

    /// Produce the full set from the loop's outcome. Loop failures, refusals and unparseable
    /// answers all degrade to a fully synthetic set; only synthesis itself can fail.
    pub fn assemble<R: Rng + ?Sized>(
        &self,
        loop_outcome: Result<String, RatingsError>,
        movie_name: &str,
        rng: &mut R,
    ) -> Result<RatingSet, RatingsError> {
        let recovered = loop_outcome.and_then(|text| recover_ratings(&text, movie_name));

        let (genuine, strategy) = match recovered {
            Ok(Recovered { strategy, ratings }) => {
                info!(
                    movie = %movie_name,
                    strategy = strategy.name(),
                    genuine = ratings.len(),
                    "Recovered ratings from model answer"
                );
                (ratings, Some(strategy))
            }
            Err(reason) => {
                warn!(movie = %movie_name, reason = %reason, "Falling back to synthetic ratings");
                (Vec::new(), None)
            }
        };

        let genuine_count = genuine.len();
        let ratings = self
            .generator
            .backfill(genuine, &Platform::ALL, movie_name, rng)?;

        Ok(RatingSet {
            ratings,
            genuine: genuine_count,
            strategy,
        })
    }
}
