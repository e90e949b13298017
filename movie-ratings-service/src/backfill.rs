//! Synthetic ratings for platforms the agent could not cover.

use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::models::{Platform, PlatformRating};
use crate::normalize::{DEFAULT_GENRE, MAX_RATING, MIN_RATING, clamp_rating, round_rating};

#[derive(Debug, Error, PartialEq)]
pub enum SynthesisError {
    #[error("invalid synthesis configuration: {0}")]
    InvalidConfig(String),

    #[error("synthesized set is missing platforms: {missing:?}")]
    Incomplete { missing: Vec<Platform> },
}

/// Shape of the synthetic rating distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisConfig {
    pub base_min: f64,
    pub base_max: f64,
    /// Maximum per-platform offset from the base rating
    pub jitter: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_min: 7.5,
            base_max: 9.0,
            jitter: 0.5,
        }
    }
}

impl SynthesisConfig {
    pub fn validate(&self) -> Result<(), SynthesisError> {
        let Self {
            base_min,
            base_max,
            jitter,
        } = *self;

        if !(base_min.is_finite() && base_max.is_finite() && jitter.is_finite()) {
            return Err(SynthesisError::InvalidConfig("values must be finite".to_string()));
        }
        if base_min > base_max {
            return Err(SynthesisError::InvalidConfig(format!(
                "base range {base_min}..={base_max} is inverted"
            )));
        }
        if base_min < MIN_RATING || base_max > MAX_RATING {
            return Err(SynthesisError::InvalidConfig(format!(
                "base range {base_min}..={base_max} leaves {MIN_RATING}..={MAX_RATING}"
            )));
        }
        if jitter < 0.0 {
            return Err(SynthesisError::InvalidConfig(format!("negative jitter {jitter}")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BackfillGenerator {
    config: SynthesisConfig,
}

impl BackfillGenerator {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    /// Complete `existing` so every target platform appears exactly once, in target order.
    ///
    /// Genuine records are kept as they are. The first genuine record, if any, lends its title,
    /// genre and review split to the synthesized ones.
    pub fn backfill<R: Rng + ?Sized>(
        &self,
        existing: Vec<PlatformRating>,
        targets: &[Platform],
        movie_name: &str,
        rng: &mut R,
    ) -> Result<Vec<PlatformRating>, SynthesisError> {
        self.config.validate()?;

        let template = existing.first().cloned();
        let base = round_rating(rng.random_range(self.config.base_min..=self.config.base_max));
        let jitter = self.config.jitter;

        let mut unique_targets: Vec<Platform> = Vec::with_capacity(targets.len());
        for &platform in targets {
            if !unique_targets.contains(&platform) {
                unique_targets.push(platform);
            }
        }
        let targets = unique_targets;

        let mut synthesized = 0usize;
        let mut ratings = Vec::with_capacity(targets.len());
        for &platform in &targets {
            if let Some(genuine) = existing.iter().find(|r| r.platform == platform) {
                ratings.push(genuine.clone());
                continue;
            }

            let movie_rating = clamp_rating(base + rng.random_range(-jitter..=jitter));
            let rating = match &template {
                Some(template) => PlatformRating {
                    platform,
                    movie_title: template.movie_title.clone(),
                    movie_rating,
                    type_of_movie: template.type_of_movie.clone(),
                    positive_review_percentage: template.positive_review_percentage,
                    negative_review_percentage: template.negative_review_percentage,
                },
                None => {
                    // one decimal place, so rating * 10 is already whole
                    let positive = ((movie_rating * 10.0).round() as i64).clamp(0, 100);
                    PlatformRating {
                        platform,
                        movie_title: movie_name.to_string(),
                        movie_rating,
                        type_of_movie: DEFAULT_GENRE.to_string(),
                        positive_review_percentage: positive,
                        negative_review_percentage: 100 - positive,
                    }
                }
            };
            ratings.push(rating);
            synthesized += 1;
        }

        let missing: Vec<Platform> = targets
            .iter()
            .copied()
            .filter(|p| ratings.iter().filter(|r| r.platform == *p).count() != 1)
            .collect();
        if !missing.is_empty() {
            return Err(SynthesisError::Incomplete { missing });
        }

        info!(
            movie = movie_name,
            base,
            synthesized,
            genuine = ratings.len() - synthesized,
            "Backfilled platform ratings"
        );
        Ok(ratings)
    }
}
