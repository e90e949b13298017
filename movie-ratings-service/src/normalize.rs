//! Coercion of loosely-shaped records into `PlatformRating`.

use serde_json::Value;

use crate::extraction::RawRecord;
use crate::models::{Platform, PlatformRating};

pub const DEFAULT_GENRE: &str = "Drama, Action";
pub const DEFAULT_RATING: f64 = 8.0;
pub const DEFAULT_POSITIVE_PERCENTAGE: i64 = 80;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 10.0;

/// Round to one decimal place.
pub fn round_rating(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn clamp_rating(value: f64) -> f64 {
    round_rating(value.clamp(MIN_RATING, MAX_RATING))
}

fn as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Integers pass through; floats and numeric strings are truncated.
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)),
        Value::String(_) => as_f64(value).map(|v| v.trunc() as i64),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Fills missing fields and enforces rating invariants for one movie's records.
pub struct Normalizer<'a> {
    movie_name: &'a str,
}

impl<'a> Normalizer<'a> {
    pub fn new(movie_name: &'a str) -> Self {
        Self { movie_name }
    }

    /// Total: any record becomes a valid rating. `fallback` is used when the record's platform
    /// field is missing or names no known platform.
    pub fn normalize(&self, raw: &RawRecord, fallback: Platform) -> PlatformRating {
        let platform = raw
            .get("platform")
            .and_then(Value::as_str)
            .and_then(Platform::resolve)
            .unwrap_or(fallback);

        let movie_rating = clamp_rating(raw.get("movie_rating").and_then(as_f64).unwrap_or(DEFAULT_RATING));

        let positive_review_percentage = raw
            .get("positive_review_percentage")
            .and_then(as_i64)
            .unwrap_or(DEFAULT_POSITIVE_PERCENTAGE)
            .clamp(0, 100);

        PlatformRating {
            platform,
            movie_title: raw
                .get("movie_title")
                .and_then(as_text)
                .unwrap_or_else(|| self.movie_name.to_string()),
            movie_rating,
            type_of_movie: raw
                .get("type_of_movie")
                .and_then(as_text)
                .unwrap_or_else(|| DEFAULT_GENRE.to_string()),
            positive_review_percentage,
            negative_review_percentage: 100 - positive_review_percentage,
        }
    }

    /// Normalize a batch, keeping at most one rating per platform.
    ///
    /// Records naming a platform claim it first (earliest wins). Records with no recognizable
    /// platform then fill the unclaimed platforms in canonical order; any left over are dropped.
    pub fn normalize_all(&self, raws: &[RawRecord]) -> Vec<PlatformRating> {
        let mut claimed: Vec<PlatformRating> = Vec::with_capacity(Platform::ALL.len());
        let mut unnamed = Vec::new();

        for raw in raws {
            match raw.get("platform").and_then(Value::as_str).and_then(Platform::resolve) {
                Some(platform) if claimed.iter().any(|r| r.platform == platform) => {
                    tracing::debug!(%platform, "Dropping duplicate platform record");
                }
                Some(platform) => claimed.push(self.normalize(raw, platform)),
                None => unnamed.push(raw),
            }
        }

        for raw in unnamed {
            let Some(open) = Platform::ALL
                .into_iter()
                .find(|p| !claimed.iter().any(|r| r.platform == *p))
            else {
                break;
            };
            claimed.push(self.normalize(raw, open));
        }

        claimed
    }
}
