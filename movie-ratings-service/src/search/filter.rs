//! Pruning of search hits down to ticket-booking content.

use tracing::{debug, info};

use super::{RawResult, SearchHit};

/// Tokens marking a hit as booking-platform content
const BOOKING_TOKENS: &[&str] = &[
    "bookmyshow.com",
    "paytm.com",
    "pvrcinemas.com",
    "inoxmovies.com",
    "cinepolisindia.com",
    "bookmyshow",
    "paytm",
    "pvr",
    "inox",
    "cinepolis",
    "ticketnew.com",
    "justickets.in",
    "moviemax.in",
    "easymovies.in",
    "ticketplease.com",
    "movietickets.com",
    "fandango.com",
    "marcustheatres.com",
    "amc",
    "regal",
    "cinemark",
    "ticket",
    "booking",
    "showtime",
    "show time",
    "movie ticket",
];

/// General news and review outlets whose numbers are not platform ratings
const MEDIA_DOMAINS: &[&str] = &[
    "timesofindia.com",
    "123telugu.com",
    "ndtv.com",
    "hindustantimes.com",
    "indiatoday.in",
    "thehindu.com",
    "indianexpress.com",
    "imdb.com",
    "rottentomatoes.com",
    "filmfare.com",
    "bollywoodhungama.com",
    "koimoi.com",
    "pinkvilla.com",
    "filmibeat.com",
    "bollywoodlife.com",
    "zeenews.com",
    "news18.com",
    "republic.in",
    "abplive.com",
    "aajtak.in",
];

const RELAXED_KEYWORDS: &[&str] = &["movie", "rating", "review"];

/// Below this many strict survivors the relaxed pass takes over
const MIN_STRICT_HITS: usize = 2;

struct LoweredHit {
    link: String,
    title: String,
    snippet: String,
}

impl LoweredHit {
    fn new(hit: &SearchHit) -> Self {
        Self {
            link: hit.link.to_lowercase(),
            title: hit.title.to_lowercase(),
            snippet: hit.snippet.to_lowercase(),
        }
    }

    fn mentions_any(&self, tokens: &[&str]) -> bool {
        tokens.iter().any(|t| {
            self.link.contains(t) || self.title.contains(t) || self.snippet.contains(t)
        })
    }

    fn is_strict_match(&self) -> bool {
        self.mentions_any(BOOKING_TOKENS) && !self.mentions_any(MEDIA_DOMAINS)
    }

    fn is_relaxed_match(&self) -> bool {
        let excluded = MEDIA_DOMAINS.iter().any(|d| self.link.contains(d));
        let on_topic = RELAXED_KEYWORDS
            .iter()
            .any(|k| self.title.contains(k) || self.snippet.contains(k));
        !excluded && on_topic
    }
}

/// Keep booking-platform hits; falls back to a relaxed pass when the strict one starves.
pub fn filter_hits(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let original_count = hits.len();
    let lowered: Vec<LoweredHit> = hits.iter().map(LoweredHit::new).collect();

    let strict_count = lowered.iter().filter(|h| h.is_strict_match()).count();
    let relaxed = strict_count < MIN_STRICT_HITS && original_count > 0;
    if relaxed {
        info!(
            strict_count,
            original_count, "Too few results after strict filtering, relaxing"
        );
    }

    let kept: Vec<SearchHit> = hits
        .into_iter()
        .zip(lowered)
        .filter(|(hit, lowered)| {
            let keep = if relaxed {
                lowered.is_relaxed_match()
            } else {
                lowered.is_strict_match()
            };
            debug!(keep, link = %hit.link, "Filtered search hit");
            keep
        })
        .map(|(hit, _)| hit)
        .collect();

    info!(kept = kept.len(), original_count, "Filtered search results");
    kept
}

/// Filter the hits of a raw result; error results pass through untouched.
pub fn filter_results(raw: RawResult) -> RawResult {
    match raw {
        RawResult::Hits { organic } => RawResult::hits(filter_hits(organic)),
        failed @ RawResult::Failed { .. } => failed,
    }
}
