//! Read-through cache of successful rating sets, keyed by normalized movie name.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::PlatformRating;

/// Trimmed, lowercased, with inner whitespace runs collapsed to one space.
pub fn cache_key(movie_name: &str) -> String {
    movie_name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
struct CachedRatings {
    stored_at: Instant,
    ratings: Vec<PlatformRating>,
}

/// Entries expire after `ttl`; at most `capacity` are held, oldest evicted first.
#[derive(Debug)]
pub struct RatingsCache {
    entries: DashMap<String, CachedRatings>,
    ttl: Duration,
    capacity: usize,
}

impl RatingsCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, movie_name: &str) -> Option<Vec<PlatformRating>> {
        self.get_at(movie_name, Instant::now())
    }

    pub fn insert(&self, movie_name: &str, ratings: Vec<PlatformRating>) {
        self.insert_at(movie_name, ratings, Instant::now());
    }

    fn get_at(&self, movie_name: &str, now: Instant) -> Option<Vec<PlatformRating>> {
        let key = cache_key(movie_name);
        {
            // the read guard must be released before `remove` takes the shard lock
            let entry = self.entries.get(&key)?;
            if now.saturating_duration_since(entry.stored_at) < self.ttl {
                debug!(key = %key, "Ratings cache hit");
                return Some(entry.ratings.clone());
            }
        }

        debug!(key = %key, "Evicting expired ratings");
        self.entries.remove(&key);
        None
    }

    fn insert_at(&self, movie_name: &str, ratings: Vec<PlatformRating>, now: Instant) {
        let key = cache_key(movie_name);
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) < self.ttl);

        while !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|entry| entry.stored_at)
                .map(|entry| entry.key().clone())
            else {
                break;
            };
            debug!(key = %oldest, "Evicting oldest ratings to stay within capacity");
            self.entries.remove(&oldest);
        }

        self.entries.insert(
            key,
            CachedRatings {
                stored_at: now,
                ratings,
            },
        );
    }
}
