use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of ticket-booking platforms ratings are collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "BookMyShow")]
    BookMyShow,
    #[serde(rename = "Paytm")]
    Paytm,
    #[serde(rename = "PVR Cinemas")]
    PvrCinemas,
    #[serde(rename = "INOX Movies")]
    InoxMovies,
    #[serde(rename = "Cinepolis")]
    Cinepolis,
}

impl Platform {
    /// Canonical order, used whenever a full set is emitted
    pub const ALL: [Platform; 5] = [
        Platform::BookMyShow,
        Platform::Paytm,
        Platform::PvrCinemas,
        Platform::InoxMovies,
        Platform::Cinepolis,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Platform::BookMyShow => "BookMyShow",
            Platform::Paytm => "Paytm",
            Platform::PvrCinemas => "PVR Cinemas",
            Platform::InoxMovies => "INOX Movies",
            Platform::Cinepolis => "Cinepolis",
        }
    }

    /// Booking site used for `site:` restricted searches
    pub fn site(self) -> &'static str {
        match self {
            Platform::BookMyShow => "bookmyshow.com",
            Platform::Paytm => "paytm.com",
            Platform::PvrCinemas => "pvrcinemas.com",
            Platform::InoxMovies => "inoxmovies.com",
            Platform::Cinepolis => "cinepolisindia.com",
        }
    }

    /// Lowercase token that identifies the platform inside free text
    pub fn token(self) -> &'static str {
        match self {
            Platform::BookMyShow => "bookmyshow",
            Platform::Paytm => "paytm",
            Platform::PvrCinemas => "pvr",
            Platform::InoxMovies => "inox",
            Platform::Cinepolis => "cinepolis",
        }
    }

    /// Resolve a loosely written platform name ("PVR", "bookmyshow.com", "INOX Movies").
    pub fn resolve(name: &str) -> Option<Platform> {
        let lowered = name.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }
        let squashed: String = lowered.chars().filter(|c| !c.is_whitespace()).collect();
        Platform::ALL
            .into_iter()
            .find(|p| squashed.contains(p.token()))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One platform's rating for the queried movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRating {
    pub platform: Platform,
    pub movie_title: String,
    pub movie_rating: f64,
    pub type_of_movie: String,
    pub positive_review_percentage: i64,
    pub negative_review_percentage: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieRatingRequest {
    pub movie_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieRatingResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Vec<PlatformRating>,
}

impl MovieRatingResponse {
    pub fn success(data: Vec<PlatformRating>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: None,
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: Some(message.into()),
            data: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn platforms_resolve_from_loose_names() {
        assert_eq!(Platform::resolve("PVR"), Some(Platform::PvrCinemas));
        assert_eq!(Platform::resolve("  inox movies "), Some(Platform::InoxMovies));
        assert_eq!(Platform::resolve("Book My Show"), Some(Platform::BookMyShow));
        assert_eq!(Platform::resolve("paytm.com"), Some(Platform::Paytm));
        assert_eq!(Platform::resolve("Cinepolis India"), Some(Platform::Cinepolis));
        assert_eq!(Platform::resolve("Fandango"), None);
        assert_eq!(Platform::resolve(""), None);
    }

    #[test]
    fn response_serializes_to_the_wire_shape() {
        let response = MovieRatingResponse::success(vec![PlatformRating {
            platform: Platform::PvrCinemas,
            movie_title: "Dune: Part Two".into(),
            movie_rating: 9.0,
            type_of_movie: "Sci-Fi, Adventure".into(),
            positive_review_percentage: 87,
            negative_review_percentage: 13,
        }]);

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "status": "success",
                "data": [{
                    "platform": "PVR Cinemas",
                    "movie_title": "Dune: Part Two",
                    "movie_rating": 9.0,
                    "type_of_movie": "Sci-Fi, Adventure",
                    "positive_review_percentage": 87,
                    "negative_review_percentage": 13
                }]
            })
        );

        let error = serde_json::to_value(MovieRatingResponse::error("boom")).unwrap();
        assert_eq!(error, json!({"status": "error", "message": "boom", "data": []}));
    }
}
