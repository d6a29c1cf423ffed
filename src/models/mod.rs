use serde::{Deserialize, Serialize};

mod anime;
mod user_profile;

pub use anime::{split_genres, Anime, AnimeId, CatalogRow};
pub use user_profile::{ActionKind, ListKind, UserProfile};

/// Why an item was recommended; names the strategy that produced it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationReason {
    Hybrid,
    Wishlist,
    WatchedExploration,
    TopScoreFallback,
}

impl RecommendationReason {
    /// Human-readable explanation shown next to the item
    pub fn label(self) -> &'static str {
        match self {
            RecommendationReason::Hybrid => "A mix of your tastes (watched + wishlist)",
            RecommendationReason::Wishlist => "Similar to your wishlist",
            RecommendationReason::WatchedExploration => "Similar to what you've watched",
            RecommendationReason::TopScoreFallback => "Popular (top global score)",
        }
    }
}

/// Delivery state of a recommendation session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    QueueEmpty,
    QueueReady,
    /// Terminal until the session is reset
    Exhausted,
}

/// A catalog entry ranked against some query
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Row position in the catalog
    pub index: usize,
    pub name: String,
    pub score: f32,
}

// ============================================================================
// Metadata Lookup Types
// ============================================================================

const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x450?text=Image+Not+Available";

/// Display metadata for a catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnimeInfo {
    pub image_url: String,
    pub trailer_url: Option<String>,
    pub url: String,
}

impl AnimeInfo {
    /// Placeholder values used whenever the lookup fails
    pub fn fallback(id: AnimeId) -> Self {
        Self {
            image_url: PLACEHOLDER_IMAGE.to_string(),
            trailer_url: None,
            url: format!("https://myanimelist.net/anime/{}", id),
        }
    }
}

/// Raw response from Jikan `GET /anime/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct JikanAnimeResponse {
    #[serde(default)]
    pub data: JikanAnime,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JikanAnime {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub images: Option<JikanImages>,
    #[serde(default)]
    pub trailer: Option<JikanTrailer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanImages {
    #[serde(default)]
    pub jpg: Option<JikanImageSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanImageSet {
    #[serde(default)]
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanTrailer {
    #[serde(default)]
    pub embed_url: Option<String>,
}

impl AnimeInfo {
    /// Overlays whatever the API returned on top of the fallback values
    pub fn from_jikan(id: AnimeId, anime: JikanAnime) -> Self {
        let mut info = Self::fallback(id);

        if let Some(image) = anime
            .images
            .and_then(|i| i.jpg)
            .and_then(|jpg| jpg.large_image_url)
        {
            info.image_url = image;
        }

        info.trailer_url = anime.trailer.and_then(|t| t.embed_url);

        if let Some(url) = anime.url {
            info.url = url;
        }

        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_serialization() {
        let json = serde_json::to_string(&RecommendationReason::WatchedExploration).unwrap();
        assert_eq!(json, "\"watched-exploration\"");
        let json = serde_json::to_string(&RecommendationReason::TopScoreFallback).unwrap();
        assert_eq!(json, "\"top-score-fallback\"");
    }

    #[test]
    fn test_session_state_serialization() {
        let json = serde_json::to_string(&SessionState::QueueReady).unwrap();
        assert_eq!(json, "\"queue_ready\"");
    }

    #[test]
    fn test_fallback_info() {
        let info = AnimeInfo::fallback(4224);
        assert_eq!(info.url, "https://myanimelist.net/anime/4224");
        assert_eq!(info.trailer_url, None);
        assert!(info.image_url.contains("placeholder"));
    }

    #[test]
    fn test_from_jikan_full_payload() {
        let json = r#"{
            "data": {
                "url": "https://myanimelist.net/anime/4224/Toradora",
                "images": { "jpg": { "large_image_url": "https://cdn.myanimelist.net/4224l.jpg" } },
                "trailer": { "embed_url": "https://www.youtube.com/embed/abc" }
            }
        }"#;
        let response: JikanAnimeResponse = serde_json::from_str(json).unwrap();
        let info = AnimeInfo::from_jikan(4224, response.data);

        assert_eq!(info.image_url, "https://cdn.myanimelist.net/4224l.jpg");
        assert_eq!(
            info.trailer_url.as_deref(),
            Some("https://www.youtube.com/embed/abc")
        );
        assert_eq!(info.url, "https://myanimelist.net/anime/4224/Toradora");
    }

    #[test]
    fn test_from_jikan_keeps_defaults_for_missing_fields() {
        let json = r#"{ "data": { "trailer": { "embed_url": null } } }"#;
        let response: JikanAnimeResponse = serde_json::from_str(json).unwrap();
        let info = AnimeInfo::from_jikan(7, response.data);

        assert_eq!(info, AnimeInfo::fallback(7));
    }
}
