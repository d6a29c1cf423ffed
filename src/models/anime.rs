use serde::{Deserialize, Deserializer, Serialize};

/// MyAnimeList identifier of a catalog entry
pub type AnimeId = u64;

/// Sentinel the dataset uses for a missing score
const UNKNOWN_SCORE: &str = "unknown";

/// A single catalog entry, immutable once loaded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anime {
    pub id: AnimeId,
    pub name: String,
    pub genres: Vec<String>,
    pub synopsis: String,
    /// `None` when the dataset marks the score as unknown
    pub score: Option<f32>,
}

impl Anime {
    /// Text vectorized for similarity: genres, synopsis and name
    pub fn fusion_text(&self) -> String {
        format!("{} {} {}", self.genres.join(", "), self.synopsis, self.name)
    }
}

/// Row of the cleaned catalog CSV, using the dataset's own column names
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRow {
    #[serde(rename = "MAL_ID")]
    pub mal_id: AnimeId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Score", deserialize_with = "deserialize_score")]
    pub score: Option<f32>,
    #[serde(rename = "Genres")]
    pub genres: String,
    #[serde(rename = "sypnopsis")]
    pub synopsis: String,
}

impl From<CatalogRow> for Anime {
    fn from(row: CatalogRow) -> Self {
        Anime {
            id: row.mal_id,
            name: row.name,
            genres: split_genres(&row.genres),
            synopsis: row.synopsis,
            score: row.score,
        }
    }
}

/// Splits a `"Comedy, Romance"` cell into trimmed tags
pub fn split_genres(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case(UNKNOWN_SCORE) {
        return Ok(None);
    }
    raw.parse::<f32>()
        .map(Some)
        .map_err(|_| serde::de::Error::custom(format!("invalid score '{}'", raw)))
}
