//! Content-based recommendation core
//!
//! The catalog and its fitted vector model are built once and shared
//! read-only by every session; each session owns its own profile and queue.

use crate::{error::AppResult, models::Candidate, services::catalog::Catalog};

pub mod orchestrator;
pub mod similarity;
pub mod strategies;
pub mod vectorizer;

pub use orchestrator::{Recommendation, RecommendationSession, SessionSettings};
pub use vectorizer::VectorModel;

/// Catalog plus the vector model fitted on it
///
/// The two are built together and never mutated, which keeps matrix rows
/// aligned with catalog positions.
#[derive(Debug)]
pub struct RecommendationEngine {
    catalog: Catalog,
    model: VectorModel,
}

impl RecommendationEngine {
    /// Fits the vector model over the catalog's fusion text
    ///
    /// Fails with `InvalidInput` on an empty catalog.
    pub fn new(catalog: Catalog) -> AppResult<Self> {
        let model = VectorModel::fit(&catalog.fusion_texts())?;
        Ok(Self { catalog, model })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn model(&self) -> &VectorModel {
        &self.model
    }

    /// Turns ranked `(index, score)` pairs into named candidates
    fn candidates(&self, ranked: impl IntoIterator<Item = (usize, f32)>) -> Vec<Candidate> {
        ranked
            .into_iter()
            .filter_map(|(index, score)| {
                self.catalog.get(index).map(|anime| Candidate {
                    index,
                    name: anime.name.clone(),
                    score,
                })
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::RecommendationEngine;
    use crate::{models::Anime, services::catalog::Catalog};

    /// Engine over `(name, score, synopsis)` entries, all tagged Romance
    pub(crate) fn engine(entries: &[(&str, Option<f32>, &str)]) -> RecommendationEngine {
        let entries = entries
            .iter()
            .enumerate()
            .map(|(i, (name, score, synopsis))| Anime {
                id: i as u64 + 1,
                name: name.to_string(),
                genres: vec!["Romance".to_string()],
                synopsis: synopsis.to_string(),
                score: *score,
            })
            .collect();
        RecommendationEngine::new(Catalog::new(entries)).unwrap()
    }

    pub(crate) fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }
}
