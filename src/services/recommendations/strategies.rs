use std::collections::HashSet;

use rand::{seq::SliceRandom, Rng};

use crate::{
    error::{AppError, AppResult},
    models::Candidate,
    services::catalog::Catalog,
};

use super::{
    similarity::{by_score_then_index, mean_of_rows, rank, weighted_sum},
    RecommendationEngine,
};

/// Ranked candidates considered by the exploration strategy
pub const EXPLORATION_POOL: usize = 50;
/// Top exploration hits skipped as near-duplicates of the seeds
pub const EXPLORATION_SKIP: usize = 3;
pub const HYBRID_WISHLIST_WEIGHT: f32 = 3.0;
pub const HYBRID_WATCHED_WEIGHT: f32 = 1.0;
/// Default size of a single-title similarity list
pub const SIMILAR_DEFAULT: usize = 5;

fn name_set(names: &[String]) -> HashSet<&str> {
    names.iter().map(String::as_str).collect()
}

fn without(candidates: Vec<Candidate>, excluded: &HashSet<&str>) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| !excluded.contains(c.name.as_str()))
        .collect()
}

impl RecommendationEngine {
    /// Entries closest to the mean of the wishlist rows
    ///
    /// Unknown names are dropped. Empty when no name resolves. Wishlist
    /// members never appear in the result.
    pub fn by_wishlist(&self, wishlist: &[String]) -> AppResult<Vec<Candidate>> {
        let indices = self.catalog().resolve(wishlist);
        if indices.is_empty() {
            return Ok(Vec::new());
        }

        let query = mean_of_rows(self.model(), &indices);
        let ranked = rank(&query, self.model())?;

        Ok(without(self.candidates(ranked), &name_set(wishlist)))
    }

    /// Exploration around the watched history
    ///
    /// Takes the best `EXPLORATION_POOL` matches to the mean of the watched
    /// rows, drops the first `EXPLORATION_SKIP` and shuffles the rest with
    /// `rng`. Watched entries never appear in the result.
    pub fn by_watched<R: Rng + ?Sized>(
        &self,
        watched: &[String],
        rng: &mut R,
    ) -> AppResult<Vec<Candidate>> {
        let indices = self.catalog().resolve(watched);
        if indices.is_empty() {
            return Ok(Vec::new());
        }

        let query = mean_of_rows(self.model(), &indices);
        let ranked = rank(&query, self.model())?;

        let mut pool = self.candidates(
            ranked
                .into_iter()
                .take(EXPLORATION_POOL)
                .skip(EXPLORATION_SKIP),
        );
        pool.shuffle(rng);

        Ok(without(pool, &name_set(watched)))
    }

    /// Blend of both signals: `3 × Σ wishlist rows + 1 × Σ watched rows`
    ///
    /// Empty unless both lists resolve to at least one entry. Members of
    /// either list never appear in the result.
    pub fn hybrid(&self, wishlist: &[String], watched: &[String]) -> AppResult<Vec<Candidate>> {
        let wishlist_indices = self.catalog().resolve(wishlist);
        let watched_indices = self.catalog().resolve(watched);
        if wishlist_indices.is_empty() || watched_indices.is_empty() {
            return Ok(Vec::new());
        }

        let query = weighted_sum(
            self.model(),
            &[
                (wishlist_indices.as_slice(), HYBRID_WISHLIST_WEIGHT),
                (watched_indices.as_slice(), HYBRID_WATCHED_WEIGHT),
            ],
        );
        let ranked = rank(&query, self.model())?;

        let mut excluded = name_set(wishlist);
        excluded.extend(watched.iter().map(String::as_str));

        Ok(without(self.candidates(ranked), &excluded))
    }

    /// The `limit` entries most similar to a single title, itself excluded
    pub fn similar_to(&self, name: &str, limit: usize) -> AppResult<Vec<Candidate>> {
        let index = self
            .catalog()
            .index_of(name)
            .ok_or_else(|| AppError::NotFound(format!("Anime '{}'", name)))?;

        let query = mean_of_rows(self.model(), &[index]);
        let ranked = rank(&query, self.model())?;

        Ok(self
            .candidates(ranked)
            .into_iter()
            .filter(|c| c.name != name)
            .take(limit)
            .collect())
    }
}

/// Cold-start ranking by catalog score; needs no vector model
///
/// Entries with an unknown score are left out. Equal scores keep catalog
/// order. The candidate's `score` is the catalog score.
pub fn top_score(catalog: &Catalog, limit: usize) -> Vec<Candidate> {
    let mut scored: Vec<Candidate> = catalog
        .entries()
        .iter()
        .enumerate()
        .filter_map(|(index, anime)| {
            anime.score.map(|score| Candidate {
                index,
                name: anime.name.clone(),
                score,
            })
        })
        .collect();

    scored.sort_by(|a, b| by_score_then_index(a.score, a.index, b.score, b.index));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::recommendations::test_support::{engine, names};
    use rand::{rngs::StdRng, SeedableRng};

    fn abc() -> RecommendationEngine {
        engine(&[
            ("A", Some(9.0), "childhood friends festival fireworks confession"),
            ("B", Some(7.5), "childhood friends festival summer"),
            ("C", None, "friends cooking contest"),
        ])
    }

    fn large() -> RecommendationEngine {
        let synopses: Vec<String> = (0..80)
            .map(|i| format!("shared story topic{} detail{}", i % 7, i))
            .collect();
        let entries: Vec<(String, Option<f32>, String)> = synopses
            .into_iter()
            .enumerate()
            .map(|(i, s)| (format!("Title{}", i), Some(i as f32 / 10.0), s))
            .collect();
        let borrowed: Vec<(&str, Option<f32>, &str)> = entries
            .iter()
            .map(|(n, sc, s)| (n.as_str(), *sc, s.as_str()))
            .collect();
        engine(&borrowed)
    }

    fn result_names(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_by_wishlist_orders_by_similarity() {
        let engine = abc();
        let result = engine.by_wishlist(&names(&["A"])).unwrap();
        assert_eq!(result_names(&result), vec!["B", "C"]);
    }

    #[test]
    fn test_by_wishlist_drops_unknown_names() {
        let engine = abc();
        let result = engine.by_wishlist(&names(&["A", "Missing"])).unwrap();
        assert_eq!(result_names(&result), vec!["B", "C"]);

        assert!(engine.by_wishlist(&names(&["Missing"])).unwrap().is_empty());
        assert!(engine.by_wishlist(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_by_wishlist_is_idempotent() {
        let engine = large();
        let wishlist = names(&["Title3", "Title10"]);
        let first = engine.by_wishlist(&wishlist).unwrap();
        let second = engine.by_wishlist(&wishlist).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_by_watched_skips_nearest_and_shuffles_pool() {
        let engine = large();
        let watched = names(&["Title5"]);

        let ranked = rank(&mean_of_rows(engine.model(), &[5]), engine.model()).unwrap();
        let expected: HashSet<String> = ranked
            .iter()
            .take(EXPLORATION_POOL)
            .skip(EXPLORATION_SKIP)
            .map(|(i, _)| engine.catalog().get(*i).unwrap().name.clone())
            .filter(|n| n != "Title5")
            .collect();

        let mut rng = StdRng::seed_from_u64(7);
        let result = engine.by_watched(&watched, &mut rng).unwrap();
        let got: HashSet<String> = result.iter().map(|c| c.name.clone()).collect();

        assert_eq!(got, expected);
        assert_eq!(result.len(), EXPLORATION_POOL - EXPLORATION_SKIP);
        assert!(!got.contains("Title5"));
    }

    #[test]
    fn test_by_watched_is_reproducible_with_seed() {
        let engine = large();
        let watched = names(&["Title1", "Title2"]);

        let first = engine
            .by_watched(&watched, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let second = engine
            .by_watched(&watched, &mut StdRng::seed_from_u64(42))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_by_watched_excludes_seeds_inside_pool() {
        let engine = large();
        // Enough seeds that some of them rank below the skipped head
        let watched: Vec<String> = (0..10).map(|i| format!("Title{}", i * 7)).collect();
        let result = engine
            .by_watched(&watched, &mut StdRng::seed_from_u64(1))
            .unwrap();

        let excluded = name_set(&watched);
        assert!(result.iter().all(|c| !excluded.contains(c.name.as_str())));
    }

    #[test]
    fn test_hybrid_requires_both_lists() {
        let engine = abc();
        assert!(engine.hybrid(&[], &names(&["B"])).unwrap().is_empty());
        assert!(engine.hybrid(&names(&["A"]), &[]).unwrap().is_empty());
        assert!(engine
            .hybrid(&names(&["A"]), &names(&["Missing"]))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_hybrid_excludes_both_lists() {
        let engine = abc();
        let result = engine.hybrid(&names(&["A"]), &names(&["B"])).unwrap();
        assert_eq!(result_names(&result), vec!["C"]);
    }

    #[test]
    fn test_hybrid_counts_watched_signal() {
        let engine = engine(&[
            ("Wish", None, "magic academy witches"),
            ("Seen", None, "baseball team summer tournament"),
            ("MagicOnly", None, "magic academy"),
            ("SportOnly", None, "baseball tournament"),
            ("Unrelated", None, "cooking contest"),
        ]);
        let result = engine
            .hybrid(&names(&["Wish"]), &names(&["Seen"]))
            .unwrap();

        let sport = result.iter().find(|c| c.name == "SportOnly").unwrap();
        let unrelated = result.iter().find(|c| c.name == "Unrelated").unwrap();
        assert!(sport.score > unrelated.score);
        assert_eq!(result[0].name, "MagicOnly");
    }

    #[test]
    fn test_similar_to() {
        let engine = abc();
        let result = engine.similar_to("A", SIMILAR_DEFAULT).unwrap();
        assert_eq!(result_names(&result), vec!["B", "C"]);

        let limited = engine.similar_to("A", 1).unwrap();
        assert_eq!(result_names(&limited), vec!["B"]);

        assert!(matches!(
            engine.similar_to("Missing", 5),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_top_score_skips_unknown() {
        let engine = abc();
        let result = top_score(engine.catalog(), 2);
        assert_eq!(result_names(&result), vec!["A", "B"]);
        assert_eq!(result[0].score, 9.0);

        let all = top_score(engine.catalog(), 10);
        assert_eq!(result_names(&all), vec!["A", "B"]);
    }

    #[test]
    fn test_top_score_ties_keep_catalog_order() {
        let engine = engine(&[
            ("First", Some(8.0), "a story"),
            ("Second", Some(9.0), "another story"),
            ("Third", Some(8.0), "third story"),
        ]);
        let result = top_score(engine.catalog(), 3);
        assert_eq!(result_names(&result), vec!["Second", "First", "Third"]);
    }
}
