use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    error::AppResult,
    models::{ActionKind, Anime, Candidate, ListKind, RecommendationReason, SessionState, UserProfile},
};

use super::{strategies::top_score, RecommendationEngine};

/// Per-session tuning
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Seed for the exploration shuffle; `None` seeds from entropy
    pub exploration_seed: Option<u64>,
    /// Eligible top-score entries enqueued per cold-start refill
    pub fallback_pool_size: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            exploration_seed: None,
            fallback_pool_size: 150,
        }
    }
}

/// An item handed to the user, with the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub anime: Anime,
    pub reason: RecommendationReason,
}

/// One user's recommendation session
///
/// Owns the profile and the pending queue. Any profile change clears the
/// queue, and the next delivery recomputes it from the strategy that fits
/// the current signals. Every delivered name is remembered until `reset`,
/// so no item is shown twice. Queued names are re-checked against the
/// excluded and delivered sets when popped.
pub struct RecommendationSession {
    engine: Arc<RecommendationEngine>,
    settings: SessionSettings,
    profile: UserProfile,
    queue: VecDeque<String>,
    queue_reason: RecommendationReason,
    current: Option<Recommendation>,
    delivered: HashSet<String>,
    exhausted: bool,
    rng: StdRng,
    created_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl RecommendationSession {
    pub fn new(engine: Arc<RecommendationEngine>, settings: SessionSettings) -> Self {
        let rng = match settings.exploration_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let now = Utc::now();

        Self {
            engine,
            settings,
            profile: UserProfile::new(),
            queue: VecDeque::new(),
            queue_reason: RecommendationReason::TopScoreFallback,
            current: None,
            delivered: HashSet::new(),
            exhausted: false,
            rng,
            created_at: now,
            last_seen: now,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.exhausted {
            SessionState::Exhausted
        } else if self.queue.is_empty() {
            SessionState::QueueEmpty
        } else {
            SessionState::QueueReady
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// The item currently shown, if any
    pub fn current(&self) -> Option<&Recommendation> {
        self.current.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last time the owner of the session used it
    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }

    /// Delivers the next item and makes it the current one
    ///
    /// Refills an empty queue first. Returns `None` once nothing eligible is
    /// left anywhere, and keeps returning `None` until `reset`.
    pub fn get_next(&mut self) -> AppResult<Option<Recommendation>> {
        self.current = None;
        if self.exhausted {
            return Ok(None);
        }

        if self.queue.is_empty() {
            self.refill()?;
        }
        if let Some(next) = self.pop_fresh() {
            return Ok(Some(self.deliver(next)));
        }

        // Every queued name went stale; one refill from the current profile
        self.refill()?;
        if let Some(next) = self.pop_fresh() {
            return Ok(Some(self.deliver(next)));
        }

        tracing::info!(
            excluded = self.profile.excluded().len(),
            delivered = self.delivered.len(),
            catalog = self.engine.catalog().len(),
            "Recommendation session exhausted"
        );
        self.exhausted = true;
        Ok(None)
    }

    /// Records feedback on the current item and delivers the next one
    ///
    /// Without a current item the profile is left untouched.
    pub fn record_action(&mut self, action: ActionKind) -> AppResult<Option<Recommendation>> {
        if let Some(current) = self.current.take() {
            tracing::debug!(name = %current.anime.name, action = ?action, "Recording action");
            self.profile.add(action.list(), current.anime.name);
            self.queue.clear();
        }
        self.get_next()
    }

    /// Removes a name from one of the lists
    ///
    /// Returns whether the name was present. The current item is kept; an
    /// exhausted session stays exhausted until `reset`.
    pub fn remove_from_list(&mut self, list: ListKind, name: &str) -> bool {
        let removed = self.profile.remove(list, name);
        if removed {
            self.queue.clear();
        }
        removed
    }

    /// Clears the profile, queue and delivery history and starts over
    pub fn reset(&mut self) -> AppResult<Option<Recommendation>> {
        self.profile.clear();
        self.queue.clear();
        self.delivered.clear();
        self.exhausted = false;
        self.get_next()
    }

    fn deliver(&mut self, next: Recommendation) -> Recommendation {
        self.delivered.insert(next.anime.name.clone());
        self.current = Some(next.clone());
        next
    }

    fn is_eligible(&self, name: &str) -> bool {
        !self.delivered.contains(name) && !self.profile.is_excluded(name)
    }

    /// Pops queued names until one is still eligible
    ///
    /// Each stale name is discarded, so this runs at most once per queued
    /// entry.
    fn pop_fresh(&mut self) -> Option<Recommendation> {
        while let Some(name) = self.queue.pop_front() {
            if !self.is_eligible(&name) {
                continue;
            }
            if let Some(anime) = self.engine.catalog().by_name(&name) {
                return Some(Recommendation {
                    anime: anime.clone(),
                    reason: self.queue_reason,
                });
            }
        }
        None
    }

    /// Picks one strategy by signal priority and enqueues its eligible output
    ///
    /// Hybrid beats wishlist-only beats watched-only beats the top-score
    /// fallback. A strategy with no eligible output falls through to the
    /// fallback.
    fn refill(&mut self) -> AppResult<()> {
        let engine = Arc::clone(&self.engine);
        let has_wishlist = !self.profile.wishlist.is_empty();
        let has_watched = !self.profile.watched.is_empty();

        let (reason, candidates) = match (has_wishlist, has_watched) {
            (true, true) => (
                RecommendationReason::Hybrid,
                engine.hybrid(&self.profile.wishlist, &self.profile.watched)?,
            ),
            (true, false) => (
                RecommendationReason::Wishlist,
                engine.by_wishlist(&self.profile.wishlist)?,
            ),
            (false, true) => (
                RecommendationReason::WatchedExploration,
                engine.by_watched(&self.profile.watched, &mut self.rng)?,
            ),
            (false, false) => (RecommendationReason::TopScoreFallback, Vec::new()),
        };

        let mut eligible = self.eligible(candidates, usize::MAX);
        let mut reason = reason;
        if eligible.is_empty() {
            reason = RecommendationReason::TopScoreFallback;
            let ranked = top_score(engine.catalog(), engine.catalog().len());
            eligible = self.eligible(ranked, self.settings.fallback_pool_size);
        }

        tracing::info!(
            strategy = ?reason,
            candidates = eligible.len(),
            "Recommendation queue refilled"
        );

        self.queue = eligible.into();
        self.queue_reason = reason;
        Ok(())
    }

    fn eligible(&self, candidates: Vec<Candidate>, limit: usize) -> Vec<String> {
        candidates
            .into_iter()
            .filter(|c| self.is_eligible(&c.name))
            .map(|c| c.name)
            .take(limit)
            .collect()
    }
}
