use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio::{sync::RwLock, task::JoinHandle};
use uuid::Uuid;

use crate::services::{
    AnimeInfoProvider, RecommendationEngine, RecommendationSession, SessionSettings,
};

pub type Sessions = HashMap<Uuid, RecommendationSession>;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Shared application state
///
/// The engine is read-only and shared by every session. Sessions are only
/// touched under the map lock; metadata lookups happen after it is released.
/// A session idle for longer than `session_ttl` is dropped.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub sessions: Arc<RwLock<Sessions>>,
    pub metadata: Arc<dyn AnimeInfoProvider>,
    pub settings: SessionSettings,
    pub session_ttl: TimeDelta,
}

impl AppState {
    pub fn new(
        engine: Arc<RecommendationEngine>,
        metadata: Arc<dyn AnimeInfoProvider>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            engine,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            metadata,
            settings,
            session_ttl: to_time_delta(DEFAULT_SESSION_TTL),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = to_time_delta(ttl);
        self
    }

    pub fn is_expired(&self, session: &RecommendationSession) -> bool {
        Utc::now().signed_duration_since(session.last_seen()) >= self.session_ttl
    }

    /// Drops idle sessions from an already locked map
    pub fn evict_expired(&self, sessions: &mut Sessions) -> usize {
        let before = sessions.len();
        sessions.retain(|_, session| !self.is_expired(session));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Idle sessions evicted");
        }
        evicted
    }

    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        self.evict_expired(&mut sessions)
    }

    /// Sweeps idle sessions every `every` until the runtime shuts down
    pub fn spawn_session_reaper(&self, every: Duration) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                state.evict_idle().await;
            }
        })
    }
}

fn to_time_delta(ttl: Duration) -> TimeDelta {
    TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX)
}
