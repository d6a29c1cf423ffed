use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        ActionKind, AnimeId, AnimeInfo, Candidate, ListKind, RecommendationReason, SessionState,
        UserProfile,
    },
    services::{
        providers::AnimeInfoProvider,
        recommendations::{
            strategies::{top_score, SIMILAR_DEFAULT},
            Recommendation, RecommendationEngine, RecommendationSession,
        },
    },
};

use super::{state::Sessions, AppState};

const TOP_DEFAULT: usize = 10;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: ActionKind,
}

#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// The item being shown, with display metadata
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CurrentItem {
    pub id: AnimeId,
    pub name: String,
    pub genres: Vec<String>,
    pub synopsis: String,
    pub score: Option<f32>,
    pub reason: RecommendationReason,
    pub reason_label: String,
    pub info: AnimeInfo,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionView {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub state: SessionState,
    pub current: Option<CurrentItem>,
    pub profile: UserProfile,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TitleResponse {
    pub id: AnimeId,
    pub name: String,
    pub genres: Vec<String>,
    pub score: Option<f32>,
    /// Cosine similarity to the queried title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

/// Session fields copied out under the lock
struct SessionSnapshot {
    session_id: Uuid,
    created_at: DateTime<Utc>,
    state: SessionState,
    current: Option<Recommendation>,
    profile: UserProfile,
}

impl SessionSnapshot {
    fn of(session_id: Uuid, session: &RecommendationSession) -> Self {
        Self {
            session_id,
            created_at: session.created_at(),
            state: session.state(),
            current: session.current().cloned(),
            profile: session.profile().clone(),
        }
    }

    /// Resolves display metadata; must run without holding the sessions lock
    async fn into_view(self, metadata: &dyn AnimeInfoProvider) -> SessionView {
        let current = match self.current {
            Some(Recommendation { anime, reason }) => {
                let info = metadata.lookup(anime.id, &anime.name).await;
                Some(CurrentItem {
                    id: anime.id,
                    name: anime.name,
                    genres: anime.genres,
                    synopsis: anime.synopsis,
                    score: anime.score,
                    reason,
                    reason_label: reason.label().to_string(),
                    info,
                })
            }
            None => None,
        };

        SessionView {
            session_id: self.session_id,
            created_at: self.created_at,
            state: self.state,
            current,
            profile: self.profile,
        }
    }
}

fn title_responses(
    engine: &RecommendationEngine,
    candidates: Vec<Candidate>,
    with_similarity: bool,
) -> Vec<TitleResponse> {
    candidates
        .into_iter()
        .filter_map(|c| {
            engine.catalog().get(c.index).map(|anime| TitleResponse {
                id: anime.id,
                name: anime.name.clone(),
                genres: anime.genres.clone(),
                score: anime.score,
                similarity: with_similarity.then_some(c.score),
            })
        })
        .collect()
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {}", id))
}

/// Looks a session up and marks it as used; an idle one is dropped instead
fn live_session<'a>(
    state: &AppState,
    sessions: &'a mut Sessions,
    id: Uuid,
) -> AppResult<&'a mut RecommendationSession> {
    let expired = match sessions.get(&id) {
        Some(session) => state.is_expired(session),
        None => return Err(session_not_found(id)),
    };
    if expired {
        sessions.remove(&id);
        tracing::info!(session_id = %id, "Session expired");
        return Err(session_not_found(id));
    }

    let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
    session.touch();
    Ok(session)
}

/// Applies `f` to a session under the write lock and snapshots the result
async fn with_session<F>(state: &AppState, id: Uuid, f: F) -> AppResult<SessionSnapshot>
where
    F: FnOnce(&mut RecommendationSession) -> AppResult<()>,
{
    let mut sessions = state.sessions.write().await;
    let session = live_session(state, &mut sessions, id)?;
    f(session)?;
    Ok(SessionSnapshot::of(id, session))
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Starts a session and delivers its first item
pub async fn create_session(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<SessionView>)> {
    let mut session = RecommendationSession::new(state.engine.clone(), state.settings.clone());
    session.get_next()?;

    let snapshot = {
        let id = Uuid::new_v4();
        let snapshot = SessionSnapshot::of(id, &session);
        let mut sessions = state.sessions.write().await;
        state.evict_expired(&mut sessions);
        sessions.insert(id, session);
        snapshot
    };

    tracing::info!(session_id = %snapshot.session_id, "Session created");

    let view = snapshot.into_view(state.metadata.as_ref()).await;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionView>> {
    let snapshot = with_session(&state, id, |_| Ok(())).await?;

    Ok(Json(snapshot.into_view(state.metadata.as_ref()).await))
}

/// Records feedback on the current item and moves to the next one
pub async fn record_action(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ActionRequest>,
) -> AppResult<Json<SessionView>> {
    let snapshot = with_session(&state, id, |session| {
        session.record_action(request.action).map(|_| ())
    })
    .await?;

    Ok(Json(snapshot.into_view(state.metadata.as_ref()).await))
}

/// Takes a name off one of the session lists; the current item is kept
pub async fn remove_from_list(
    State(state): State<AppState>,
    Path((id, list)): Path<(Uuid, ListKind)>,
    Json(request): Json<RemoveRequest>,
) -> AppResult<Json<SessionView>> {
    let snapshot = with_session(&state, id, |session| {
        if !session.remove_from_list(list, &request.name) {
            tracing::debug!(session_id = %id, list = ?list, name = %request.name, "Name not in list");
        }
        Ok(())
    })
    .await?;

    Ok(Json(snapshot.into_view(state.metadata.as_ref()).await))
}

pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionView>> {
    let snapshot = with_session(&state, id, |session| session.reset().map(|_| ())).await?;

    Ok(Json(snapshot.into_view(state.metadata.as_ref()).await))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    match state.sessions.write().await.remove(&id) {
        Some(_) => {
            tracing::info!(session_id = %id, "Session deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(session_not_found(id)),
    }
}

/// Highest-scored titles in the catalog
pub async fn top_titles(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Json<Vec<TitleResponse>> {
    let limit = params.limit.unwrap_or(TOP_DEFAULT);
    let ranked = top_score(state.engine.catalog(), limit);
    Json(title_responses(&state.engine, ranked, false))
}

/// Titles most similar to the named one
pub async fn similar_titles(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<TitleResponse>>> {
    let limit = params.limit.unwrap_or(SIMILAR_DEFAULT);
    let ranked = state.engine.similar_to(&name, limit)?;
    Ok(Json(title_responses(&state.engine, ranked, true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::Anime,
        services::{
            catalog::Catalog, providers::MockAnimeInfoProvider, recommendations::SessionSettings,
        },
    };
    use std::sync::Arc;

    fn engine() -> Arc<RecommendationEngine> {
        let entries = vec![
            Anime {
                id: 4224,
                name: "Toradora!".to_string(),
                genres: vec!["Romance".to_string(), "School".to_string()],
                synopsis: "a delinquent-looking boy and a tiny tiger".to_string(),
                score: Some(8.2),
            },
            Anime {
                id: 2167,
                name: "Clannad".to_string(),
                genres: vec!["Drama".to_string(), "Romance".to_string()],
                synopsis: "a delinquent boy meets a girl at school".to_string(),
                score: Some(8.0),
            },
        ];
        Arc::new(RecommendationEngine::new(Catalog::new(entries)).unwrap())
    }

    #[tokio::test]
    async fn test_view_looks_up_metadata_for_current_item() {
        let mut metadata = MockAnimeInfoProvider::new();
        metadata
            .expect_lookup()
            .withf(|id, _| *id == 4224)
            .times(1)
            .returning(|id, _| AnimeInfo {
                image_url: "https://img.example/4224.jpg".to_string(),
                trailer_url: None,
                url: format!("https://myanimelist.net/anime/{}", id),
            });

        let mut session = RecommendationSession::new(engine(), SessionSettings::default());
        session.get_next().unwrap();

        let view = SessionSnapshot::of(Uuid::new_v4(), &session)
            .into_view(&metadata)
            .await;

        let current = view.current.unwrap();
        assert_eq!(current.name, "Toradora!");
        assert_eq!(current.reason, RecommendationReason::TopScoreFallback);
        assert_eq!(current.reason_label, "Popular (top global score)");
        assert_eq!(current.info.image_url, "https://img.example/4224.jpg");
        assert_eq!(view.state, SessionState::QueueReady);
    }

    #[tokio::test]
    async fn test_view_without_current_skips_lookup() {
        let mut metadata = MockAnimeInfoProvider::new();
        metadata.expect_lookup().never();

        let session = RecommendationSession::new(engine(), SessionSettings::default());
        let view = SessionSnapshot::of(Uuid::new_v4(), &session)
            .into_view(&metadata)
            .await;

        assert!(view.current.is_none());
        assert_eq!(view.state, SessionState::QueueEmpty);
    }

    #[test]
    fn test_similarity_omitted_for_top_titles() {
        let engine = engine();
        let top = title_responses(&engine, top_score(engine.catalog(), 1), false);
        let json = serde_json::to_value(&top).unwrap();

        assert_eq!(json[0]["name"], "Toradora!");
        assert!(json[0].get("similarity").is_none());
    }
}
