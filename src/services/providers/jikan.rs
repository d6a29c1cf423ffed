//! Jikan (unofficial MyAnimeList API) provider
//!
//! API Flow: `GET /anime/{mal_id}` → cover image, trailer embed, detail URL.
//! Successful lookups are cached in Redis when a cache is configured.

use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{AnimeId, AnimeInfo, JikanAnimeResponse},
    services::providers::AnimeInfoProvider,
};

#[derive(Clone)]
pub struct JikanProvider {
    http_client: HttpClient,
    api_url: String,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl JikanProvider {
    /// Creates a provider whose requests give up after `timeout`
    pub fn new(
        api_url: String,
        timeout: Duration,
        cache: Option<Cache>,
        cache_ttl: u64,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
            cache_ttl,
        })
    }

    /// Cached lookup; errors are surfaced to the caller
    async fn fetch(&self, id: AnimeId) -> AppResult<AnimeInfo> {
        match &self.cache {
            Some(cache) => cached!(cache, CacheKey::AnimeInfo(id), self.cache_ttl, self.call_api(id)),
            None => self.call_api(id).await,
        }
    }

    async fn call_api(&self, id: AnimeId) -> AppResult<AnimeInfo> {
        let url = format!("{}/anime/{}", self.api_url, id);

        tracing::debug!(anime_id = id, "Fetching from Jikan");

        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "Jikan API returned status {}",
                status
            )));
        }

        let body: JikanAnimeResponse = response.json().await?;
        let info = AnimeInfo::from_jikan(id, body.data);

        tracing::info!(
            anime_id = id,
            has_trailer = info.trailer_url.is_some(),
            provider = "jikan",
            "Anime info fetched"
        );

        Ok(info)
    }
}

#[async_trait::async_trait]
impl AnimeInfoProvider for JikanProvider {
    async fn lookup(&self, id: AnimeId, name: &str) -> AnimeInfo {
        match self.fetch(id).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(
                    anime_id = id,
                    name = %name,
                    error = %e,
                    "Anime info lookup failed, using placeholders"
                );
                AnimeInfo::fallback(id)
            }
        }
    }

    fn name(&self) -> &'static str {
        "jikan"
    }
}
