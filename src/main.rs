use std::{sync::Arc, time::Duration};

use anime_matcher::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, Cache},
    services::{Catalog, JikanProvider, RecommendationEngine, SessionSettings},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anime_matcher=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let catalog = Catalog::load(&config.catalog_path)?;
    let engine = Arc::new(RecommendationEngine::new(catalog)?);

    let (cache, cache_handle) = match &config.redis_url {
        Some(url) => {
            let client = create_redis_client(url)?;
            let (cache, handle) = Cache::new(client).await;
            tracing::info!("Metadata cache enabled");
            (Some(cache), Some(handle))
        }
        None => {
            tracing::info!("REDIS_URL not set, metadata lookups are not cached");
            (None, None)
        }
    };

    let metadata = JikanProvider::new(
        config.metadata_api_url.clone(),
        Duration::from_secs(config.metadata_timeout_secs),
        cache,
        config.metadata_cache_ttl_secs,
    )?;

    let settings = SessionSettings {
        exploration_seed: config.exploration_seed,
        fallback_pool_size: config.fallback_pool_size,
    };

    let state = AppState::new(engine, Arc::new(metadata), settings)
        .with_session_ttl(Duration::from_secs(config.session_ttl_secs));
    // tokio intervals reject a zero period
    let sweep_every = Duration::from_secs(config.session_ttl_secs.clamp(1, 60));
    let reaper = state.spawn_session_reaper(sweep_every);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reaper.abort();
    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
