use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use moodreel_api::catalog::StaticCatalog;
use moodreel_api::config::Config;
use moodreel_api::db::{create_redis_client, RedisSessionStore};
use moodreel_api::routes::{create_router, AppState};
use moodreel_api::services::providers::{
    metadata::MetadataClient, preference_llm::PreferenceLlmClient,
    vector_search::VectorSearchClient, PreferenceWriter, TracingSink,
};
use moodreel_api::services::SessionEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("moodreel_api=debug,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let timeout = Duration::from_millis(config.upstream_timeout_ms);

    let redis_client = create_redis_client(&config.redis_url)?;
    let store = Arc::new(RedisSessionStore::new(redis_client));

    let index = Arc::new(VectorSearchClient::new(
        config.vector_api_key.clone(),
        config.vector_api_url.clone(),
        timeout,
    )?);
    let enricher = Arc::new(MetadataClient::new(
        config.metadata_api_key.clone(),
        config.metadata_api_url.clone(),
        timeout,
    )?);

    // Preference text is optional; without it the synthesizer uses its
    // deterministic template.
    let writer: Option<Arc<dyn PreferenceWriter>> =
        match (&config.preference_api_url, &config.preference_api_key) {
            (Some(url), Some(key)) => Some(Arc::new(PreferenceLlmClient::new(
                key.clone(),
                url.clone(),
                timeout,
            )?)),
            _ => {
                tracing::info!("Preference-text service not configured, using template fallback");
                None
            }
        };

    let engine = SessionEngine::new(
        store,
        Arc::new(StaticCatalog),
        index,
        enricher,
        writer,
        Arc::new(TracingSink),
        timeout,
        config.session_ttl_seconds,
    );

    let state = AppState {
        engine: Arc::new(engine),
    };
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
