use std::net::SocketAddr;
use std::sync::Arc;

use mimalloc::MiMalloc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wellness_admin::config::AppConfig;
use wellness_admin::db::{self, postgres::PgDocumentStore, DocumentStore};
use wellness_admin::services::clock::SystemClock;
use wellness_admin::services::identity::LocalIdentityProvider;
use wellness_admin::services::page_cache::{PageCache, DEFAULT_TTL};
use wellness_admin::{routes, AppState};

// M-MIMALLOC-APP: Use mimalloc as global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

async fn page_cache(config: &AppConfig) -> PageCache {
    let Some(url) = config.redis_url.as_deref() else {
        return PageCache::in_memory(DEFAULT_TTL);
    };
    match PageCache::redis(url, DEFAULT_TTL).await {
        Ok(cache) => cache,
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, falling back to in-process page cache");
            PageCache::in_memory(DEFAULT_TTL)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wellness_admin=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::migrate(&pool).await?;
    tracing::info!("Database migrations applied");

    let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(pool));
    let identity = Arc::new(LocalIdentityProvider::new(
        store.clone(),
        config.session_secret.clone(),
        config.id_token_expiry_secs,
        config.password_reset_expiry_secs,
        config.app_url.clone(),
    ));
    let cache = Arc::new(page_cache(&config).await);
    tracing::info!(backend = cache.backend_name(), "Page cache ready");

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppState {
        store,
        identity,
        cache,
        clock: Arc::new(SystemClock),
        config,
    };

    tracing::info!(host = %addr, "Starting wellness admin API server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, routes::router(state)).await?;

    Ok(())
}
