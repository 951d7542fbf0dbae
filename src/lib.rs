pub mod config;
pub mod database;
pub mod redis_client;
pub mod models;
pub mod controllers;
pub mod middleware;
pub mod cache;
pub mod services;
pub mod repository;
pub mod error;
pub mod logging;
pub mod seed;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::cache::CacheService;
use crate::repository::{EventRepository, MemoryRepository, PostgresRepository};
use crate::services::{
    auth::{AuthService, TokenService},
    catalog::Catalog,
    lifecycle::{EventLifecycle, ValidationPolicy},
    listing::EventListing,
};

// Shared state для всего приложения
pub struct AppState {
    pub config: config::Config,
    pub repo: Arc<dyn EventRepository>,
    pub auth: AuthService,
    pub catalog: Catalog,
    pub lifecycle: EventLifecycle,
    pub listing: EventListing,
}

impl AppState {
    /// Opens the store named by `DATABASE_URL` (and Redis, if configured).
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let repo: Arc<dyn EventRepository> = if config.uses_memory_store() {
            info!("Using in-memory store with demo data");
            let repo = Arc::new(MemoryRepository::new());
            seed::seed_demo_data(&*repo, bcrypt::DEFAULT_COST).await?;
            repo
        } else {
            let db = database::Database::new(&config.database.url, config.database.pool_size).await?;
            info!("Database connected");
            db.run_migrations().await?;
            Arc::new(PostgresRepository::new(db))
        };

        let cache = match config.catalog_cache_url() {
            Some(url) => match redis_client::RedisClient::new(url).await {
                Ok(redis) => Some(CacheService::new(redis, config.redis.catalog_ttl_seconds)),
                Err(e) => {
                    warn!("Redis unavailable, catalog cache disabled: {:?}", e);
                    None
                }
            },
            None => None,
        };

        Ok(Self::with_repository(config, repo, cache))
    }

    pub fn with_repository(
        config: config::Config,
        repo: Arc<dyn EventRepository>,
        cache: Option<CacheService>,
    ) -> Arc<Self> {
        let tokens = TokenService::new(&config.jwt);
        let catalog = Catalog::new(repo.clone(), cache);
        let policy = ValidationPolicy {
            strict: config.features.strict_validation,
        };

        Arc::new(Self {
            auth: AuthService::new(repo.clone(), tokens),
            lifecycle: EventLifecycle::new(repo.clone(), catalog.clone(), policy),
            listing: EventListing::new(repo.clone()),
            catalog,
            repo,
            config,
        })
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Wellness Booking API v1.0" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
