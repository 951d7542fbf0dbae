use tracing::info;

use wellness_booking::{
    cache::CacheService,
    config::Config,
    database::Database,
    logging,
    redis_client::RedisClient,
    repository::{EventRepository, PostgresRepository},
    seed::{self, DEMO_PASSWORD},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    logging::init(&config.app);

    if config.uses_memory_store() {
        anyhow::bail!("the in-memory store seeds itself on startup; point DATABASE_URL at Postgres");
    }

    let db = Database::new(&config.database.url, config.database.pool_size).await?;
    db.run_migrations().await?;
    let repo = PostgresRepository::new(db);

    let summary = seed::seed_demo_data(&repo, bcrypt::DEFAULT_COST).await?;
    info!("Seeded {} accounts and {} event types", summary.users, summary.event_types);

    if let Some(url) = config.catalog_cache_url() {
        let cache = CacheService::new(RedisClient::new(url).await?, config.redis.catalog_ttl_seconds);
        cache.invalidate_event_types().await;
    }
    repo.close().await;

    println!("\n================================");
    println!("  PRE-CREATED ACCOUNTS (password: {})", DEMO_PASSWORD);
    println!("================================");
    for (username, role, company) in seed::accounts() {
        println!("  {:<20} {:<7} {}", username, role, company);
    }
    println!("================================\n");
    Ok(())
}
