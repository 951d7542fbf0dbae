use serde::Deserialize;
use std::collections::HashMap;
use std::env;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// `json` switches the log formatter, anything else is human-readable.
    pub log_format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL, or `memory://` for an in-process store seeded with demo data.
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Catalog caching is off when unset.
    pub url: Option<String>,
    pub catalog_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    /// Server-side future-date and 5-digit postal code checks.
    pub strict_validation: bool,
}

pub const MEMORY_DATABASE_URL: &str = "memory://";

// env var -> config key
const ENV_KEYS: &[(&str, &str)] = &[
    ("HOST", "app.host"),
    ("PORT", "app.port"),
    ("ENVIRONMENT", "app.environment"),
    ("RUST_LOG", "app.rust_log"),
    ("LOG_FORMAT", "app.log_format"),
    ("DATABASE_URL", "database.url"),
    ("DB_POOL_SIZE", "database.pool_size"),
    ("REDIS_URL", "redis.url"),
    ("CATALOG_CACHE_TTL_SECONDS", "redis.catalog_ttl_seconds"),
    ("JWT_SECRET", "jwt.secret"),
    ("JWT_EXPIRES_IN_HOURS", "jwt.expires_in_hours"),
    ("STRICT_VALIDATION", "features.strict_validation"),
];

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_vars(env::vars())
    }

    /// Builds the config from `KEY=value` pairs laid over the defaults.
    /// `DATABASE_URL` and `JWT_SECRET` have no default.
    pub fn from_vars<I>(vars: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        let mut builder = config::Config::builder()
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 5000)?
            .set_default("app.environment", "development")?
            .set_default("app.rust_log", "wellness_booking=debug,tower_http=debug")?
            .set_default("app.log_format", "text")?
            .set_default("database.pool_size", 20)?
            .set_default("redis.catalog_ttl_seconds", 300)?
            .set_default("jwt.expires_in_hours", 24 * 7)?
            .set_default("features.strict_validation", false)?;

        for (var, key) in ENV_KEYS {
            let value = vars.get(*var).filter(|v| !v.trim().is_empty()).cloned();
            builder = builder.set_override_option(*key, value)?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        if config.jwt.secret.trim().is_empty() {
            return Err(config::ConfigError::Message("JWT_SECRET must not be empty".into()));
        }
        Ok(config)
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database.url == MEMORY_DATABASE_URL
    }

    /// Redis URL for the catalog cache. None for the memory store: it is
    /// reseeded with new ids on every start and a shared cache would outlive it.
    pub fn catalog_cache_url(&self) -> Option<&str> {
        if self.uses_memory_store() {
            return None;
        }
        self.redis.url.as_deref()
    }
}
