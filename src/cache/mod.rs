use crate::redis_client::RedisClient;

pub mod event_types;

/// Read-through cache for data that changes rarely (the event catalog).
/// Every failure here is logged and treated as a miss.
#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    ttl_seconds: u64,
}

impl CacheService {
    pub fn new(redis: RedisClient, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }
}
