use crate::cache::CacheService;
use crate::models::EventTypeDetails;
use redis::AsyncCommands;
use tracing::{debug, warn};

pub const EVENT_TYPES_KEY: &str = "catalog:event_types";

impl CacheService {
    // Получить каталог из кеша; None при промахе или ошибке
    pub async fn get_event_types(&self) -> Option<Vec<EventTypeDetails>> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = match conn.get(EVENT_TYPES_KEY).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Catalog cache read failed: {:?}", e);
                return None;
            }
        };

        match serde_json::from_str(&data?) {
            Ok(types) => {
                debug!("Catalog cache hit");
                Some(types)
            }
            Err(e) => {
                warn!("Catalog cache entry is corrupt, ignoring: {:?}", e);
                None
            }
        }
    }

    pub async fn save_event_types(&self, types: &[EventTypeDetails]) {
        let data = match serde_json::to_string(types) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to serialize catalog: {:?}", e);
                return;
            }
        };
        let mut conn = self.redis.conn.clone();
        let result: redis::RedisResult<()> = conn.set_ex(EVENT_TYPES_KEY, data, self.ttl_seconds).await;
        if let Err(e) = result {
            warn!("Catalog cache write failed: {:?}", e);
        }
    }

    pub async fn invalidate_event_types(&self) {
        let mut conn = self.redis.conn.clone();
        let result: redis::RedisResult<()> = conn.del(EVENT_TYPES_KEY).await;
        if let Err(e) = result {
            warn!("Catalog cache invalidation failed: {:?}", e);
        }
    }
}
