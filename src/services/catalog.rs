use std::sync::Arc;
use uuid::Uuid;

use crate::cache::CacheService;
use crate::error::{AppError, Result};
use crate::models::{EventType, EventTypeDetails};
use crate::repository::EventRepository;

/// Read-only view of the offerable event types.
#[derive(Clone)]
pub struct Catalog {
    repo: Arc<dyn EventRepository>,
    cache: Option<CacheService>,
}

impl Catalog {
    pub fn new(repo: Arc<dyn EventRepository>, cache: Option<CacheService>) -> Self {
        Self { repo, cache }
    }

    /// Ordered by name. Served from Redis when a cache is configured.
    pub async fn list_event_types(&self) -> Result<Vec<EventTypeDetails>> {
        if let Some(cache) = &self.cache {
            if let Some(types) = cache.get_event_types().await {
                return Ok(types);
            }
        }

        let types = self.repo.list_event_types().await?;
        if let Some(cache) = &self.cache {
            cache.save_event_types(&types).await;
        }
        Ok(types)
    }

    /// Resolution always hits the store: routing must not use a stale vendor.
    pub async fn resolve_event_type(&self, raw_id: &str) -> Result<EventType> {
        let not_found = || AppError::not_found("Event type not found");
        let id = Uuid::parse_str(raw_id.trim()).map_err(|_| not_found())?;
        self.repo.find_event_type(id).await?.ok_or_else(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};
    use crate::repository::MemoryRepository;

    #[tokio::test]
    async fn lists_by_name_and_resolves_by_id() {
        let repo = Arc::new(MemoryRepository::new());
        let vendor = User::new("vendor_wellcare", "x".into(), Role::Provider, "WellCare Solutions");
        repo.insert_user(&vendor).await.unwrap();
        let eye = EventType::new("Onsite Eye Screening", "", vendor.id);
        let health = EventType::new("Onsite Health Screening", "", vendor.id);
        repo.insert_event_type(&health).await.unwrap();
        repo.insert_event_type(&eye).await.unwrap();

        let catalog = Catalog::new(repo, None);
        let names: Vec<_> = catalog
            .list_event_types()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Onsite Eye Screening", "Onsite Health Screening"]);

        let resolved = catalog.resolve_event_type(&eye.id.to_string()).await.unwrap();
        assert_eq!(resolved.provider_id, vendor.id);
    }

    #[tokio::test]
    async fn unknown_or_malformed_ids_are_not_found() {
        let catalog = Catalog::new(Arc::new(MemoryRepository::new()), None);
        for raw in ["not-a-uuid", &Uuid::new_v4().to_string()] {
            let err = catalog.resolve_event_type(raw).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)));
        }
    }
}
