use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::EventRepository;
use crate::error::{AppError, Result};
use crate::models::{Event, EventDetails, EventType, EventTypeDetails, Transition, User};
use crate::services::authorization::EventScope;

/// Process-local store. Used by tests and by `DATABASE_URL=memory://` demo runs.
#[derive(Default)]
pub struct MemoryRepository {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    event_types: HashMap<Uuid, EventType>,
    // insertion order, oldest first
    events: Vec<Event>,
}

impl Inner {
    fn user(&self, id: Uuid) -> Result<&User> {
        self.users
            .get(&id)
            .ok_or_else(|| AppError::internal(anyhow!("dangling user reference {}", id)))
    }

    fn event_type(&self, id: Uuid) -> Result<&EventType> {
        self.event_types
            .get(&id)
            .ok_or_else(|| AppError::internal(anyhow!("dangling event type reference {}", id)))
    }

    fn add_user(&mut self, user: &User) -> Result<()> {
        if self.users.values().any(|u| u.username == user.username) {
            return Err(AppError::internal(anyhow!("username {} already taken", user.username)));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn add_event_type(&mut self, event_type: &EventType) -> Result<()> {
        self.user(event_type.provider_id)?;
        self.event_types.insert(event_type.id, event_type.clone());
        Ok(())
    }

    fn resolve(&self, event: &Event) -> Result<EventDetails> {
        let event_type = self.event_type(event.event_type_id)?.summary();
        let requester = self.user(event.requester_id)?.party();
        let provider = self.user(event.provider_id)?.party();
        Ok(EventDetails::resolve(event.clone(), event_type, requester, provider))
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for MemoryRepository {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        self.inner.write().await.add_user(user)
    }

    async fn list_event_types(&self) -> Result<Vec<EventTypeDetails>> {
        let inner = self.inner.read().await;
        let mut types = inner
            .event_types
            .values()
            .map(|et| {
                Ok(EventTypeDetails {
                    id: et.id,
                    name: et.name.clone(),
                    description: et.description.clone(),
                    provider: inner.user(et.provider_id)?.party(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        types.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(types)
    }

    async fn find_event_type(&self, id: Uuid) -> Result<Option<EventType>> {
        Ok(self.inner.read().await.event_types.get(&id).cloned())
    }

    async fn insert_event_type(&self, event_type: &EventType) -> Result<()> {
        self.inner.write().await.add_event_type(event_type)
    }

    async fn replace_all(&self, users: &[User], event_types: &[EventType]) -> Result<()> {
        // built aside and swapped in, so a failure leaves the old data untouched
        let mut fresh = Inner::default();
        for user in users {
            fresh.add_user(user)?;
        }
        for event_type in event_types {
            fresh.add_event_type(event_type)?;
        }
        *self.inner.write().await = fresh;
        Ok(())
    }

    async fn insert_event(&self, event: &Event) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.event_type(event.event_type_id)?;
        inner.user(event.requester_id)?;
        inner.user(event.provider_id)?;
        inner.events.push(event.clone());
        Ok(())
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        let inner = self.inner.read().await;
        Ok(inner.events.iter().find(|e| e.id == id).cloned())
    }

    async fn find_event_details(&self, id: Uuid) -> Result<Option<EventDetails>> {
        let inner = self.inner.read().await;
        inner
            .events
            .iter()
            .find(|e| e.id == id)
            .map(|e| inner.resolve(e))
            .transpose()
    }

    async fn transition_if_pending(
        &self,
        id: Uuid,
        transition: &Transition,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(event) = inner.events.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        if event.status.is_terminal() {
            return Ok(false);
        }
        event.apply(transition, at)?;
        Ok(true)
    }

    async fn list_events(&self, scope: &EventScope, skip: u64, limit: u64) -> Result<Vec<EventDetails>> {
        let inner = self.inner.read().await;
        // newest insert first so equal timestamps still come out most-recent-first
        let mut matching: Vec<&Event> = inner.events.iter().rev().filter(|e| scope.matches(e)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .map(|e| inner.resolve(e))
            .collect()
    }

    async fn count_events(&self, scope: &EventScope) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner.events.iter().filter(|e| scope.matches(e)).count() as u64)
    }
}
