//! Persistence seam.
//!
//! Handlers and services only see [`EventRepository`]; the concrete store is
//! picked once at startup (`DATABASE_URL`) and injected through `AppState`.
//! Both implementations apply lifecycle transitions as a conditional write
//! on `status = pending`, so two concurrent vendor actions cannot both land.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Event, EventDetails, EventType, EventTypeDetails, Transition, User};
use crate::services::authorization::EventScope;

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

#[async_trait]
pub trait EventRepository: Send + Sync {
    // Users

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Usernames are stored lowercase; callers pass the normalized form.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn insert_user(&self, user: &User) -> Result<()>;

    // Catalog

    /// All event types with their vendor, ordered by name.
    async fn list_event_types(&self) -> Result<Vec<EventTypeDetails>>;

    async fn find_event_type(&self, id: Uuid) -> Result<Option<EventType>>;

    async fn insert_event_type(&self, event_type: &EventType) -> Result<()>;

    /// Wipes accounts, the catalog and every event, then stores `users` and
    /// `event_types` in their place. All or nothing: on error the previous
    /// contents stay.
    async fn replace_all(&self, users: &[User], event_types: &[EventType]) -> Result<()>;

    // Events

    async fn insert_event(&self, event: &Event) -> Result<()>;

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>>;

    async fn find_event_details(&self, id: Uuid) -> Result<Option<EventDetails>>;

    /// Applies `transition` only if the event is still pending.
    /// Returns `false` when another write got there first.
    async fn transition_if_pending(
        &self,
        id: Uuid,
        transition: &Transition,
        at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Newest first, `limit` rows starting at `skip`.
    async fn list_events(&self, scope: &EventScope, skip: u64, limit: u64) -> Result<Vec<EventDetails>>;

    async fn count_events(&self, scope: &EventScope) -> Result<u64>;

    /// Releases pooled connections. No-op for stores without any.
    async fn close(&self) {}
}
