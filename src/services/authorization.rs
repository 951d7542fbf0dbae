//! Who may see and touch which events.
//!
//! Every role maps to exactly one ownership column: HR owns what it created,
//! a vendor owns what was routed to it. Listing filters by that column, single
//! record access checks it after the record is known to exist (so a foreign
//! record is 403, a missing one 404).

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Event, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventScope {
    Requester(Uuid),
    Provider(Uuid),
}

impl EventScope {
    pub fn for_actor(actor: &AuthUser) -> Self {
        match actor.role {
            Role::Requester => EventScope::Requester(actor.id),
            Role::Provider => EventScope::Provider(actor.id),
        }
    }

    pub fn owner_id(&self) -> Uuid {
        match self {
            EventScope::Requester(id) | EventScope::Provider(id) => *id,
        }
    }

    /// Column the scope filters on. Static, safe to splice into SQL.
    pub fn owner_column(&self) -> &'static str {
        match self {
            EventScope::Requester(_) => "requester_id",
            EventScope::Provider(_) => "provider_id",
        }
    }

    pub fn matches_parties(&self, requester_id: Uuid, provider_id: Uuid) -> bool {
        match self {
            EventScope::Requester(id) => *id == requester_id,
            EventScope::Provider(id) => *id == provider_id,
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.matches_parties(event.requester_id, event.provider_id)
    }

    pub fn ensure_visible(&self, requester_id: Uuid, provider_id: Uuid) -> Result<()> {
        if self.matches_parties(requester_id, provider_id) {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }
}

pub fn require_role(actor: &AuthUser, role: Role) -> Result<()> {
    if actor.role == role {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Only {} accounts can do this", role)))
    }
}

/// Only the vendor an event was routed to may decide on it.
pub fn ensure_assigned_provider(actor: &AuthUser, event: &Event) -> Result<()> {
    if actor.id == event.provider_id {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}
