use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::PartyRef;

/// Catalog offering. `provider_id` decides who receives requests for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventType {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub provider_id: Uuid,
}

impl EventType {
    pub fn new(name: &str, description: &str, provider_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            provider_id,
        }
    }

    pub fn summary(&self) -> EventTypeRef {
        EventTypeRef {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Catalog entry as listed to clients, with the vendor joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeDetails {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub provider: PartyRef,
}

/// Short form embedded into resolved events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeRef {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}
