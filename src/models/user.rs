use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// The two parties of a booking. On the wire they keep their business names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Company HR, creates events and proposes dates.
    #[serde(rename = "hr")]
    Requester,
    /// Vendor bound to event types, approves or rejects.
    #[serde(rename = "vendor")]
    Provider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Requester => "hr",
            Role::Provider => "vendor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hr" => Ok(Role::Requester),
            "vendor" => Ok(Role::Provider),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub company_name: String,
}

impl User {
    pub fn new(username: &str, password_hash: String, role: Role, company_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.trim().to_lowercase(),
            password_hash,
            role,
            company_name: company_name.trim().to_string(),
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            company_name: self.company_name.clone(),
        }
    }

    pub fn party(&self) -> PartyRef {
        PartyRef {
            id: self.id,
            username: self.username.clone(),
            company_name: self.company_name.clone(),
        }
    }
}

// Публичное представление пользователя, без хеша пароля
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub company_name: String,
}

/// A party joined into an event or event type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartyRef {
    pub id: Uuid,
    pub username: String,
    pub company_name: String,
}
