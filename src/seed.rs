//! Demo accounts and catalog.
//!
//! Every account uses [`DEMO_PASSWORD`]. Each event type is bound to exactly
//! one vendor, which is where requests for it get routed.

use tracing::info;

use crate::error::Result;
use crate::models::{EventType, Role, User};
use crate::repository::EventRepository;
use crate::services::auth::hash_password;

pub const DEMO_PASSWORD: &str = "password123";

const ACCOUNTS: &[(&str, Role, &str)] = &[
    ("hr_acme", Role::Requester, "Acme Corporation"),
    ("hr_globex", Role::Requester, "Globex Industries"),
    ("vendor_healthplus", Role::Provider, "HealthPlus Pte Ltd"),
    ("vendor_wellcare", Role::Provider, "WellCare Solutions"),
    ("vendor_fitlife", Role::Provider, "FitLife Wellness"),
];

// (name, description, vendor username)
const EVENT_TYPES: &[(&str, &str, &str)] = &[
    (
        "Health Talk - Stress Management",
        "A talk on managing workplace stress and mental wellness",
        "vendor_healthplus",
    ),
    (
        "Health Talk - Nutrition",
        "A talk on healthy eating habits and nutrition",
        "vendor_healthplus",
    ),
    (
        "Onsite Health Screening",
        "Basic health screening including BMI, blood pressure, blood glucose",
        "vendor_wellcare",
    ),
    (
        "Onsite Eye Screening",
        "Eye health check and vision screening",
        "vendor_wellcare",
    ),
    (
        "Fitness Workshop - Yoga",
        "Guided yoga session for employees",
        "vendor_fitlife",
    ),
    (
        "Fitness Workshop - HIIT",
        "High-intensity interval training session",
        "vendor_fitlife",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub event_types: usize,
}

/// Replaces everything in the store with the demo data set, atomically.
pub async fn seed_demo_data(repo: &dyn EventRepository, bcrypt_cost: u32) -> Result<SeedSummary> {
    let password_hash = hash_password(DEMO_PASSWORD, bcrypt_cost).await?;
    let users: Vec<User> = ACCOUNTS
        .iter()
        .map(|(username, role, company)| User::new(username, password_hash.clone(), *role, company))
        .collect();

    let event_types: Vec<EventType> = EVENT_TYPES
        .iter()
        .filter_map(|(name, description, vendor)| {
            // the table above only names seeded vendors
            let provider = users.iter().find(|u| u.username == *vendor)?;
            Some(EventType::new(name, description, provider.id))
        })
        .collect();

    repo.replace_all(&users, &event_types).await?;
    info!(
        "Replaced store contents with {} accounts and {} event types",
        users.len(),
        event_types.len()
    );

    Ok(SeedSummary {
        users: users.len(),
        event_types: event_types.len(),
    })
}

pub fn accounts() -> impl Iterator<Item = (&'static str, Role, &'static str)> {
    ACCOUNTS.iter().copied()
}
