//! Event lifecycle: `pending` -> `approved` | `rejected`, nothing after that.
//!
//! Checks run in a fixed order for vendor actions: existence (404), ownership
//! (403), state (400), then the payload itself (400). The final write is a
//! conditional update, so of two racing decisions exactly one lands and the
//! other sees `InvalidState`.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::authorization::{ensure_assigned_provider, require_role, EventScope};
use super::catalog::Catalog;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Event, EventDetails, Location, ProposedDates, Role, Transition};
use crate::repository::EventRepository;

const POSTAL_CODE_DIGITS: usize = 5;

/// Extra server-side input rules, off unless `STRICT_VALIDATION` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationPolicy {
    pub strict: bool,
}

impl ValidationPolicy {
    pub fn check(&self, dates: &ProposedDates, location: &Location, now: DateTime<Utc>) -> Result<()> {
        if !self.strict {
            return Ok(());
        }
        if dates.as_slice().iter().any(|d| *d <= now) {
            return Err(AppError::validation("Proposed dates must be in the future"));
        }
        let code = &location.postal_code;
        if code.len() != POSTAL_CODE_DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::validation("Postal code must be exactly 5 digits"));
        }
        Ok(())
    }
}

/// What HR submits. Raw strings; parsing is part of validation.
#[derive(Debug, Clone, Default)]
pub struct NewEventRequest {
    pub event_type_id: String,
    pub proposed_dates: Vec<String>,
    pub postal_code: Option<String>,
    pub street_name: Option<String>,
}

#[derive(Clone)]
pub struct EventLifecycle {
    repo: Arc<dyn EventRepository>,
    catalog: Catalog,
    policy: ValidationPolicy,
}

impl EventLifecycle {
    pub fn new(repo: Arc<dyn EventRepository>, catalog: Catalog, policy: ValidationPolicy) -> Self {
        Self { repo, catalog, policy }
    }

    pub async fn create_event(&self, requester: &AuthUser, request: NewEventRequest) -> Result<EventDetails> {
        require_role(requester, Role::Requester)?;

        let dates = ProposedDates::parse(&request.proposed_dates)?;
        let event_type = self.catalog.resolve_event_type(&request.event_type_id).await?;
        let location = Location::new(request.postal_code.as_deref(), request.street_name.as_deref())?;

        let now = Utc::now();
        self.policy.check(&dates, &location, now)?;

        // vendor and company name come from the catalog and the account, never the body
        let event = Event::new_pending(
            &event_type,
            requester.id,
            &requester.company_name,
            dates,
            location,
            now,
        );
        self.repo.insert_event(&event).await?;
        info!(
            event_id = %event.id,
            event_type = %event_type.name,
            provider_id = %event.provider_id,
            "Event created by {}",
            requester.username
        );

        self.load_details(event.id).await
    }

    /// Single event, visible only to its requester or its vendor.
    pub async fn get_event(&self, actor: &AuthUser, raw_id: &str) -> Result<EventDetails> {
        let id = parse_event_id(raw_id)?;
        let details = self
            .repo
            .find_event_details(id)
            .await?
            .ok_or_else(event_not_found)?;
        EventScope::for_actor(actor).ensure_visible(details.requester.id, details.provider.id)?;
        Ok(details)
    }

    pub async fn approve(
        &self,
        actor: &AuthUser,
        raw_id: &str,
        confirmed_date: DateTime<Utc>,
    ) -> Result<EventDetails> {
        self.decide(actor, raw_id, || Ok(Transition::approve(confirmed_date)))
            .await
    }

    pub async fn reject(&self, actor: &AuthUser, raw_id: &str, remarks: &str) -> Result<EventDetails> {
        self.decide(actor, raw_id, || Transition::reject(remarks)).await
    }

    async fn decide<F>(&self, actor: &AuthUser, raw_id: &str, build: F) -> Result<EventDetails>
    where
        F: FnOnce() -> Result<Transition>,
    {
        require_role(actor, Role::Provider)?;
        let id = parse_event_id(raw_id)?;

        let event = self.repo.find_event(id).await?.ok_or_else(event_not_found)?;
        ensure_assigned_provider(actor, &event)?;
        event.ensure_pending()?;

        let transition = build()?;
        event.check_transition(&transition)?;

        if !self.repo.transition_if_pending(id, &transition, Utc::now()).await? {
            // lost the race, report what the winner left behind
            let current = self.repo.find_event(id).await?.ok_or_else(event_not_found)?;
            warn!(event_id = %id, status = %current.status, "Concurrent decision on event");
            if current.status.is_terminal() {
                return Err(AppError::InvalidState(current.status));
            }
            return Err(AppError::internal(anyhow::anyhow!(
                "conditional update on pending event {} failed",
                id
            )));
        }

        info!(
            event_id = %id,
            status = %transition.target_status(),
            "Event decided by {}",
            actor.username
        );
        self.load_details(id).await
    }

    async fn load_details(&self, id: Uuid) -> Result<EventDetails> {
        self.repo
            .find_event_details(id)
            .await?
            .ok_or_else(|| AppError::internal(anyhow::anyhow!("event {} vanished after write", id)))
    }
}

fn event_not_found() -> AppError {
    AppError::not_found("Event not found")
}

// A malformed id cannot name an existing event
fn parse_event_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| event_not_found())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventStatus, EventType, User};
    use crate::repository::MemoryRepository;
    use chrono::{Duration, TimeZone};

    struct World {
        repo: Arc<MemoryRepository>,
        lifecycle: EventLifecycle,
        hr: AuthUser,
        other_hr: AuthUser,
        vendor: AuthUser,
        other_vendor: AuthUser,
        event_type: EventType,
    }

    async fn world(policy: ValidationPolicy) -> World {
        let repo = Arc::new(MemoryRepository::new());
        let mut users = Vec::new();
        for (name, role, company) in [
            ("hr_acme", Role::Requester, "Acme Corporation"),
            ("hr_globex", Role::Requester, "Globex Industries"),
            ("vendor_healthplus", Role::Provider, "HealthPlus Pte Ltd"),
            ("vendor_wellcare", Role::Provider, "WellCare Solutions"),
        ] {
            let user = User::new(name, "x".into(), role, company);
            repo.insert_user(&user).await.unwrap();
            users.push(AuthUser::from(user));
        }
        let [hr, other_hr, vendor, other_vendor]: [AuthUser; 4] = users.try_into().unwrap();

        let event_type = EventType::new("Health Talk - Nutrition", "Healthy eating", vendor.id);
        repo.insert_event_type(&event_type).await.unwrap();

        let dyn_repo: Arc<dyn EventRepository> = repo.clone();
        let catalog = Catalog::new(dyn_repo.clone(), None);
        World {
            lifecycle: EventLifecycle::new(dyn_repo, catalog, policy),
            repo,
            hr,
            other_hr,
            vendor,
            other_vendor,
            event_type,
        }
    }

    fn future_dates() -> Vec<String> {
        let base = Utc.with_ymd_and_hms(2099, 3, 10, 9, 0, 0).unwrap();
        (0..3)
            .map(|i| (base + Duration::days(i)).to_rfc3339())
            .collect()
    }

    fn request(w: &World) -> NewEventRequest {
        NewEventRequest {
            event_type_id: w.event_type.id.to_string(),
            proposed_dates: future_dates(),
            postal_code: Some("50000".into()),
            street_name: Some("Jalan Ampang".into()),
        }
    }

    async fn created(w: &World) -> EventDetails {
        w.lifecycle.create_event(&w.hr, request(w)).await.unwrap()
    }

    #[tokio::test]
    async fn create_routes_to_the_event_types_vendor() {
        let w = world(ValidationPolicy::default()).await;
        let event = created(&w).await;

        assert_eq!(event.status, EventStatus::Pending);
        assert_eq!(event.provider.id, w.event_type.provider_id);
        assert_eq!(event.requester.id, w.hr.id);
        assert_eq!(event.requester_company_name, "Acme Corporation");
        assert_eq!(event.event_type.name, "Health Talk - Nutrition");
        assert_eq!(event.confirmed_date, None);
        assert_eq!(event.remarks, "");
    }

    #[tokio::test]
    async fn create_validates_input() {
        let w = world(ValidationPolicy::default()).await;

        let mut dup = request(&w);
        dup.proposed_dates = vec![
            "2025-06-01T00:00:00Z".into(),
            "2025-06-01T00:00:00Z".into(),
            "2025-06-02T00:00:00Z".into(),
        ];
        assert!(matches!(
            w.lifecycle.create_event(&w.hr, dup).await,
            Err(AppError::Validation(_))
        ));

        let mut unknown = request(&w);
        unknown.event_type_id = Uuid::new_v4().to_string();
        assert!(matches!(
            w.lifecycle.create_event(&w.hr, unknown).await,
            Err(AppError::NotFound(_))
        ));

        let mut no_postal = request(&w);
        no_postal.postal_code = None;
        let err = w.lifecycle.create_event(&w.hr, no_postal).await.unwrap_err();
        assert_eq!(err.to_string(), "Postal code is required");

        let mut long_street = request(&w);
        long_street.street_name = Some("x".repeat(500));
        let err = w.lifecycle.create_event(&w.hr, long_street).await.unwrap_err();
        assert_eq!(err.to_string(), "Street name cannot exceed 200 characters");

        assert!(matches!(
            w.lifecycle.create_event(&w.vendor, request(&w)).await,
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(w.repo.count_events(&EventScope::Requester(w.hr.id)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn past_dates_are_accepted_unless_strict() {
        let lenient = world(ValidationPolicy::default()).await;
        let mut past = request(&lenient);
        past.proposed_dates = vec!["2001-01-01".into(), "2001-01-02".into(), "2001-01-03".into()];
        past.postal_code = Some("AB-12".into());
        assert!(lenient.lifecycle.create_event(&lenient.hr, past).await.is_ok());

        let strict = world(ValidationPolicy { strict: true }).await;
        let mut past = request(&strict);
        past.proposed_dates = vec!["2001-01-01".into(), "2001-01-02".into(), "2001-01-03".into()];
        let err = strict.lifecycle.create_event(&strict.hr, past).await.unwrap_err();
        assert_eq!(err.to_string(), "Proposed dates must be in the future");

        let mut bad_postal = request(&strict);
        bad_postal.postal_code = Some("5000".into());
        let err = strict.lifecycle.create_event(&strict.hr, bad_postal).await.unwrap_err();
        assert_eq!(err.to_string(), "Postal code must be exactly 5 digits");

        assert!(strict.lifecycle.create_event(&strict.hr, request(&strict)).await.is_ok());
    }

    #[tokio::test]
    async fn approve_with_a_proposed_date() {
        let w = world(ValidationPolicy::default()).await;
        let event = created(&w).await;
        let id = event.id.to_string();

        let not_proposed = event.proposed_dates[1] + Duration::hours(3);
        let err = w.lifecycle.approve(&w.vendor, &id, not_proposed).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let approved = w
            .lifecycle
            .approve(&w.vendor, &id, event.proposed_dates[1])
            .await
            .unwrap();
        assert_eq!(approved.status, EventStatus::Approved);
        assert_eq!(approved.confirmed_date, Some(event.proposed_dates[1]));
        assert_eq!(approved.remarks, "");
    }

    #[tokio::test]
    async fn second_decision_is_invalid_state_and_changes_nothing() {
        let w = world(ValidationPolicy::default()).await;
        let event = created(&w).await;
        let id = event.id.to_string();

        w.lifecycle
            .approve(&w.vendor, &id, event.proposed_dates[0])
            .await
            .unwrap();

        let again = w.lifecycle.approve(&w.vendor, &id, event.proposed_dates[2]).await;
        assert!(matches!(again, Err(AppError::InvalidState(EventStatus::Approved))));
        let reject = w.lifecycle.reject(&w.vendor, &id, "Changed our mind").await;
        assert_eq!(reject.unwrap_err().to_string(), "Event is already approved");

        let stored = w.repo.find_event(event.id).await.unwrap().unwrap();
        assert_eq!(stored.status, EventStatus::Approved);
        assert_eq!(stored.confirmed_date, Some(event.proposed_dates[0]));
        assert_eq!(stored.remarks, "");
    }

    #[tokio::test]
    async fn reject_needs_a_reason() {
        let w = world(ValidationPolicy::default()).await;
        let event = created(&w).await;
        let id = event.id.to_string();

        let err = w.lifecycle.reject(&w.vendor, &id, "   \t").await.unwrap_err();
        assert_eq!(err.to_string(), "Rejection reason is required");

        let rejected = w
            .lifecycle
            .reject(&w.vendor, &id, "  Schedule conflict ")
            .await
            .unwrap();
        assert_eq!(rejected.status, EventStatus::Rejected);
        assert_eq!(rejected.remarks, "Schedule conflict");
        assert_eq!(rejected.confirmed_date, None);
    }

    #[tokio::test]
    async fn checks_run_in_order() {
        let w = world(ValidationPolicy::default()).await;
        let event = created(&w).await;
        let id = event.id.to_string();

        // missing beats everything
        let missing = Uuid::new_v4().to_string();
        assert!(matches!(
            w.lifecycle.reject(&w.vendor, &missing, "").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            w.lifecycle.reject(&w.vendor, "garbage", "x").await,
            Err(AppError::NotFound(_))
        ));

        // foreign vendor is forbidden even with a bad payload
        assert!(matches!(
            w.lifecycle.reject(&w.other_vendor, &id, "").await,
            Err(AppError::Forbidden(_))
        ));

        // HR cannot decide at all
        assert!(matches!(
            w.lifecycle.approve(&w.hr, &id, event.proposed_dates[0]).await,
            Err(AppError::Forbidden(_))
        ));

        w.lifecycle.reject(&w.vendor, &id, "Fully booked").await.unwrap();
        // state beats payload
        assert!(matches!(
            w.lifecycle.reject(&w.vendor, &id, "").await,
            Err(AppError::InvalidState(EventStatus::Rejected))
        ));
    }

    #[tokio::test]
    async fn concurrent_decisions_only_one_wins() {
        let w = world(ValidationPolicy::default()).await;
        let event = created(&w).await;
        let id = event.id.to_string();

        let (a, b) = tokio::join!(
            w.lifecycle.approve(&w.vendor, &id, event.proposed_dates[0]),
            w.lifecycle.reject(&w.vendor, &id, "Schedule conflict"),
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let loser = if a.is_ok() { b.unwrap_err() } else { a.unwrap_err() };
        assert!(matches!(loser, AppError::InvalidState(_)));

        let stored = w.repo.find_event(event.id).await.unwrap().unwrap();
        assert!(stored.status.is_terminal());
    }

    #[tokio::test]
    async fn visibility_is_owner_only() {
        let w = world(ValidationPolicy::default()).await;
        let event = created(&w).await;
        let id = event.id.to_string();

        assert!(w.lifecycle.get_event(&w.hr, &id).await.is_ok());
        assert!(w.lifecycle.get_event(&w.vendor, &id).await.is_ok());
        assert!(matches!(
            w.lifecycle.get_event(&w.other_hr, &id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            w.lifecycle.get_event(&w.other_vendor, &id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            w.lifecycle.get_event(&w.other_vendor, &Uuid::new_v4().to_string()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn end_to_end_negotiation() {
        let w = world(ValidationPolicy::default()).await;
        let event = created(&w).await;
        assert_eq!(event.status, EventStatus::Pending);
        assert_eq!(event.location.postal_code, "50000");

        let id = event.id.to_string();
        let second = event.proposed_dates[1];
        let approved = w.lifecycle.approve(&w.vendor, &id, second).await.unwrap();
        assert_eq!(approved.status, EventStatus::Approved);
        assert_eq!(approved.confirmed_date, Some(second));

        let err = w.lifecycle.approve(&w.other_vendor, &id, second).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
