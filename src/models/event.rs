use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::event_type::{EventType, EventTypeRef};
use super::user::PartyRef;
use crate::error::{AppError, Result};

pub const PROPOSED_DATE_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Approved,
    Rejected,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Approved => "approved",
            EventStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, EventStatus::Pending)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EventStatus::Pending),
            "approved" => Ok(EventStatus::Approved),
            "rejected" => Ok(EventStatus::Rejected),
            other => Err(format!("unknown event status: {}", other)),
        }
    }
}

/// Instants are compared at millisecond resolution, the precision clients send.
pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

/// Accepts an RFC 3339 instant or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(truncate_to_millis(at.with_timezone(&Utc)));
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day.and_time(NaiveTime::MIN).and_utc());
    }
    Err(AppError::validation(format!("Invalid date: {}", raw)))
}

/// Exactly three candidate instants, pairwise distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedDates([DateTime<Utc>; PROPOSED_DATE_COUNT]);

impl ProposedDates {
    pub fn new(dates: Vec<DateTime<Utc>>) -> Result<Self> {
        let dates: [DateTime<Utc>; PROPOSED_DATE_COUNT] = dates
            .into_iter()
            .map(truncate_to_millis)
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| AppError::validation("Exactly 3 proposed dates are required"))?;

        let [a, b, c] = dates;
        if a == b || a == c || b == c {
            return Err(AppError::validation("All 3 proposed dates must be different"));
        }
        Ok(Self(dates))
    }

    /// Parses the raw strings a client sends. Count is checked before format.
    pub fn parse(raw: &[String]) -> Result<Self> {
        if raw.len() != PROPOSED_DATE_COUNT {
            return Err(AppError::validation("Exactly 3 proposed dates are required"));
        }
        let dates = raw
            .iter()
            .map(|s| parse_instant(s))
            .collect::<Result<Vec<_>>>()?;
        Self::new(dates)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let at = truncate_to_millis(at);
        self.0.iter().any(|d| *d == at)
    }

    pub fn as_slice(&self) -> &[DateTime<Utc>] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<DateTime<Utc>> {
        self.0.to_vec()
    }
}

pub const MAX_STREET_NAME_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub postal_code: String,
    pub street_name: String,
}

impl Location {
    pub fn new(postal_code: Option<&str>, street_name: Option<&str>) -> Result<Self> {
        let postal_code = postal_code.map(str::trim).unwrap_or_default();
        if postal_code.is_empty() {
            return Err(AppError::validation("Postal code is required"));
        }
        let street_name = street_name.map(str::trim).unwrap_or_default();
        if street_name.chars().count() > MAX_STREET_NAME_CHARS {
            return Err(AppError::validation("Street name cannot exceed 200 characters"));
        }
        Ok(Self {
            postal_code: postal_code.to_string(),
            street_name: street_name.to_string(),
        })
    }
}

/// The single move a vendor makes on a pending event.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Approve { confirmed_date: DateTime<Utc> },
    Reject { remarks: String },
}

impl Transition {
    pub fn approve(confirmed_date: DateTime<Utc>) -> Self {
        Transition::Approve {
            confirmed_date: truncate_to_millis(confirmed_date),
        }
    }

    pub fn reject(remarks: &str) -> Result<Self> {
        let remarks = remarks.trim();
        if remarks.is_empty() {
            return Err(AppError::validation("Rejection reason is required"));
        }
        Ok(Transition::Reject {
            remarks: remarks.to_string(),
        })
    }

    pub fn target_status(&self) -> EventStatus {
        match self {
            Transition::Approve { .. } => EventStatus::Approved,
            Transition::Reject { .. } => EventStatus::Rejected,
        }
    }

    pub fn confirmed_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Transition::Approve { confirmed_date } => Some(*confirmed_date),
            Transition::Reject { .. } => None,
        }
    }

    pub fn remarks(&self) -> &str {
        match self {
            Transition::Approve { .. } => "",
            Transition::Reject { remarks } => remarks,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub event_type_id: Uuid,
    pub requester_company_name: String,
    pub proposed_dates: ProposedDates,
    pub location: Location,
    pub status: EventStatus,
    pub remarks: String,
    pub confirmed_date: Option<DateTime<Utc>>,
    pub requester_id: Uuid,
    pub provider_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// New pending request. The vendor always comes from the event type.
    pub fn new_pending(
        event_type: &EventType,
        requester_id: Uuid,
        requester_company_name: &str,
        proposed_dates: ProposedDates,
        location: Location,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type_id: event_type.id,
            requester_company_name: requester_company_name.trim().to_string(),
            proposed_dates,
            location,
            status: EventStatus::Pending,
            remarks: String::new(),
            confirmed_date: None,
            requester_id,
            provider_id: event_type.provider_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn ensure_pending(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(AppError::InvalidState(self.status));
        }
        Ok(())
    }

    /// Checks a transition against this event without applying it.
    pub fn check_transition(&self, transition: &Transition) -> Result<()> {
        self.ensure_pending()?;
        if let Transition::Approve { confirmed_date } = transition {
            if !self.proposed_dates.contains(*confirmed_date) {
                return Err(AppError::validation(
                    "Confirmed date must be one of the 3 proposed dates",
                ));
            }
        }
        Ok(())
    }

    pub fn apply(&mut self, transition: &Transition, at: DateTime<Utc>) -> Result<()> {
        self.check_transition(transition)?;
        self.status = transition.target_status();
        self.confirmed_date = transition.confirmed_date();
        self.remarks = transition.remarks().to_string();
        self.updated_at = at;
        Ok(())
    }
}

/// An event with its type, requester and vendor joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub id: Uuid,
    pub event_type: EventTypeRef,
    pub requester_company_name: String,
    pub proposed_dates: Vec<DateTime<Utc>>,
    pub location: Location,
    pub status: EventStatus,
    pub remarks: String,
    pub confirmed_date: Option<DateTime<Utc>>,
    pub requester: PartyRef,
    pub provider: PartyRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventDetails {
    pub fn resolve(event: Event, event_type: EventTypeRef, requester: PartyRef, provider: PartyRef) -> Self {
        Self {
            id: event.id,
            event_type,
            requester_company_name: event.requester_company_name,
            proposed_dates: event.proposed_dates.to_vec(),
            location: event.location,
            status: event.status,
            remarks: event.remarks,
            confirmed_date: event.confirmed_date,
            requester,
            provider,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}
