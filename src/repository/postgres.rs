use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::EventRepository;
use crate::database::Database;
use crate::error::{AppError, Result};
use crate::models::{
    Event, EventDetails, EventStatus, EventType, EventTypeDetails, EventTypeRef, Location, PartyRef,
    ProposedDates, Transition, User,
};
use crate::services::authorization::EventScope;

const EVENT_COLUMNS: &str = r#"
    e.id, e.event_type_id, e.requester_company_name, e.proposed_dates,
    e.postal_code, e.street_name, e.status, e.remarks, e.confirmed_date,
    e.requester_id, e.provider_id, e.created_at, e.updated_at
"#;

const DETAILS_JOINS: &str = r#"
    et.name AS event_type_name, et.description AS event_type_description,
    r.username AS requester_username, r.company_name AS requester_company,
    p.username AS provider_username, p.company_name AS provider_company
    FROM events e
    JOIN event_types et ON et.id = e.event_type_id
    JOIN users r ON r.id = e.requester_id
    JOIN users p ON p.id = e.provider_id
"#;

const INSERT_USER: &str = "INSERT INTO users (id, username, password_hash, role, company_name)
     VALUES ($1, $2, $3, $4, $5)";

const INSERT_EVENT_TYPE: &str =
    "INSERT INTO event_types (id, name, description, provider_id) VALUES ($1, $2, $3, $4)";

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    role: String,
    company_name: String,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role: row.role.parse().map_err(|e: String| AppError::internal(anyhow!(e)))?,
            company_name: row.company_name,
        })
    }
}

#[derive(FromRow)]
struct EventTypeRow {
    id: Uuid,
    name: String,
    description: String,
    provider_id: Uuid,
}

#[derive(FromRow)]
struct EventTypeDetailsRow {
    id: Uuid,
    name: String,
    description: String,
    provider_id: Uuid,
    provider_username: String,
    provider_company: String,
}

#[derive(FromRow)]
struct EventRow {
    id: Uuid,
    event_type_id: Uuid,
    requester_company_name: String,
    proposed_dates: Vec<DateTime<Utc>>,
    postal_code: String,
    street_name: String,
    status: String,
    remarks: String,
    confirmed_date: Option<DateTime<Utc>>,
    requester_id: Uuid,
    provider_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = AppError;

    fn try_from(row: EventRow) -> Result<Self> {
        let id = row.id;
        let corrupt = |e: AppError| AppError::internal(anyhow!("stored event {} is invalid: {}", id, e));
        Ok(Event {
            id,
            event_type_id: row.event_type_id,
            requester_company_name: row.requester_company_name,
            proposed_dates: ProposedDates::new(row.proposed_dates).map_err(corrupt)?,
            location: Location {
                postal_code: row.postal_code,
                street_name: row.street_name,
            },
            status: row
                .status
                .parse::<EventStatus>()
                .map_err(|e| AppError::internal(anyhow!(e)))?,
            remarks: row.remarks,
            confirmed_date: row.confirmed_date,
            requester_id: row.requester_id,
            provider_id: row.provider_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct EventDetailsRow {
    #[sqlx(flatten)]
    event: EventRow,
    event_type_name: String,
    event_type_description: String,
    requester_username: String,
    requester_company: String,
    provider_username: String,
    provider_company: String,
}

impl TryFrom<EventDetailsRow> for EventDetails {
    type Error = AppError;

    fn try_from(row: EventDetailsRow) -> Result<Self> {
        let event = Event::try_from(row.event)?;
        let event_type = EventTypeRef {
            id: event.event_type_id,
            name: row.event_type_name,
            description: row.event_type_description,
        };
        let requester = PartyRef {
            id: event.requester_id,
            username: row.requester_username,
            company_name: row.requester_company,
        };
        let provider = PartyRef {
            id: event.provider_id,
            username: row.provider_username,
            company_name: row.provider_company,
        };
        Ok(EventDetails::resolve(event, event_type, requester, provider))
    }
}

pub struct PostgresRepository {
    db: Database,
}

impl PostgresRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventRepository for PostgresRepository {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, company_name FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, company_name FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.db.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(INSERT_USER)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(&user.company_name)
            .execute(&self.db.pool)
            .await?;
        Ok(())
    }

    async fn list_event_types(&self) -> Result<Vec<EventTypeDetails>> {
        let rows = sqlx::query_as::<_, EventTypeDetailsRow>(
            r#"
            SELECT et.id, et.name, et.description, et.provider_id,
                   p.username AS provider_username, p.company_name AS provider_company
            FROM event_types et
            JOIN users p ON p.id = et.provider_id
            ORDER BY et.name, et.id
            "#,
        )
        .fetch_all(&self.db.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| EventTypeDetails {
                id: r.id,
                name: r.name,
                description: r.description,
                provider: PartyRef {
                    id: r.provider_id,
                    username: r.provider_username,
                    company_name: r.provider_company,
                },
            })
            .collect())
    }

    async fn find_event_type(&self, id: Uuid) -> Result<Option<EventType>> {
        let row = sqlx::query_as::<_, EventTypeRow>(
            "SELECT id, name, description, provider_id FROM event_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(row.map(|r| EventType {
            id: r.id,
            name: r.name,
            description: r.description,
            provider_id: r.provider_id,
        }))
    }

    async fn insert_event_type(&self, event_type: &EventType) -> Result<()> {
        sqlx::query(INSERT_EVENT_TYPE)
            .bind(event_type.id)
            .bind(&event_type.name)
            .bind(&event_type.description)
            .bind(event_type.provider_id)
            .execute(&self.db.pool)
            .await?;
        Ok(())
    }

    async fn replace_all(&self, users: &[User], event_types: &[EventType]) -> Result<()> {
        let mut tx = self.db.pool.begin().await?;

        sqlx::query("TRUNCATE events, event_types, users")
            .execute(&mut *tx)
            .await?;

        for user in users {
            sqlx::query(INSERT_USER)
                .bind(user.id)
                .bind(&user.username)
                .bind(&user.password_hash)
                .bind(user.role.as_str())
                .bind(&user.company_name)
                .execute(&mut *tx)
                .await?;
        }

        for event_type in event_types {
            sqlx::query(INSERT_EVENT_TYPE)
                .bind(event_type.id)
                .bind(&event_type.name)
                .bind(&event_type.description)
                .bind(event_type.provider_id)
                .execute(&mut *tx)
                .await?;
        }

        // dropping `tx` before this point rolls everything back
        tx.commit().await?;
        Ok(())
    }

    async fn insert_event(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (
                id, event_type_id, requester_company_name, proposed_dates,
                postal_code, street_name, status, remarks, confirmed_date,
                requester_id, provider_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(event.id)
        .bind(event.event_type_id)
        .bind(&event.requester_company_name)
        .bind(event.proposed_dates.to_vec())
        .bind(&event.location.postal_code)
        .bind(&event.location.street_name)
        .bind(event.status.as_str())
        .bind(&event.remarks)
        .bind(event.confirmed_date)
        .bind(event.requester_id)
        .bind(event.provider_id)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.db.pool)
        .await?;
        Ok(())
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        let sql = format!("SELECT {} FROM events e WHERE e.id = $1", EVENT_COLUMNS);
        sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?
            .map(Event::try_from)
            .transpose()
    }

    async fn find_event_details(&self, id: Uuid) -> Result<Option<EventDetails>> {
        let sql = format!("SELECT {}, {} WHERE e.id = $1", EVENT_COLUMNS, DETAILS_JOINS);
        sqlx::query_as::<_, EventDetailsRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?
            .map(EventDetails::try_from)
            .transpose()
    }

    async fn transition_if_pending(
        &self,
        id: Uuid,
        transition: &Transition,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        // Compare-and-swap: the status guard lives in the WHERE clause
        let result = sqlx::query(
            r#"
            UPDATE events
            SET status = $2, confirmed_date = $3, remarks = $4, updated_at = $5
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(transition.target_status().as_str())
        .bind(transition.confirmed_date())
        .bind(transition.remarks())
        .bind(at)
        .execute(&self.db.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_events(&self, scope: &EventScope, skip: u64, limit: u64) -> Result<Vec<EventDetails>> {
        let sql = format!(
            "SELECT {}, {} WHERE e.{} = $1 ORDER BY e.created_at DESC, e.id DESC LIMIT $2 OFFSET $3",
            EVENT_COLUMNS,
            DETAILS_JOINS,
            scope.owner_column()
        );
        let rows = sqlx::query_as::<_, EventDetailsRow>(&sql)
            .bind(scope.owner_id())
            .bind(limit.min(i64::MAX as u64) as i64)
            .bind(skip.min(i64::MAX as u64) as i64)
            .fetch_all(&self.db.pool)
            .await?;

        rows.into_iter().map(EventDetails::try_from).collect()
    }

    async fn count_events(&self, scope: &EventScope) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM events WHERE {} = $1", scope.owner_column());
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(scope.owner_id())
            .fetch_one(&self.db.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn close(&self) {
        self.db.close().await;
    }
}
