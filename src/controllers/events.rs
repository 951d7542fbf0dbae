use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiJson, DataResponse};
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{event::parse_instant, EventDetails, Role};
use crate::services::authorization::require_role;
use crate::services::lifecycle::NewEventRequest;
use crate::services::pagination::{Page, PageRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/approve", patch(approve_event))
        .route("/events/{id}/reject", patch(reject_event))
}

/* ---------- LISTING ---------- */

// Strings on purpose: junk like `?page=abc` falls back to defaults instead of 400
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

// GET /api/events
async fn list_events(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<EventsQuery>,
) -> Result<Json<Page<EventDetails>>, AppError> {
    let request = PageRequest::from_query(params.page.as_deref(), params.limit.as_deref());
    let page = state.listing.list_events(&user, request).await?;
    Ok(Json(page))
}

// GET /api/events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<EventDetails>>, AppError> {
    let event = state.lifecycle.get_event(&user, &id).await?;
    Ok(DataResponse::new(event))
}

/* ---------- CREATION ---------- */

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationBody {
    pub postal_code: Option<String>,
    pub street_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventBody {
    #[serde(default)]
    pub event_type_id: String,
    #[serde(default)]
    pub proposed_dates: Vec<String>,
    pub location: Option<LocationBody>,
}

// POST /api/events
async fn create_event(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(body): ApiJson<CreateEventBody>,
) -> Result<impl IntoResponse, AppError> {
    let location = body.location.unwrap_or_default();
    let request = NewEventRequest {
        event_type_id: body.event_type_id,
        proposed_dates: body.proposed_dates,
        postal_code: location.postal_code,
        street_name: location.street_name,
    };
    let event = state.lifecycle.create_event(&user, request).await?;
    Ok((StatusCode::CREATED, DataResponse::new(event)))
}

/* ---------- DECISIONS ---------- */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveBody {
    pub confirmed_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
    pub remarks: Option<String>,
}

// PATCH /api/events/{id}/approve
async fn approve_event(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ApproveBody>,
) -> Result<Json<DataResponse<EventDetails>>, AppError> {
    // HR gets 403 here even with an empty body
    require_role(&user, Role::Provider)?;
    let raw = body
        .confirmed_date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::validation("Confirmed date is required"))?;
    let confirmed_date = parse_instant(&raw)?;

    let event = state.lifecycle.approve(&user, &id, confirmed_date).await?;
    Ok(DataResponse::new(event))
}

// PATCH /api/events/{id}/reject
async fn reject_event(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RejectBody>,
) -> Result<Json<DataResponse<EventDetails>>, AppError> {
    let remarks = body.remarks.unwrap_or_default();
    let event = state.lifecycle.reject(&user, &id, &remarks).await?;
    Ok(DataResponse::new(event))
}
