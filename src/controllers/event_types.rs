use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use super::DataResponse;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::EventTypeDetails;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/event-types", get(list_event_types))
}

// GET /api/event-types
async fn list_event_types(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<Json<DataResponse<Vec<EventTypeDetails>>>, AppError> {
    let types = state.catalog.list_event_types().await?;
    Ok(DataResponse::new(types))
}
