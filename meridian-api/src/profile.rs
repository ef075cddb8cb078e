use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;
use meridian_core::payment::PaymentMethod;
use meridian_core::repository::{CalendarEvent, NewCalendarEvent};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/calendar", get(list_events).post(create_event))
        .route("/v1/calendar/{id}", delete(delete_event))
        .route("/v1/payment-methods", get(list_payment_methods))
}

async fn list_events(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<CalendarEvent>>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;
    let events = state
        .calendar
        .list_events(acting_user_id)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    Ok(Json(events))
}

#[derive(Debug, Deserialize)]
struct CreateEventRequest {
    title: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    #[serde(default)]
    is_all_day: bool,
    description: Option<String>,
}

async fn create_event(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<CreateEventRequest>,
) -> Result<Json<CalendarEvent>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;

    if req.title.trim().is_empty() {
        return Err(AppError::ValidationError("event title is required".to_string()));
    }
    if req.end < req.start {
        return Err(AppError::ValidationError(
            "event end must not precede its start".to_string(),
        ));
    }

    let event = state
        .calendar
        .create_event(&NewCalendarEvent {
            user_id: acting_user_id,
            title: req.title,
            start: req.start,
            end: req.end,
            is_all_day: req.is_all_day,
            description: req.description,
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(Json(event))
}

async fn delete_event(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;

    let event = state
        .calendar
        .get_event(event_id)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .ok_or_else(|| AppError::NotFound(format!("event {}", event_id)))?;

    if event.user_id != acting_user_id {
        return Err(AppError::Forbidden);
    }

    state
        .calendar
        .delete_event(event_id)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(Json(json!({ "success": true })))
}

async fn list_payment_methods(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<PaymentMethod>>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;
    let methods = state
        .payments
        .list_for_user(acting_user_id)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    Ok(Json(methods))
}
