use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;
use meridian_trip::checkout::CheckoutRequest;
use meridian_trip::models::Trip;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/checkout", post(checkout))
        .route("/v1/trips/{id}/conflicts", get(preview_conflicts))
}

#[derive(Debug, Serialize)]
struct CheckoutResponse {
    success: bool,
    already_confirmed: bool,
    trip: Trip,
}

async fn checkout(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;

    let success = state.checkout.checkout(req, acting_user_id).await?;

    Ok(Json(CheckoutResponse {
        success: true,
        already_confirmed: success.already_confirmed,
        trip: success.trip,
    }))
}

async fn preview_conflicts(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;

    let conflicts = state
        .checkout
        .preview_conflicts(trip_id, acting_user_id)
        .await?;

    Ok(Json(json!({ "conflicts": conflicts })))
}
