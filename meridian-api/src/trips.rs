use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde_json::json;
use uuid::Uuid;

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;
use meridian_trip::manager::{NewBooking, NewTrip};
use meridian_trip::models::{Booking, Trip};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips", get(list_trips).post(create_trip))
        .route("/v1/trips/{id}", get(get_trip).delete(delete_trip))
        .route("/v1/trips/{id}/bookings", post(add_booking))
        .route("/v1/bookings/{id}", delete(remove_booking))
        .route("/v1/bookings/{id}/reject", post(reject_booking))
}

async fn list_trips(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<Trip>>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;
    let trips = state.manager.list_trips(acting_user_id).await?;
    Ok(Json(trips))
}

async fn create_trip(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Json(params): Json<NewTrip>,
) -> Result<Json<Trip>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;
    let trip = state.manager.create_trip(acting_user_id, params).await?;
    Ok(Json(trip))
}

async fn get_trip(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Trip>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;
    let trip = state.manager.get_trip(trip_id, acting_user_id).await?;
    Ok(Json(trip))
}

async fn delete_trip(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;
    state.manager.delete_trip(trip_id, acting_user_id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn add_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(trip_id): Path<Uuid>,
    Json(params): Json<NewBooking>,
) -> Result<Json<Booking>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;
    let booking = state
        .manager
        .add_booking(trip_id, acting_user_id, params)
        .await?;
    Ok(Json(booking))
}

async fn remove_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;
    state
        .manager
        .remove_booking(booking_id, acting_user_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}

async fn reject_booking(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;
    state
        .manager
        .reject_booking(booking_id, acting_user_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}
