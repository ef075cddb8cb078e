use axum::{extract::State, routing::post, Json, Router};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;
use meridian_trip::draft::DraftOutcome;
use meridian_trip::intent::TripIntent;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/drafts", post(assemble_draft))
}

/// Agent entry point: intent in, draft trip plus per-category results out.
/// The body is untrusted and partially filled; unusable fields degrade
/// instead of failing the whole call.
async fn assemble_draft(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Json(intent): Json<TripIntent>,
) -> Result<Json<DraftOutcome>, AppError> {
    let acting_user_id = authenticate(&state.auth, bearer.token())?;

    let outcome = state.drafts.assemble_draft(intent, acting_user_id).await?;
    Ok(Json(outcome))
}
