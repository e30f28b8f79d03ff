use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{models::auth::AuthenticatedUser, services::auth::AuthService, AppState};

/// GET /profile — the caller's own profile.
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    AuthService::profile_of(&state.db, user.user_id)
        .await
        .map(|profile| Json(serde_json::to_value(profile).unwrap()))
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })
}
