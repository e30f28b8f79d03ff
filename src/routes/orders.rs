use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    models::{
        auth::AuthenticatedUser,
        order::{OrdersQuery, SubmitOrderRequest},
    },
    services::{
        auth::AuthService,
        metrics,
        orders::{OrderService, SubmitError},
        ordering,
    },
    AppState,
};

/// GET /orders?week=N — the caller's week: pre-selection state for the order
/// form plus the rendered overview (or its "no orders" sentinel).
pub async fn get_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<OrdersQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if !(1..=52).contains(&params.week) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Ungültige Kalenderwoche: {}", params.week) })),
        ));
    }

    let profile = AuthService::profile_of(&state.db, user.user_id)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?;

    let rows = OrderService::for_user(&state.db, &profile.full_name(), params.week)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?;

    let selections = ordering::reconcile_selections(&rows);
    let overview = ordering::project_overview(&rows);

    Ok(Json(json!({
        "week": params.week,
        "selections": selections,
        "overview": overview,
    })))
}

/// POST /orders — compile the submitted selections against the current menu
/// and upsert the result. Closed and unselected days are skipped.
pub async fn submit_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<SubmitOrderRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let profile = AuthService::profile_of(&state.db, user.user_id)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?;

    let records = OrderService::submit(
        &state.db,
        &profile.full_name(),
        &profile.location,
        body.week,
        &body.selections,
    )
    .await
    .map_err(|e| match e {
        SubmitError::InvalidWeek(_) | SubmitError::UnknownWeekday(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        ),
        SubmitError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    })?;

    metrics::ORDERS_SUBMITTED_COUNTER
        .with_label_values(&[&profile.location])
        .inc_by(records.len() as f64);

    let saved: Vec<&str> = records.iter().map(|r| r.weekday.as_str()).collect();
    Ok(Json(json!({ "message": "Bestellung gespeichert!", "saved": saved })))
}
