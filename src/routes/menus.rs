use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    middleware::auth::require_admin,
    models::{
        auth::AuthenticatedUser,
        menu::{MenuWeekQuery, UpsertMenuRequest, Weekday},
    },
    services::menus::MenuService,
    AppState,
};

fn check_week(week: i32) -> Result<(), (StatusCode, Json<Value>)> {
    if (1..=52).contains(&week) {
        Ok(())
    } else {
        Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Ungültige Kalenderwoche: {week}") })),
        ))
    }
}

/// GET /menus?week=N — all authenticated users
pub async fn get_week(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<MenuWeekQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    check_week(params.week)?;
    MenuService::list_week(&state.db, params.week)
        .await
        .map(|options| Json(serde_json::to_value(options).unwrap()))
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })
}

/// PUT /menus — admins only
pub async fn upsert_menu(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpsertMenuRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_admin(&user)?;
    check_week(body.week)?;
    if body.weekday.parse::<Weekday>().is_err() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Unbekannter Wochentag: {}", body.weekday) })),
        ));
    }
    if body.label.trim().is_empty() || body.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Bitte Bezeichnung und Menünamen angeben" })),
        ));
    }

    MenuService::upsert(&state.db, &body)
        .await
        .map(|option| Json(serde_json::to_value(option).unwrap()))
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })
}

/// DELETE /menus/{id} — admins only
pub async fn delete_menu(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_admin(&user)?;
    match MenuService::delete(&state.db, id).await {
        Ok(true) => Ok(Json(json!({ "message": "Menüoption gelöscht" }))),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Menüoption nicht gefunden" })),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )),
    }
}
