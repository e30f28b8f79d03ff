use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    middleware::auth::require_admin,
    models::{
        auth::AuthenticatedUser,
        user::{UpdateRoleRequest, UserWithRole},
    },
    services::{export::ExportService, metrics, orders::OrderService},
    AppState,
};

/// GET /admin/users — every account with its effective role.
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_admin(&user)?;

    let users = sqlx::query_as::<_, UserWithRole>(
        "SELECT u.id, u.email, COALESCE(r.role, 'user') AS role
         FROM users u
         LEFT JOIN user_roles r ON u.id = r.user_id
         ORDER BY u.email",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    Ok(Json(serde_json::to_value(users).unwrap()))
}

/// PUT /admin/users/{id}/role
pub async fn update_role(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(target_id): Path<Uuid>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_admin(&user)?;

    sqlx::query(
        "INSERT INTO user_roles (user_id, role)
         VALUES ($1, $2)
         ON CONFLICT (user_id) DO UPDATE SET
             role = EXCLUDED.role,
             updated_at = NOW()",
    )
    .bind(target_id)
    .bind(body.role.to_string())
    .execute(&state.db)
    .await
    .map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    Ok(Json(json!({ "message": "Rolle aktualisiert!" })))
}

/// GET /admin/orders — all orders for the admin table.
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_admin(&user)?;

    OrderService::list_all(&state.db)
        .await
        .map(|orders| Json(serde_json::to_value(orders).unwrap()))
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })
}

/// GET /admin/orders/export — all orders as a CSV download.
pub async fn export_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Response, (StatusCode, Json<Value>)> {
    require_admin(&user)?;

    let bytes = ExportService::orders_csv(&state.db).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    metrics::EXPORTS_COUNTER.inc();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"orders.csv\"",
        )
        .body(Body::from(bytes))
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })
}
