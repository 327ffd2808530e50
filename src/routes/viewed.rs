use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::viewed::{TrackViewRequest, ViewedList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ViewedEntry,
    response::ApiResponse,
    services::viewed_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_viewed).post(track_view).delete(clear_viewed))
        .route("/{product_id}", delete(remove_view))
}

#[utoipa::path(get, path = "/api/viewed", security(("bearer_auth" = [])), tag = "Viewed")]
pub async fn list_viewed(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ViewedList>>> {
    let resp = viewed_service::list_viewed(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/viewed",
    request_body = TrackViewRequest,
    security(("bearer_auth" = [])),
    tag = "Viewed"
)]
pub async fn track_view(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<TrackViewRequest>,
) -> AppResult<Json<ApiResponse<ViewedEntry>>> {
    let resp = viewed_service::track_view(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/viewed/{product_id}",
    security(("bearer_auth" = [])),
    tag = "Viewed"
)]
pub async fn remove_view(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = viewed_service::remove_view(&state.pool, &user, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/viewed", security(("bearer_auth" = [])), tag = "Viewed")]
pub async fn clear_viewed(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = viewed_service::clear_viewed(&state.pool, &user).await?;
    Ok(Json(resp))
}
