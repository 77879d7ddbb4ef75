use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::notifications::{DeviceToken, ListQuery, NotificationResponse, UnreadCount};
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

const MAX_PAGE_SIZE: i64 = 100;

pub async fn list(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let limit = query.limit.unwrap_or(50).clamp(1, MAX_PAGE_SIZE);
    let notifications = state.notification_service.list(auth_user.user_id, query.unread, limit).await?;
    let response: Vec<NotificationResponse> =
        notifications.into_iter().map(NotificationResponse::from).collect();
    Ok(Json(response))
}

pub async fn unread_count(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let unread = state.notification_service.unread_count(auth_user.user_id).await?;
    Ok(Json(UnreadCount { unread }))
}

pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let updated = state.notification_service.mark_read(id, auth_user.user_id).await?;
    if !updated {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.notification_service.mark_all_read(auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Registers or updates a push token for the authenticated user.
pub async fn register_token(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<DeviceToken>,
) -> Result<impl IntoResponse> {
    state.notification_service.register_device(auth_user.user_id, &payload.token).await?;
    Ok(StatusCode::OK)
}

pub async fn unregister_token(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<DeviceToken>,
) -> Result<impl IntoResponse> {
    state.notification_service.unregister_device(auth_user.user_id, &payload.token).await?;
    Ok(StatusCode::NO_CONTENT)
}
