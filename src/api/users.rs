use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::users::{MeResponse, ProfileResponse, UpdateProfile};
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn me(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let user = state.account_service.me(auth_user.user_id).await?;
    Ok(Json(MeResponse::from(user)))
}

pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfile>,
) -> Result<impl IntoResponse> {
    let user =
        state.account_service.update_profile(auth_user.user_id, payload.nickname, payload.avatar).await?;
    Ok(Json(MeResponse::from(user)))
}

pub async fn profile(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse> {
    let profile = state.account_service.profile(id).await?;
    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn follow(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.account_service.follow(auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unfollow(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.account_service.unfollow(auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
