use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::auth::{AuthSession as AuthSessionSchema, Login, Logout, Refresh, Registered, Registration};
use crate::domain::auth_session::AuthSession;
use crate::error::Result;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Registration>,
) -> Result<impl IntoResponse> {
    let (user, session) =
        state.auth_service.register(payload.email, payload.nickname, payload.password).await?;

    let response = Registered { user: user.into(), session: map_session(session) };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(State(state): State<AppState>, Json(payload): Json<Login>) -> Result<impl IntoResponse> {
    let session = state.auth_service.login(payload.email, payload.password).await?;
    Ok(Json(map_session(session)))
}

pub async fn refresh(State(state): State<AppState>, Json(payload): Json<Refresh>) -> Result<impl IntoResponse> {
    let session = state.auth_service.refresh(payload.refresh_token).await?;
    Ok(Json(map_session(session)))
}

pub async fn logout(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<Logout>,
) -> Result<impl IntoResponse> {
    state.auth_service.logout(auth_user.user_id, payload.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn map_session(session: AuthSession) -> AuthSessionSchema {
    AuthSessionSchema {
        token: session.token,
        refresh_token: session.refresh_token,
        expires_at: session.expires_at,
    }
}
