use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::chat::{ConversationResponse, MessageResponse, SendMessage};
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn start_conversation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let conversation = state.chat_service.start_conversation(auth_user.user_id, listing_id).await?;
    Ok((StatusCode::CREATED, Json(ConversationResponse::from(conversation))))
}

pub async fn list_conversations(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let conversations = state.chat_service.list(auth_user.user_id).await?;
    let response: Vec<ConversationResponse> =
        conversations.into_iter().map(ConversationResponse::from).collect();
    Ok(Json(response))
}

pub async fn messages(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let messages = state.chat_service.messages(auth_user.user_id, id).await?;
    let response: Vec<MessageResponse> = messages.into_iter().map(MessageResponse::from).collect();
    Ok(Json(response))
}

pub async fn send_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessage>,
) -> Result<impl IntoResponse> {
    let message =
        state.chat_service.send_message(auth_user.user_id, id, payload.content, payload.kind).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

pub async fn archive(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.chat_service.archive(auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_message_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.chat_service.mark_read(auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.chat_service.delete_message(auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
