use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::reviews::{CreateReview, ReviewResponse};
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn create(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Json(payload): Json<CreateReview>,
) -> Result<impl IntoResponse> {
    let review = state
        .review_service
        .create(auth_user.user_id, listing_id, payload.rating, payload.review_text)
        .await?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

pub async fn list_for_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let reviews = state.review_service.list_for_listing(listing_id).await?;
    let response: Vec<ReviewResponse> = reviews.into_iter().map(ReviewResponse::from).collect();
    Ok(Json(response))
}

pub async fn list_for_user(State(state): State<AppState>, Path(user_id): Path<Uuid>) -> Result<impl IntoResponse> {
    let reviews = state.review_service.list_for_user(user_id).await?;
    let response: Vec<ReviewResponse> = reviews.into_iter().map(ReviewResponse::from).collect();
    Ok(Json(response))
}
