use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::offers::{CreateOffer, OfferResponse};
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
    Json(payload): Json<CreateOffer>,
) -> Result<impl IntoResponse> {
    let offer =
        state.offer_service.create(auth_user.user_id, listing_id, payload.price, payload.message).await?;
    Ok((StatusCode::CREATED, Json(OfferResponse::from(offer))))
}

pub async fn list_for_listing(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let offers = state.offer_service.list_for_listing(auth_user.user_id, listing_id).await?;
    let response: Vec<OfferResponse> = offers.into_iter().map(OfferResponse::from).collect();
    Ok(Json(response))
}

pub async fn list_mine(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let offers = state.offer_service.list_mine(auth_user.user_id).await?;
    let response: Vec<OfferResponse> = offers.into_iter().map(OfferResponse::from).collect();
    Ok(Json(response))
}

pub async fn get(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let offer = state.offer_service.get(auth_user.user_id, id).await?;
    Ok(Json(OfferResponse::from(offer)))
}

pub async fn accept(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let offer = state.offer_service.accept(auth_user.user_id, id).await?;
    Ok(Json(OfferResponse::from(offer)))
}

pub async fn reject(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let offer = state.offer_service.reject(auth_user.user_id, id).await?;
    Ok(Json(OfferResponse::from(offer)))
}

pub async fn cancel(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let offer = state.offer_service.cancel(auth_user.user_id, id).await?;
    Ok(Json(OfferResponse::from(offer)))
}
