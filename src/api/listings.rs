use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::listings::{
    CreateListing, ListingResponse, ListingSummary, SearchQuery, UpdateListing,
};
use crate::error::Result;
use crate::services::listing_service::CreateListingInput;
use crate::storage::listing_repo::{ListingPatch, ListingSearch};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

const MAX_PAGE_SIZE: i64 = 100;

pub async fn create(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateListing>,
) -> Result<impl IntoResponse> {
    let input = CreateListingInput {
        title: payload.title,
        description: payload.description,
        price: payload.price,
        condition: payload.condition,
        location: payload.location,
        images: payload.images,
    };

    let created = state.listing_service.create(auth_user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(ListingResponse::from(created))))
}

pub async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Result<impl IntoResponse> {
    let params = ListingSearch {
        title: query.q,
        condition: query.condition,
        status: query.status,
        min_price: query.min_price,
        max_price: query.max_price,
        seller_id: query.seller_id,
        limit: query.limit.unwrap_or(20).clamp(1, MAX_PAGE_SIZE),
        offset: query.offset.unwrap_or(0).max(0),
    };

    let listings = state.listing_service.search(params).await?;
    let response: Vec<ListingSummary> = listings.into_iter().map(ListingSummary::from).collect();
    Ok(Json(response))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse> {
    let listing = state.listing_service.get(id).await?;
    Ok(Json(ListingResponse::from(listing)))
}

pub async fn get_by_slug(State(state): State<AppState>, Path(slug): Path<String>) -> Result<impl IntoResponse> {
    let listing = state.listing_service.get_by_slug(&slug).await?;
    Ok(Json(ListingResponse::from(listing)))
}

pub async fn update(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateListing>,
) -> Result<impl IntoResponse> {
    let patch = ListingPatch {
        title: payload.title,
        description: payload.description,
        price: payload.price,
        condition: payload.condition,
        location: payload.location,
        status: payload.status,
    };

    let updated = state.listing_service.update(auth_user.user_id, id, patch).await?;
    Ok(Json(ListingResponse::from(updated)))
}

pub async fn delete(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.listing_service.delete(auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.listing_service.like(auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlike(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.listing_service.unlike(auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
