use crate::domain::listing::{Condition, Listing, ListingStatus};
use crate::services::listing_service::ListingWithImages;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct CreateListing {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub condition: Condition,
    pub location: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateListing {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub condition: Option<Condition>,
    pub location: Option<String>,
    pub status: Option<ListingStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub q: Option<String>,
    pub condition: Option<Condition>,
    pub status: Option<ListingStatus>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub seller_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub slug: String,
    pub price: Decimal,
    pub condition: Condition,
    pub location: String,
    pub status: ListingStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Listing> for ListingSummary {
    fn from(listing: Listing) -> Self {
        Self {
            id: listing.id,
            seller_id: listing.seller_id,
            title: listing.title,
            slug: listing.slug,
            price: listing.price,
            condition: listing.condition,
            location: listing.location,
            status: listing.status,
            created_at: listing.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub condition: Condition,
    pub location: String,
    pub status: ListingStatus,
    pub images: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ListingWithImages> for ListingResponse {
    fn from(value: ListingWithImages) -> Self {
        let listing = value.listing;
        Self {
            id: listing.id,
            seller_id: listing.seller_id,
            title: listing.title,
            slug: listing.slug,
            description: listing.description,
            price: listing.price,
            condition: listing.condition,
            location: listing.location,
            status: listing.status,
            images: value.images,
            created_at: listing.created_at,
            updated_at: listing.updated_at,
        }
    }
}
