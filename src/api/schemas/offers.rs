use crate::domain::offer::{Offer, OfferStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct CreateOffer {
    pub price: Decimal,
    pub message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferResponse {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub offered_by: Uuid,
    pub price: Decimal,
    pub status: OfferStatus,
    pub message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Offer> for OfferResponse {
    fn from(offer: Offer) -> Self {
        Self {
            id: offer.id,
            listing_id: offer.listing_id,
            offered_by: offer.offered_by,
            price: offer.price,
            status: offer.status,
            message: offer.message,
            created_at: offer.created_at,
        }
    }
}
