use crate::domain::review::Review;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    pub rating: i16,
    pub review_text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewed_user_id: Uuid,
    pub listing_id: Uuid,
    pub rating: i16,
    pub review_text: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            reviewer_id: r.reviewer_id,
            reviewed_user_id: r.reviewed_user_id,
            listing_id: r.listing_id,
            rating: r.rating,
            review_text: r.review_text,
            created_at: r.created_at,
        }
    }
}
