use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "listing_condition", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    LikeNew,
    LightlyUsed,
    WellUsed,
    HeavilyUsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "listing_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Available,
    Pending,
    Sold,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub condition: Condition,
    pub location: String,
    pub status: ListingStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Listing {
    #[must_use]
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.seller_id == user_id
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.status, ListingStatus::Available)
    }
}

/// Derives a URL-safe slug from a listing title.
///
/// Lowercases, keeps alphanumerics, collapses everything else into single
/// hyphens. The caller appends a short unique suffix before storing so two
/// identical titles never collide.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() { "listing".to_string() } else { slug }
}
