use crate::error::{AppError, Result};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewed_user_id: Uuid,
    pub listing_id: Uuid,
    pub rating: i16,
    pub review_text: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Validates a review rating.
///
/// # Errors
/// Returns `AppError::Validation` unless the rating is between 1 and 5.
pub fn validate_rating(rating: i16) -> Result<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation("Rating must be between 1 and 5".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(-3).is_err());
    }
}
