use crate::error::{AppError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "offer_status", rename_all = "PascalCase")]
#[serde(rename_all = "PascalCase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl OfferStatus {
    /// All states other than `Pending` are terminal; nothing transitions
    /// out of them.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Offer {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub offered_by: Uuid,
    pub price: Decimal,
    pub status: OfferStatus,
    pub message: Option<String>,
    pub created_at: OffsetDateTime,
}

impl Offer {
    /// Guards a state transition attempt.
    ///
    /// # Errors
    /// Returns `AppError::InvalidState` if the offer already left `Pending`.
    pub fn ensure_pending(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "Offer is already {}",
                match self.status {
                    OfferStatus::Accepted => "accepted",
                    OfferStatus::Rejected => "rejected",
                    OfferStatus::Cancelled => "cancelled",
                    OfferStatus::Pending => "pending",
                }
            )));
        }
        Ok(())
    }
}

/// Formats a price the way it appears in chat messages and notifications.
#[must_use]
pub fn format_price(price: Decimal) -> String {
    format!("{:.2}", price)
}

/// Synthetic chat message contents for offer lifecycle events. Authored by
/// the acting user so the event shows up inline in the existing thread.
#[must_use]
pub fn created_message(price: Decimal) -> String {
    format!("Made an offer of ${}", format_price(price))
}

#[must_use]
pub fn accepted_message(price: Decimal) -> String {
    format!("Accepted the offer of ${}", format_price(price))
}

#[must_use]
pub fn rejected_message(price: Decimal) -> String {
    format!("Rejected the offer of ${}", format_price(price))
}

#[must_use]
pub fn cancelled_message(price: Decimal) -> String {
    format!("Cancelled my offer of ${}", format_price(price))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OfferStatus::Pending.is_terminal());
        assert!(OfferStatus::Accepted.is_terminal());
        assert!(OfferStatus::Rejected.is_terminal());
        assert!(OfferStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_ensure_pending_rejects_terminal() {
        let offer = Offer {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            offered_by: Uuid::new_v4(),
            price: dec("50.00"),
            status: OfferStatus::Rejected,
            message: None,
            created_at: OffsetDateTime::now_utc(),
        };
        assert!(matches!(offer.ensure_pending(), Err(crate::error::AppError::InvalidState(_))));
    }

    #[test]
    fn test_price_formatting_two_decimals() {
        assert_eq!(format_price(dec("75.5")), "75.50");
        assert_eq!(format_price(dec("150")), "150.00");
    }

    #[test]
    fn test_message_templates_contain_price() {
        assert_eq!(accepted_message(dec("150.00")), "Accepted the offer of $150.00");
        assert_eq!(cancelled_message(dec("75.50")), "Cancelled my offer of $75.50");
        assert!(created_message(dec("12.34")).contains("12.34"));
        assert!(rejected_message(dec("12.34")).contains("12.34"));
    }
}
