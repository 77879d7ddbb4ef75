pub mod account_service;
pub mod auth_service;
pub mod chat_service;
pub mod listing_service;
pub mod notification_service;
pub mod offer_service;
pub mod push;
pub mod review_service;
