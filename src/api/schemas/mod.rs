pub mod auth;
pub mod chat;
pub mod health;
pub mod listings;
pub mod notifications;
pub mod offers;
pub mod reviews;
pub mod users;
