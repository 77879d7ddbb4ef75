pub mod auth;
pub mod auth_session;
pub mod chat;
pub mod listing;
pub mod notification;
pub mod offer;
pub mod review;
pub mod user;
