use crate::config::Config;
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::chat_service::ChatService;
use crate::services::listing_service::ListingService;
use crate::services::notification_service::NotificationService;
use crate::services::offer_service::OfferService;
use crate::services::review_service::ReviewService;
use crate::storage::DbPool;
use axum::body::Body;
use axum::http::Request;
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod chat;
pub mod health;
pub mod listings;
pub mod middleware;
pub mod notifications;
pub mod offers;
pub mod reviews;
pub mod schemas;
pub mod users;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub pool: DbPool,
    pub auth_service: AuthService,
    pub account_service: AccountService,
    pub listing_service: ListingService,
    pub offer_service: OfferService,
    pub chat_service: ChatService,
    pub review_service: ReviewService,
    pub notification_service: NotificationService,
}

/// Configures and returns the application router.
///
/// # Panics
/// Panics if the rate limiter configuration cannot be constructed.
pub fn app_router(state: AppState) -> Router {
    let standard_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(u64::from(state.config.rate_limit.per_second.max(1)))
            .burst_size(state.config.rate_limit.burst)
            .finish()
            .expect("Failed to build standard rate limiter config"),
    );

    // Auth tier: stricter limits for expensive registration and login
    let auth_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(u64::from(state.config.rate_limit.auth_per_second.max(1)))
            .burst_size(state.config.rate_limit.auth_burst)
            .finish()
            .expect("Failed to build auth rate limiter config"),
    );

    // Sensitive routes with strict limits
    let auth_routes = Router::new()
        .route("/users", post(auth::register))
        .route("/sessions", post(auth::login))
        .route("/sessions", delete(auth::logout))
        .route("/sessions/refresh", post(auth::refresh))
        .layer(GovernorLayer::new(auth_conf));

    // Standard routes
    let api_routes = Router::new()
        .route("/users/me", get(users::me))
        .route("/users/me", patch(users::update_me))
        .route("/users/{id}", get(users::profile))
        .route("/users/{id}/reviews", get(reviews::list_for_user))
        .route("/users/{id}/follow", put(users::follow))
        .route("/users/{id}/follow", delete(users::unfollow))
        .route("/listings", post(listings::create))
        .route("/listings", get(listings::search))
        .route("/listings/slug/{slug}", get(listings::get_by_slug))
        .route("/listings/{id}", get(listings::get))
        .route("/listings/{id}", patch(listings::update))
        .route("/listings/{id}", delete(listings::delete))
        .route("/listings/{id}/like", put(listings::like))
        .route("/listings/{id}/like", delete(listings::unlike))
        .route("/listings/{id}/offers", post(offers::create))
        .route("/listings/{id}/offers", get(offers::list_for_listing))
        .route("/listings/{id}/conversations", post(chat::start_conversation))
        .route("/listings/{id}/reviews", post(reviews::create))
        .route("/listings/{id}/reviews", get(reviews::list_for_listing))
        .route("/offers", get(offers::list_mine))
        .route("/offers/{id}", get(offers::get))
        .route("/offers/{id}/accept", post(offers::accept))
        .route("/offers/{id}/reject", post(offers::reject))
        .route("/offers/{id}/cancel", post(offers::cancel))
        .route("/conversations", get(chat::list_conversations))
        .route("/conversations/{id}", delete(chat::archive))
        .route("/conversations/{id}/messages", get(chat::messages))
        .route("/conversations/{id}/messages", post(chat::send_message))
        .route("/messages/{id}/read", post(chat::mark_message_read))
        .route("/messages/{id}", delete(chat::delete_message))
        .route("/notifications", get(notifications::list))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/push/token", put(notifications::register_token))
        .route("/push/token", delete(notifications::unregister_token))
        .layer(GovernorLayer::new(standard_conf));

    Router::new()
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/v1", auth_routes.merge(api_routes))
        .layer(PropagateRequestIdLayer::new(axum::http::HeaderName::from_static("x-request-id")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "user_id" = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                        let status = response.status();
                        tracing::Span::current().record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(
            axum::http::HeaderName::from_static("x-request-id"),
            middleware::MakeRequestUuidOrHeader,
        ))
        .with_state(state)
}
