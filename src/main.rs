#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use std::net::SocketAddr;
use std::sync::Arc;
use tradewind_server::api::{self, AppState};
use tradewind_server::config::Config;
use tradewind_server::services::account_service::AccountService;
use tradewind_server::services::auth_service::AuthService;
use tradewind_server::services::chat_service::ChatService;
use tradewind_server::services::listing_service::ListingService;
use tradewind_server::services::notification_service::NotificationService;
use tradewind_server::services::offer_service::OfferService;
use tradewind_server::services::push::fcm::FcmProvider;
use tradewind_server::services::push::{LogOnlyProvider, PushProvider};
use tradewind_server::services::review_service::ReviewService;
use tradewind_server::storage::chat_repo::ChatRepository;
use tradewind_server::storage::device_token_repo::DeviceTokenRepository;
use tradewind_server::storage::listing_repo::ListingRepository;
use tradewind_server::storage::notification_repo::NotificationRepository;
use tradewind_server::storage::offer_repo::OfferRepository;
use tradewind_server::storage::refresh_token_repo::RefreshTokenRepository;
use tradewind_server::storage::review_repo::ReviewRepository;
use tradewind_server::storage::user_repo::UserRepository;
use tradewind_server::{storage, telemetry};
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    telemetry::init_telemetry(config.log_format);

    let boot_span = tracing::info_span!("boot_server");
    let (listener, app_router) = async {
        // Phase 1: infrastructure
        let pool = storage::init_pool(&config.database_url).await?;
        tradewind_server::run_migrations(&pool).await?;

        // Phase 2: component wiring
        let push_provider: Arc<dyn PushProvider> = match FcmProvider::from_config(&config.push) {
            Some(provider) => Arc::new(provider),
            None => {
                tracing::warn!("No FCM server key configured; push delivery disabled");
                Arc::new(LogOnlyProvider)
            }
        };

        let user_repo = UserRepository::new();
        let refresh_repo = RefreshTokenRepository::new();
        let listing_repo = ListingRepository::new();
        let offer_repo = OfferRepository::new();
        let chat_repo = ChatRepository::new();
        let review_repo = ReviewRepository::new();
        let notification_repo = NotificationRepository::new();
        let device_token_repo = DeviceTokenRepository::new();

        let notification_service = NotificationService::new(
            pool.clone(),
            notification_repo,
            device_token_repo,
            push_provider,
        );
        let auth_service =
            AuthService::new(config.auth.clone(), pool.clone(), user_repo.clone(), refresh_repo);
        let account_service = AccountService::new(pool.clone(), user_repo.clone());
        let listing_service = ListingService::new(
            pool.clone(),
            listing_repo.clone(),
            offer_repo.clone(),
            user_repo.clone(),
            notification_service.clone(),
        );
        let offer_service = OfferService::new(
            pool.clone(),
            offer_repo,
            listing_repo.clone(),
            chat_repo.clone(),
            user_repo.clone(),
            notification_service.clone(),
        );
        let chat_service = ChatService::new(
            pool.clone(),
            chat_repo.clone(),
            listing_repo.clone(),
            user_repo.clone(),
            notification_service.clone(),
        );
        let review_service = ReviewService::new(
            pool.clone(),
            review_repo,
            listing_repo,
            chat_repo,
            user_repo,
            notification_service.clone(),
        );

        // Phase 3: runtime setup
        let state = AppState {
            config: config.clone(),
            pool,
            auth_service,
            account_service,
            listing_service,
            offer_service,
            chat_service,
            review_service,
            notification_service,
        };
        let app_router = api::app_router(state);

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        tracing::info!(address = %addr, "listening");
        let listener = tokio::net::TcpListener::bind(addr).await?;

        Ok::<(tokio::net::TcpListener, axum::Router), anyhow::Error>((listener, app_router))
    }
    .instrument(boot_span)
    .await?;

    axum::serve(listener, app_router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
