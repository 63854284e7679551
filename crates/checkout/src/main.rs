//! Driftpress Checkout - E-commerce checkout backend.
//!
//! This binary serves two listeners:
//!
//! - The site API on port 4242: session-cookie cart operations and payment
//!   intent management, behind CSRF double-submit protection.
//! - The webhook listener on port 4343: signature-verified payment-status
//!   callbacks from the gateway, which drive fulfillment submission.
//!
//! # Architecture
//!
//! - Axum web framework, one router per listener
//! - SQLite (sqlx) for cart persistence, migrated at startup
//! - Stripe-shaped payment gateway client (reqwest)
//! - Print-on-demand supplier client (reqwest)

#![cfg_attr(not(test), forbid(unsafe_code))]

use driftpress_checkout::config::CheckoutConfig;
use driftpress_checkout::state::AppState;
use driftpress_checkout::{db, routes};

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CheckoutConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = CheckoutConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "driftpress_checkout=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // Open the embedded database and bring the schema up to date
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to open database");
    db::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Database ready");

    // Build application state (store, gateway, supplier clients)
    let state = AppState::new(config.clone(), pool).expect("Failed to initialize application state");

    // Site API router with Sentry layers outermost for full request coverage
    let site_app = routes::site_router(state.clone())
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let webhook_app = routes::webhook_router(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start both listeners
    let site_addr = config.socket_addr();
    let webhook_addr = config.webhook_socket_addr();
    tracing::info!("checkout listening on {site_addr}, webhooks on {webhook_addr}");

    let site_listener = tokio::net::TcpListener::bind(site_addr)
        .await
        .expect("Failed to bind site address");
    let webhook_listener = tokio::net::TcpListener::bind(webhook_addr)
        .await
        .expect("Failed to bind webhook address");

    let site = axum::serve(site_listener, site_app).with_graceful_shutdown(shutdown_signal());
    let webhook =
        axum::serve(webhook_listener, webhook_app).with_graceful_shutdown(shutdown_signal());

    tokio::try_join!(site, webhook).expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
