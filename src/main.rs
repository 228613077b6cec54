use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use gatecheck::{
    config::Config,
    handlers::*,
    services::*,
    stores::{MemoryStore, PostgrestStore, Stores},
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting gatecheck API v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);

    // Initialize services
    let cache = Arc::new(CacheService::new(&config.redis_url).await?);

    let stores = match (&config.supabase_url, &config.supabase_service_key) {
        (Some(url), Some(key)) => {
            tracing::info!("Using hosted Postgres backend at {}", url);
            Stores::from_backend(Arc::new(PostgrestStore::new(url.clone(), key.clone())))
        }
        _ => {
            tracing::warn!("No database backend configured, using in-memory stores");
            Stores::from_backend(Arc::new(MemoryStore::new()))
        }
    };

    let mint = Arc::new(MintService::new(
        config.functions_url.clone(),
        config.supabase_service_key.clone(),
        config.default_mint_chain.clone(),
    ));
    let analytics = Arc::new(Analytics::new(cache.clone()));
    let checkin = Arc::new(CheckInService::new(stores.clone(), cache.clone(), mint));

    // Build application state
    let app_state = AppState {
        checkin,
        analytics: analytics.clone(),
    };

    let health_state = HealthState {
        cache: cache.clone(),
        events: stores.events.clone(),
        analytics: analytics.clone(),
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .with_state(health_state)
        .route("/stats", get(get_stats))
        .route("/ws/checkins", get(websocket_handler))
        .with_state(analytics.clone())
        .route("/api/events/:event_id/check-in", post(submit_check_in))
        .route("/api/events/:event_id/attendance", get(list_attendance))
        .route("/api/tickets/:ticket_id/qr", post(issue_ticket_qr))
        .with_state(app_state)
        // Global middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Live check-in feed: ws://{}/ws/checkins", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl+c");
    tracing::info!("Shutting down gracefully...");
}
