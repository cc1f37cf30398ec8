//! Convoca API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use mongodb::Client;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use convoca_api::error::AppError;
use convoca_api::routes;
use convoca_api::state::AppState;
use convoca_core::clock::SystemClock;
use convoca_docstore::MongoCollection;
use convoca_events::domain::aggregate::Event;
use convoca_ledger::PgLedger;
use convoca_mega_events::domain::aggregate::MegaEvent;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Convoca API server");

    // Read configuration from environment.
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| AppError::Config("DATABASE_URL environment variable must be set".into()))?;
    let mongodb_uri = std::env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://127.0.0.1:27017".to_string());
    let mongodb_db = std::env::var("MONGODB_DB").unwrap_or_else(|_| "convoca".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

    // Ledger pool: process-wide, bounded acquire timeout.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    // Document store: process-wide client, unique ledger-id indexes.
    let mongo = Client::with_uri_str(&mongodb_uri).await?;
    let database = mongo.database(&mongodb_db);
    let events = MongoCollection::<Event>::new(&database);
    let mega_events = MongoCollection::<MegaEvent>::new(&database);
    if let Err(err) = events.ensure_indexes().await {
        tracing::warn!(error = %err, "could not ensure event indexes");
    }
    if let Err(err) = mega_events.ensure_indexes().await {
        tracing::warn!(error = %err, "could not ensure mega-event indexes");
    }

    // Build application state.
    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(PgLedger::new(pool)),
        Arc::new(events),
        Arc::new(mega_events),
    );

    // Build router.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/events", routes::events::router())
        .nest("/api/v1/mega-events", routes::mega_events::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
