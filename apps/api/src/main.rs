//! Ardoise API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod classifier;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use ardoise_core::AppError;
use ardoise_infrastructure::{
    ConsoleTelemetryQueue, PostgresStudentRepository, PostgresTelemetryRepository,
    RedisTelemetryQueue,
};
use ardoise_telemetry::QueueBinding;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api_config::{ApiConfig, TelemetryQueueConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let queue_binding: Arc<dyn QueueBinding> = match &config.telemetry_queue {
        TelemetryQueueConfig::Console => Arc::new(ConsoleTelemetryQueue::new()),
        TelemetryQueueConfig::Redis {
            redis_url,
            queue_key,
        } => {
            let client = redis::Client::open(redis_url.as_str())
                .map_err(|error| AppError::Internal(format!("invalid REDIS_URL: {error}")))?;
            Arc::new(RedisTelemetryQueue::new(client, queue_key.clone()))
        }
    };

    let app_state = AppState::new(
        PostgresTelemetryRepository::new(pool.clone()),
        PostgresStudentRepository::new(pool),
        queue_binding,
        config.gateway_shared_secret.clone(),
    );

    let protected_routes = Router::new()
        .route(
            "/api/students",
            get(handlers::students::list_students_handler)
                .post(handlers::students::create_student_handler),
        )
        .route(
            "/api/students/{student_id}",
            get(handlers::students::get_student_handler)
                .put(handlers::students::update_student_handler)
                .delete(handlers::students::delete_student_handler),
        )
        .route(
            "/api/analytics/usage",
            get(handlers::analytics::usage_summary_handler),
        )
        .route(
            "/api/admin/activity-logs",
            post(handlers::activity::create_activity_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::record_activity,
        ))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_session,
        ));

    let app = Router::new()
        .route("/healthz", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(from_fn_with_state(
            app_state.clone(),
            middleware::track_request,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state.clone());

    let host = IpAddr::from_str(&config.api_host).map_err(|error| {
        AppError::Internal(format!("invalid API_HOST '{}': {error}", config.api_host))
    })?;
    let address = SocketAddr::from((host, config.api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "ardoise-api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))?;

    // Let in-flight telemetry tasks settle before the process exits.
    info!("draining background telemetry before shutdown");
    app_state.lifecycle_extender.wait_for_settled().await;
    app_state.batcher.flush().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "failed to listen for shutdown signal");
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
