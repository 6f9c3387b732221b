//! Ardoise telemetry worker runtime.
//!
//! Drains the Redis telemetry queue in batches and persists each message
//! through the Postgres sink. Malformed payloads are logged and dropped so a
//! single bad message never wedges the queue.

#![forbid(unsafe_code)]

use std::env;
use std::time::Duration;

use ardoise_core::{AppError, AppResult};
use ardoise_domain::{LogMessage, decode_payload};
use ardoise_infrastructure::{PostgresTelemetryRepository, RedisTelemetryQueue};
use ardoise_telemetry::TelemetrySink;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    redis_url: String,
    queue_key: String,
    claim_limit: usize,
    poll_interval_ms: u64,
}

impl WorkerConfig {
    fn load() -> Result<Self, AppError> {
        let database_url = required_env("DATABASE_URL")?;
        let redis_url = required_env("REDIS_URL")?;
        let queue_key = env::var("TELEMETRY_QUEUE_KEY")
            .unwrap_or_else(|_| "ardoise:telemetry".to_owned());
        let claim_limit = env::var("WORKER_CLAIM_LIMIT")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(100);
        let poll_interval_ms = env::var("WORKER_POLL_INTERVAL_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(1000);

        Ok(Self {
            database_url,
            redis_url,
            queue_key,
            claim_limit,
            poll_interval_ms,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let sink = PostgresTelemetryRepository::new(pool);

    let client = redis::Client::open(config.redis_url.as_str())
        .map_err(|error| AppError::Internal(format!("invalid REDIS_URL: {error}")))?;
    let queue = RedisTelemetryQueue::new(client, config.queue_key.clone());

    info!(
        queue_key = %config.queue_key,
        claim_limit = config.claim_limit,
        poll_interval_ms = config.poll_interval_ms,
        "ardoise-worker started"
    );

    loop {
        match queue.pop_batch(config.claim_limit).await {
            Ok(payloads) => {
                if payloads.is_empty() {
                    tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
                    continue;
                }

                let claimed = payloads.len();
                let mut persisted = 0_usize;
                let mut failed = 0_usize;

                for payload in payloads {
                    let message = match decode_payload::<LogMessage>(payload.as_str()) {
                        Ok(message) => message,
                        Err(error) => {
                            failed = failed.saturating_add(1);
                            warn!(error = %error, "dropping malformed telemetry payload");
                            continue;
                        }
                    };

                    let message_type = message.message_type();
                    match sink.persist_message(message).await {
                        Ok(()) => persisted = persisted.saturating_add(1),
                        Err(error) => {
                            failed = failed.saturating_add(1);
                            warn!(
                                message_type,
                                error = %error,
                                "failed to persist telemetry message"
                            );
                        }
                    }
                }

                info!(claimed, persisted, failed, "telemetry batch processed");
            }
            Err(error) => {
                warn!(error = %error, "failed to claim telemetry batch");
                tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
            }
        }
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} must be set")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
