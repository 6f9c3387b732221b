use std::env;

use ardoise_core::AppError;

#[derive(Debug, Clone)]
pub enum TelemetryQueueConfig {
    Console,
    Redis { redis_url: String, queue_key: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub gateway_shared_secret: String,
    pub api_host: String,
    pub api_port: u16,
    pub telemetry_queue: TelemetryQueueConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let gateway_shared_secret = required_env("GATEWAY_SHARED_SECRET")?;

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let telemetry_queue = match env::var("TELEMETRY_QUEUE")
            .unwrap_or_else(|_| "console".to_owned())
            .as_str()
        {
            "console" => TelemetryQueueConfig::Console,
            "redis" => TelemetryQueueConfig::Redis {
                redis_url: required_env("REDIS_URL")?,
                queue_key: env::var("TELEMETRY_QUEUE_KEY")
                    .unwrap_or_else(|_| "ardoise:telemetry".to_owned()),
            },
            other => {
                return Err(AppError::Validation(format!(
                    "unsupported TELEMETRY_QUEUE provider '{other}'"
                )));
            }
        };

        Ok(Self {
            migrate_only,
            database_url,
            gateway_shared_secret,
            api_host,
            api_port,
            telemetry_queue,
        })
    }
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} must be set")))
}
