use ardoise_core::{SchoolId, UserId};
use ardoise_domain::{
    ActivityLogRecord, ApiMetricRecord, AuditAction, AuditLogRecord, HttpMethod, LogMessage,
    NetworkMetadata, Stamped,
};
use ardoise_telemetry::{ActivityAnalytics, ActivityStore, TelemetrySink};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresTelemetryRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for telemetry repository tests: {error}");
    }

    Some(pool)
}

fn unique_user() -> UserId {
    UserId::new(format!("user-{}", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn persisted_activity_is_visible_to_active_user_analytics() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresTelemetryRepository::new(pool);
    let user_id = unique_user();

    let entry = Stamped::now(ActivityLogRecord {
        user_id: Some(user_id),
        school_id: Some(SchoolId::new("school-analytics")),
        action: "view".to_owned(),
        resource: Some("grades".to_owned()),
        resource_id: None,
        metadata: None,
        network: NetworkMetadata::default(),
    });

    let since = Utc::now() - Duration::minutes(5);
    let baseline = repository.daily_active_users(since).await.unwrap_or(0);

    let persisted = repository.persist(entry).await;
    assert!(persisted.is_ok());

    let counted = repository.daily_active_users(since).await;
    assert!(matches!(counted, Ok(count) if count > baseline));
}

#[tokio::test]
async fn persist_message_routes_every_variant_to_its_table() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresTelemetryRepository::new(pool.clone());
    let record_id = uuid::Uuid::new_v4().to_string();

    let audit = LogMessage::audit_log(AuditLogRecord {
        school_id: SchoolId::new("school-sink"),
        user_id: unique_user(),
        action: AuditAction::Update,
        table_name: "students".to_owned(),
        record_id: record_id.clone(),
        old_values: Some(serde_json::json!({"first_name": "Awa"})),
        new_values: Some(serde_json::json!({"first_name": "Aminata"})),
        network: NetworkMetadata {
            ip_address: Some("203.0.113.9".to_owned()),
            user_agent: None,
        },
    });
    let metric = LogMessage::api_metric(ApiMetricRecord {
        endpoint: "/api/students".to_owned(),
        method: HttpMethod::Get,
        status_code: 200,
        response_time_ms: 12,
        user_id: None,
        school_id: None,
        error_message: None,
    });

    assert!(repository.persist_message(audit).await.is_ok());
    assert!(repository.persist_message(metric).await.is_ok());

    let audit_rows: Result<i64, _> =
        sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs WHERE record_id = $1")
            .bind(record_id.as_str())
            .fetch_one(&pool)
            .await;
    assert!(matches!(audit_rows, Ok(1)));

    let since = Utc::now() - Duration::minutes(5);
    let usage = repository.endpoint_usage(since, 10).await;
    let Ok(usage) = usage else {
        panic!("endpoint usage query failed");
    };
    assert!(usage.iter().any(|row| row.endpoint == "/api/students"));
}
