use ardoise_core::{AppError, AppResult};
use ardoise_domain::{ActivityLogRecord, ApiMetricRecord, AuditLogRecord, LogMessage, Stamped};
use ardoise_telemetry::{ActivityAnalytics, ActivityStore, EndpointUsage, TelemetrySink};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed persistence for all three telemetry log kinds, plus the
/// usage-analytics read models derived from them.
#[derive(Clone)]
pub struct PostgresTelemetryRepository {
    pool: PgPool,
}

impl PostgresTelemetryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends one audit log row.
    pub async fn insert_audit_log(&self, entry: &Stamped<AuditLogRecord>) -> AppResult<()> {
        let record = &entry.record;
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id,
                school_id,
                user_id,
                action,
                table_name,
                record_id,
                old_values,
                new_values,
                ip_address,
                user_agent,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(record.school_id.as_str())
        .bind(record.user_id.as_str())
        .bind(record.action.as_str())
        .bind(record.table_name.as_str())
        .bind(record.record_id.as_str())
        .bind(record.old_values.as_ref())
        .bind(record.new_values.as_ref())
        .bind(record.network.ip_address.as_deref())
        .bind(record.network.user_agent.as_deref())
        .bind(stamp_to_datetime(entry.timestamp))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert audit log entry: {error}")))?;

        Ok(())
    }

    /// Appends one activity log row.
    pub async fn insert_activity_log(&self, entry: &Stamped<ActivityLogRecord>) -> AppResult<()> {
        let record = &entry.record;
        sqlx::query(
            r#"
            INSERT INTO activity_logs (
                id,
                user_id,
                school_id,
                action,
                resource,
                resource_id,
                metadata,
                ip_address,
                user_agent,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(record.user_id.as_ref().map(|value| value.as_str()))
        .bind(record.school_id.as_ref().map(|value| value.as_str()))
        .bind(record.action.as_str())
        .bind(record.resource.as_deref())
        .bind(record.resource_id.as_deref())
        .bind(record.metadata.as_ref())
        .bind(record.network.ip_address.as_deref())
        .bind(record.network.user_agent.as_deref())
        .bind(stamp_to_datetime(entry.timestamp))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to insert activity log entry: {error}"))
        })?;

        Ok(())
    }

    /// Appends one API metric row.
    pub async fn insert_api_metric(&self, entry: &Stamped<ApiMetricRecord>) -> AppResult<()> {
        let record = &entry.record;
        sqlx::query(
            r#"
            INSERT INTO api_metrics (
                id,
                endpoint,
                method,
                status_code,
                response_time_ms,
                user_id,
                school_id,
                error_message,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(record.endpoint.as_str())
        .bind(record.method.as_str())
        .bind(i16::try_from(record.status_code).unwrap_or(i16::MAX))
        .bind(i64::try_from(record.response_time_ms).unwrap_or(i64::MAX))
        .bind(record.user_id.as_ref().map(|value| value.as_str()))
        .bind(record.school_id.as_ref().map(|value| value.as_str()))
        .bind(record.error_message.as_deref())
        .bind(stamp_to_datetime(entry.timestamp))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert api metric: {error}")))?;

        Ok(())
    }
}

fn stamp_to_datetime(timestamp_millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp_millis).unwrap_or_else(Utc::now)
}

#[async_trait]
impl ActivityStore for PostgresTelemetryRepository {
    async fn persist(&self, entry: Stamped<ActivityLogRecord>) -> AppResult<()> {
        self.insert_activity_log(&entry).await
    }
}

#[async_trait]
impl TelemetrySink for PostgresTelemetryRepository {
    async fn persist_message(&self, message: LogMessage) -> AppResult<()> {
        match message {
            LogMessage::AuditLog(entry) => self.insert_audit_log(&entry).await,
            LogMessage::ActivityLog(entry) => self.insert_activity_log(&entry).await,
            LogMessage::ApiMetric(entry) => self.insert_api_metric(&entry).await,
        }
    }
}

#[derive(Debug, FromRow)]
struct EndpointUsageRow {
    endpoint: String,
    requests: i64,
    average_response_time_ms: i64,
}

#[async_trait]
impl ActivityAnalytics for PostgresTelemetryRepository {
    async fn daily_active_users(&self, since: DateTime<Utc>) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT user_id)
            FROM activity_logs
            WHERE created_at >= $1
                AND user_id IS NOT NULL
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count active users: {error}")))
    }

    async fn endpoint_usage(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<EndpointUsage>> {
        let capped_limit = limit.clamp(1, 100);
        let rows = sqlx::query_as::<_, EndpointUsageRow>(
            r#"
            SELECT
                endpoint,
                COUNT(*) AS requests,
                COALESCE(ROUND(AVG(response_time_ms)), 0)::BIGINT AS average_response_time_ms
            FROM api_metrics
            WHERE created_at >= $1
            GROUP BY endpoint
            ORDER BY COUNT(*) DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(capped_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list endpoint usage: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| EndpointUsage {
                endpoint: row.endpoint,
                requests: row.requests,
                average_response_time_ms: row.average_response_time_ms,
            })
            .collect())
    }

    async fn average_response_time(&self, since: DateTime<Utc>) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(ROUND(AVG(response_time_ms)), 0)::BIGINT
            FROM api_metrics
            WHERE created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to compute average response time: {error}"))
        })
    }
}

#[cfg(test)]
mod tests;
