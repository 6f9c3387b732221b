//! Infrastructure adapters for telemetry ports.

#![forbid(unsafe_code)]

mod console_telemetry_queue;
mod postgres_student_repository;
mod postgres_telemetry_repository;
mod redis_telemetry_queue;

pub use console_telemetry_queue::ConsoleTelemetryQueue;
pub use postgres_student_repository::PostgresStudentRepository;
pub use postgres_telemetry_repository::PostgresTelemetryRepository;
pub use redis_telemetry_queue::RedisTelemetryQueue;
