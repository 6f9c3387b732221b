//! HTTP handlers grouped by surface.

pub mod activity;
pub mod analytics;
pub mod health;
pub mod students;
