use std::sync::Arc;

use ardoise_infrastructure::{PostgresStudentRepository, PostgresTelemetryRepository};
use ardoise_telemetry::{ActivityAnalytics, ActivityBatcher, QueueBinding, TrackedTaskExtender};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub batcher: ActivityBatcher,
    pub analytics: Arc<dyn ActivityAnalytics>,
    pub student_repository: PostgresStudentRepository,
    pub queue_binding: Arc<dyn QueueBinding>,
    pub lifecycle_extender: Arc<TrackedTaskExtender>,
    pub gateway_shared_secret: String,
}

impl AppState {
    /// Wires the state from its infrastructure pieces.
    pub fn new(
        telemetry_repository: PostgresTelemetryRepository,
        student_repository: PostgresStudentRepository,
        queue_binding: Arc<dyn QueueBinding>,
        gateway_shared_secret: String,
    ) -> Self {
        let repository = Arc::new(telemetry_repository);
        Self {
            batcher: ActivityBatcher::new(repository.clone()),
            analytics: repository,
            student_repository,
            queue_binding,
            lifecycle_extender: Arc::new(TrackedTaskExtender::new()),
            gateway_shared_secret,
        }
    }
}
