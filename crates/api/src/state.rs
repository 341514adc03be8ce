//! Shared handler state.

use monitor_core::{InstanceService, ServiceMessageService};
use monitor_distribution::JobScheduler;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Service message authoring and distribution.
    pub message_service: ServiceMessageService,
    /// Sofie instance registry.
    pub instance_service: InstanceService,
    /// Scheduler running distribution jobs, for health reporting.
    pub scheduler: JobScheduler,
}
