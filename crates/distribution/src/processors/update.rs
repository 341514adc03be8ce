//! UPDATE: placeholder for in-place content updates.

use async_trait::async_trait;
use tracing::error;

use crate::processor::{ProcessingError, Processor};

/// In-place update distribution is not implemented.
///
/// Both steps fail terminally so an UPDATE job is abandoned on its first
/// attempt instead of pretending the update reached anyone. Content updates
/// are distributed as CREATE, which Sofie core treats as an upsert.
pub struct UpdateProcessor;

#[async_trait]
impl Processor for UpdateProcessor {
    async fn action(
        &self,
        message_id: &str,
        target_instance_id: &str,
    ) -> Result<(), ProcessingError> {
        error!(message_id, target_instance_id, "UPDATE distribution is not implemented");
        Err(ProcessingError::Terminal(
            "UPDATE distribution is not implemented".to_string(),
        ))
    }

    async fn post_action(
        &self,
        message_id: &str,
        target_instance_id: &str,
    ) -> Result<(), ProcessingError> {
        error!(message_id, target_instance_id, "UPDATE distribution is not implemented");
        Err(ProcessingError::Terminal(
            "UPDATE distribution is not implemented".to_string(),
        ))
    }
}
