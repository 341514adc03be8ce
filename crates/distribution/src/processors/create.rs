//! CREATE: publish a message on an instance.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ProcessorContext;
use crate::processor::{ProcessingError, Processor};

/// Publishes the message remotely, then marks the distribution active.
pub struct CreateProcessor {
    ctx: ProcessorContext,
}

impl CreateProcessor {
    /// Create the processor.
    #[must_use]
    pub const fn new(ctx: ProcessorContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Processor for CreateProcessor {
    async fn action(
        &self,
        message_id: &str,
        target_instance_id: &str,
    ) -> Result<(), ProcessingError> {
        let Some(message) = self.ctx.messages.find(message_id).await? else {
            debug!(message_id, "Aborted distribution, message not in registry");
            return Ok(());
        };
        let target = self.ctx.instances.read(target_instance_id).await?;

        if !message.is_active {
            debug!(
                message_id,
                instance = %target.name,
                "Aborted distribution, message status is inactive"
            );
            return Ok(());
        }

        self.ctx.agent.create_message(&message, &target).await?;
        debug!(message_id, instance = %target.name, "Message distributed");
        Ok(())
    }

    async fn post_action(
        &self,
        message_id: &str,
        target_instance_id: &str,
    ) -> Result<(), ProcessingError> {
        let target = self.ctx.instances.read(target_instance_id).await?;

        let _guard = self.ctx.locks.lock(message_id).await;
        let Some(mut message) = self.ctx.messages.find(message_id).await? else {
            debug!(message_id, "Aborted distribution post action, message not in registry");
            return Ok(());
        };

        // A deactivated message was not published by the action, and its
        // recall owns the distribution status from here on.
        if !message.is_active {
            debug!(
                message_id,
                instance = %target.name,
                "Distribution status left unchanged, message is inactive"
            );
            return Ok(());
        }

        if !message.set_distribution_status(&target.url, true) {
            warn!(message_id, url = %target.url, "No distribution matches target instance");
        }

        match self.ctx.messages.update(message).await {
            Ok(_) => {
                debug!(message_id, instance = %target.name, "Distribution status updated");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(message_id, "Message removed concurrently, nothing to record");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
