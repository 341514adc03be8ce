//! DELETE: recall a message from an instance.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ProcessorContext;
use crate::processor::{ProcessingError, Processor};

/// Recalls the message remotely, then marks the distribution inactive and
/// erases the message once no instance holds it.
pub struct DeleteProcessor {
    ctx: ProcessorContext,
}

impl DeleteProcessor {
    /// Create the processor.
    #[must_use]
    pub const fn new(ctx: ProcessorContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Processor for DeleteProcessor {
    async fn action(
        &self,
        message_id: &str,
        target_instance_id: &str,
    ) -> Result<(), ProcessingError> {
        let Some(message) = self.ctx.messages.find(message_id).await? else {
            debug!(
                message_id,
                target_instance_id, "Aborted recall, message not in registry"
            );
            return Ok(());
        };
        let target = self.ctx.instances.read(target_instance_id).await?;

        self.ctx.agent.recall_message(&message, &target).await?;
        debug!(message_id, instance = %target.name, "Message recalled");
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
            debug!(message_id, "Aborted recall post action, message not in registry");
            return Ok(());
        };

        if !message.set_distribution_status(&target.url, false) {
            warn!(message_id, url = %target.url, "No distribution matches target instance");
        }

        let result = if message.is_erasable() {
            debug!(message_id, "Message has no active distributions, deleting message");
            self.ctx.messages.remove(&message).await
        } else {
            self.ctx.messages.update(message).await
        };

        match result {
            Ok(_) => {
                debug!(message_id, instance = %target.name, "Recall recorded");
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
