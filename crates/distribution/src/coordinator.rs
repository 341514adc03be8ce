//! Distribution coordinator.

use std::time::Duration;

use monitor_common::DistributionConfig;
use monitor_db::{DistributionStatus, ServiceMessage};
use tracing::{debug, warn};

use crate::command::Command;
use crate::executor::RetryingExecutor;
use crate::job::Job;
use crate::processor::ProcessorRegistry;

/// Turns message-level distribute and recall requests into one job per
/// target instance.
///
/// Both operations are fire-and-forget: they schedule the jobs and return.
/// Completion is observable only through the distributions stored in the
/// message registry.
#[derive(Clone)]
pub struct DistributionCoordinator {
    registry: ProcessorRegistry,
    executor: RetryingExecutor,
    retry_delay: Duration,
    initial_delay: Duration,
}

impl DistributionCoordinator {
    /// Create a coordinator.
    #[must_use]
    pub fn new(
        registry: ProcessorRegistry,
        executor: RetryingExecutor,
        config: &DistributionConfig,
    ) -> Self {
        Self {
            registry,
            executor,
            retry_delay: config.retry_delay(),
            initial_delay: config.initial_delay(),
        }
    }

    /// The executor jobs are handed to.
    #[must_use]
    pub const fn executor(&self) -> &RetryingExecutor {
        &self.executor
    }

    /// Distribute `message` to every instance it lists.
    ///
    /// Publishes it as new unless `is_update` is set, in which case the
    /// UPDATE processor is used. Returns the number of jobs scheduled.
    pub fn distribute(&self, message: &ServiceMessage, is_update: bool) -> usize {
        let command = if is_update {
            Command::Update
        } else {
            Command::Create
        };
        debug!(
            message_id = ?message.id,
            command = %command,
            "Distributing {} service message",
            if is_update { "updated" } else { "new" }
        );
        self.dispatch(command, message, |_| true)
    }

    /// Recall `message` from every instance it lists.
    ///
    /// Once every instance has confirmed the recall the message is erased
    /// from the registry. Returns the number of jobs scheduled.
    pub fn recall(&self, message: &ServiceMessage) -> usize {
        debug!(message_id = ?message.id, "Recalling service message");
        self.dispatch(Command::Delete, message, |_| true)
    }

    /// Schedule `command` for the distributions of `message` accepted by
    /// `filter`. Returns the number of jobs scheduled.
    pub fn dispatch(
        &self,
        command: Command,
        message: &ServiceMessage,
        filter: impl Fn(&DistributionStatus) -> bool,
    ) -> usize {
        let jobs = self.build_jobs(command, message, filter);
        let count = jobs.len();
        debug!(message_id = ?message.id, command = %command, jobs = count, "Created jobs");

        for job in jobs {
            self.executor.submit(job, self.initial_delay);
        }
        count
    }

    fn build_jobs(
        &self,
        command: Command,
        message: &ServiceMessage,
        filter: impl Fn(&DistributionStatus) -> bool,
    ) -> Vec<Job> {
        let processor = self.registry.get(command);

        message
            .distributions
            .iter()
            .filter(|distribution| filter(distribution))
            .filter_map(|distribution| {
                let instance = &distribution.instance;
                match (message.id.as_ref(), instance.id.as_ref()) {
                    (Some(message_id), Some(instance_id)) => Some(Job::new(
                        command,
                        message_id.clone(),
                        instance_id.clone(),
                        processor.clone(),
                        self.retry_delay,
                    )),
                    (message_id, _) => {
                        warn!(
                            command = %command,
                            message_id = ?message_id,
                            instance = %instance.name,
                            url = %instance.url,
                            "Unable to add job for message, missing {}",
                            if message_id.is_none() { "message id" } else { "instance id" }
                        );
                        None
                    }
                }
            })
            .collect()
    }
}
