//! Distribution job.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::command::Command;
use crate::processor::{ProcessingError, Processor};

/// Where a job stands in its two-step lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// The remote action has not succeeded yet.
    PendingAction,
    /// The remote action succeeded, bookkeeping is outstanding.
    PendingPostAction,
    /// Both steps succeeded.
    Done,
}

/// One in-memory unit of retryable work for a message/instance pair.
///
/// The completion latches survive retries: a job whose action already
/// succeeded resumes at the post-action and never repeats the remote effect.
pub struct Job {
    /// Command the job carries out.
    pub command: Command,
    /// Registry id of the message.
    pub message_id: String,
    /// Registry id of the target instance.
    pub target_instance_id: String,
    /// Latch set once the action succeeded.
    pub action_completed: bool,
    /// Latch set once the post-action succeeded.
    pub post_action_completed: bool,
    /// Number of executions started so far.
    pub attempts: u32,
    /// Delay applied before the next retry.
    pub waiting_time_before_retry: Duration,
    processor: Arc<dyn Processor>,
}

impl Job {
    /// Create a job that has not run yet.
    #[must_use]
    pub fn new(
        command: Command,
        message_id: String,
        target_instance_id: String,
        processor: Arc<dyn Processor>,
        waiting_time_before_retry: Duration,
    ) -> Self {
        Self {
            command,
            message_id,
            target_instance_id,
            action_completed: false,
            post_action_completed: false,
            attempts: 0,
            waiting_time_before_retry,
            processor,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> JobState {
        match (self.action_completed, self.post_action_completed) {
            (true, true) => JobState::Done,
            (true, false) => JobState::PendingPostAction,
            (false, _) => JobState::PendingAction,
        }
    }

    /// Run the bound processor's action.
    pub async fn run_action(&self) -> Result<(), ProcessingError> {
        self.processor
            .action(&self.message_id, &self.target_instance_id)
            .await
    }

    /// Run the bound processor's post-action.
    pub async fn run_post_action(&self) -> Result<(), ProcessingError> {
        self.processor
            .post_action(&self.message_id, &self.target_instance_id)
            .await
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("command", &self.command)
            .field("message_id", &self.message_id)
            .field("target_instance_id", &self.target_instance_id)
            .field("action_completed", &self.action_completed)
            .field("post_action_completed", &self.post_action_completed)
            .field("attempts", &self.attempts)
            .field("waiting_time_before_retry", &self.waiting_time_before_retry)
            .finish_non_exhaustive()
    }
}
