//! Retrying job executor.

use std::time::Duration;

use tracing::{debug, warn};

use crate::job::Job;
use crate::processor::ProcessingError;
use crate::scheduler::JobScheduler;

/// Result of one execution of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Both steps have completed.
    Done,
    /// A step failed transiently; the job should run again.
    Retry,
    /// A step failed terminally; the job is dropped.
    Abandoned,
}

/// Runs jobs to completion or terminal abandonment.
///
/// Transient failures are retried forever after the job's
/// `waiting_time_before_retry`, with no backoff growth. The same job value
/// is rescheduled so its latches and attempt count carry over.
#[derive(Clone)]
pub struct RetryingExecutor {
    scheduler: JobScheduler,
}

impl RetryingExecutor {
    /// Create an executor that schedules on `scheduler`.
    #[must_use]
    pub const fn new(scheduler: JobScheduler) -> Self {
        Self { scheduler }
    }

    /// The scheduler jobs run on.
    #[must_use]
    pub const fn scheduler(&self) -> &JobScheduler {
        &self.scheduler
    }

    /// Run `job` after `delay`, then keep retrying it until it is done or
    /// abandoned.
    pub fn submit(&self, job: Job, delay: Duration) {
        let executor = self.clone();
        let message_id = job.message_id.clone();
        let target_instance_id = job.target_instance_id.clone();

        let scheduled = self.scheduler.schedule(delay, async move {
            let mut job = job;
            if Self::execute_once(&mut job).await == JobOutcome::Retry {
                let delay = job.waiting_time_before_retry;
                executor.submit(job, delay);
            }
        });

        if !scheduled {
            warn!(
                message_id = %message_id,
                target_instance_id = %target_instance_id,
                "Job dropped, scheduler is shut down"
            );
        }
    }

    /// Execute one attempt of `job`.
    ///
    /// Steps whose latch is already set are skipped.
    pub async fn execute_once(job: &mut Job) -> JobOutcome {
        job.attempts += 1;
        debug!(job = ?job, "Processing job");

        match Self::run_steps(job).await {
            Ok(()) => {
                debug!(job = ?job, "Job completed");
                JobOutcome::Done
            }
            Err(ProcessingError::Terminal(reason)) => {
                warn!(
                    command = %job.command,
                    message_id = %job.message_id,
                    target_instance_id = %job.target_instance_id,
                    attempts = job.attempts,
                    reason = %reason,
                    "Aborting job after terminal failure"
                );
                JobOutcome::Abandoned
            }
            Err(ProcessingError::Transient(reason)) => {
                warn!(
                    command = %job.command,
                    message_id = %job.message_id,
                    target_instance_id = %job.target_instance_id,
                    attempt = job.attempts,
                    retry_in_secs = job.waiting_time_before_retry.as_secs(),
                    reason = %reason,
                    "Job failed, will retry"
                );
                JobOutcome::Retry
            }
        }
    }

    async fn run_steps(job: &mut Job) -> Result<(), ProcessingError> {
        if !job.action_completed {
            debug!(job = ?job, "Executing action");
            job.run_action().await?;
            job.action_completed = true;
            debug!(job = ?job, "Action completed");
        }

        if !job.post_action_completed {
            debug!(job = ?job, "Executing post action");
            job.run_post_action().await?;
            job.post_action_completed = true;
            debug!(job = ?job, "Post action completed");
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::job::JobState;
    use crate::processor::Processor;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type Script = Mutex<VecDeque<Result<(), ProcessingError>>>;

    /// Processor whose steps return scripted results, then succeed.
    #[derive(Default)]
    struct ScriptedProcessor {
        actions: Script,
        post_actions: Script,
        action_calls: Mutex<u32>,
        post_action_calls: Mutex<u32>,
    }

    impl ScriptedProcessor {
        fn with(
            actions: Vec<Result<(), ProcessingError>>,
            post_actions: Vec<Result<(), ProcessingError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                actions: Mutex::new(actions.into()),
                post_actions: Mutex::new(post_actions.into()),
                ..Self::default()
            })
        }

        fn action_calls(&self) -> u32 {
            *self.action_calls.lock().unwrap()
        }

        fn post_action_calls(&self) -> u32 {
            *self.post_action_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Processor for ScriptedProcessor {
        async fn action(&self, _: &str, _: &str) -> Result<(), ProcessingError> {
            *self.action_calls.lock().unwrap() += 1;
            self.actions.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }

        async fn post_action(&self, _: &str, _: &str) -> Result<(), ProcessingError> {
            *self.post_action_calls.lock().unwrap() += 1;
            self.post_actions.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    fn job(processor: Arc<ScriptedProcessor>) -> Job {
        Job::new(
            Command::Create,
            "m1".to_string(),
            "a".to_string(),
            processor,
            Duration::from_secs(30),
        )
    }

    fn transient() -> Result<(), ProcessingError> {
        Err(ProcessingError::Transient("timeout".to_string()))
    }

    fn terminal() -> Result<(), ProcessingError> {
        Err(ProcessingError::Terminal("HTTP 404".to_string()))
    }

    #[tokio::test]
    async fn test_both_steps_complete() {
        let processor = ScriptedProcessor::with(vec![], vec![]);
        let mut job = job(processor.clone());

        assert_eq!(RetryingExecutor::execute_once(&mut job).await, JobOutcome::Done);
        assert_eq!(job.state(), JobState::Done);
        assert_eq!(job.attempts, 1);
        assert_eq!(processor.action_calls(), 1);
        assert_eq!(processor.post_action_calls(), 1);
    }

    #[tokio::test]
    async fn test_completed_action_is_not_repeated() {
        let processor = ScriptedProcessor::with(vec![], vec![transient()]);
        let mut job = job(processor.clone());

        assert_eq!(RetryingExecutor::execute_once(&mut job).await, JobOutcome::Retry);
        assert_eq!(job.state(), JobState::PendingPostAction);

        assert_eq!(RetryingExecutor::execute_once(&mut job).await, JobOutcome::Done);
        assert_eq!(job.attempts, 2);
        assert_eq!(processor.action_calls(), 1);
        assert_eq!(processor.post_action_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_action_skips_post_action() {
        let processor = ScriptedProcessor::with(vec![transient()], vec![]);
        let mut job = job(processor.clone());

        assert_eq!(RetryingExecutor::execute_once(&mut job).await, JobOutcome::Retry);
        assert_eq!(job.state(), JobState::PendingAction);
        assert_eq!(processor.post_action_calls(), 0);
    }

    #[tokio::test]
    async fn test_terminal_failure_abandons() {
        let processor = ScriptedProcessor::with(vec![terminal()], vec![]);
        let mut job = job(processor.clone());

        assert_eq!(
            RetryingExecutor::execute_once(&mut job).await,
            JobOutcome::Abandoned
        );
        assert_eq!(processor.post_action_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_retries_at_fixed_interval() {
        let processor = ScriptedProcessor::with(vec![transient(), transient()], vec![]);
        let executor = RetryingExecutor::new(JobScheduler::new());

        executor.submit(job(processor.clone()), Duration::from_millis(1));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(processor.action_calls(), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(processor.action_calls(), 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(processor.action_calls(), 3);
        assert_eq!(processor.post_action_calls(), 1);
        assert_eq!(executor.scheduler().pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_stops_after_terminal_failure() {
        let processor = ScriptedProcessor::with(vec![terminal()], vec![]);
        let executor = RetryingExecutor::new(JobScheduler::new());

        executor.submit(job(processor.clone()), Duration::from_millis(1));
        tokio::time::sleep(Duration::from_secs(300)).await;

        assert_eq!(processor.action_calls(), 1);
        assert_eq!(executor.scheduler().pending(), 0);
    }
}
