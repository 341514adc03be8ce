//! Processor contract and registry.

use std::sync::Arc;

use async_trait::async_trait;
use monitor_agent::AgentError;
use monitor_common::AppError;
use thiserror::Error;

use crate::command::Command;

/// Failure of a processor step, classified once where it is raised.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// May succeed later; the job is retried.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Can never succeed; the job is abandoned.
    #[error("terminal failure: {0}")]
    Terminal(String),
}

impl ProcessingError {
    /// Whether the job must not be retried.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }
}

impl From<AgentError> for ProcessingError {
    fn from(err: AgentError) -> Self {
        if err.is_terminal() {
            Self::Terminal(err.to_string())
        } else {
            Self::Transient(err.to_string())
        }
    }
}

impl From<AppError> for ProcessingError {
    fn from(err: AppError) -> Self {
        Self::Transient(err.to_string())
    }
}

/// The two steps a job executes for one message/instance pair.
///
/// `action` performs the externally visible effect on the remote instance.
/// `post_action` records the outcome in the message registry and only runs
/// once `action` has succeeded.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Perform the remote effect.
    async fn action(&self, message_id: &str, target_instance_id: &str)
    -> Result<(), ProcessingError>;

    /// Record the outcome locally.
    async fn post_action(
        &self,
        message_id: &str,
        target_instance_id: &str,
    ) -> Result<(), ProcessingError>;
}

/// Exactly one processor per [`Command`], built once at startup.
#[derive(Clone)]
pub struct ProcessorRegistry {
    create: Arc<dyn Processor>,
    update: Arc<dyn Processor>,
    delete: Arc<dyn Processor>,
}

impl ProcessorRegistry {
    /// Create a registry from one processor per command.
    #[must_use]
    pub fn new(
        create: Arc<dyn Processor>,
        update: Arc<dyn Processor>,
        delete: Arc<dyn Processor>,
    ) -> Self {
        Self {
            create,
            update,
            delete,
        }
    }

    /// The processor bound to `command`.
    #[must_use]
    pub fn get(&self, command: Command) -> Arc<dyn Processor> {
        match command {
            Command::Create => self.create.clone(),
            Command::Update => self.update.clone(),
            Command::Delete => self.delete.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_rejection_is_terminal() {
        let err = ProcessingError::from(AgentError::Rejected {
            status: 404,
            body: String::new(),
        });
        assert!(err.is_terminal());
    }

    #[test]
    fn test_agent_unexpected_status_is_transient() {
        let err = ProcessingError::from(AgentError::from_status(502, String::new(), &[200]));
        assert!(!err.is_terminal());
    }

    #[test]
    fn test_store_errors_are_transient() {
        let err = ProcessingError::from(AppError::Storage("disk full".to_string()));
        assert!(!err.is_terminal());
        assert!(err.to_string().contains("disk full"));
    }
}
