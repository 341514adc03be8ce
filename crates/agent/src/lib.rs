//! Remote Sofie instance agent.
//!
//! Talks to the service message REST API of a Sofie core instance:
//!
//! - **Create**: publish a message on an instance
//! - **Recall**: remove a previously published message
//! - **Get**: fetch a message to check whether it is published
//!
//! Failures are reported as [`AgentError`]; HTTP statuses that mean the
//! request can never succeed against this instance are reported as
//! [`AgentError::Rejected`] so callers can stop retrying.

pub mod client;
pub mod error;

use std::sync::Arc;

use async_trait::async_trait;
use monitor_db::{ServiceMessage, SofieInstance};

pub use client::SofieCoreAgent;
pub use error::{AgentError, DO_NOT_RETRY_STATUSES};

/// Contract for reaching a remote Sofie instance.
#[async_trait]
pub trait InstanceAgent: Send + Sync {
    /// Publish `message` on `instance`.
    async fn create_message(
        &self,
        message: &ServiceMessage,
        instance: &SofieInstance,
    ) -> Result<(), AgentError>;

    /// Remove `message` from `instance`. A message that is already absent
    /// counts as recalled.
    async fn recall_message(
        &self,
        message: &ServiceMessage,
        instance: &SofieInstance,
    ) -> Result<(), AgentError>;

    /// Fetch the message with `id` from `instance`, `None` if it is absent.
    async fn get_message(
        &self,
        id: &str,
        instance: &SofieInstance,
    ) -> Result<Option<ServiceMessage>, AgentError>;
}

/// Shared agent handle.
pub type SharedAgent = Arc<dyn InstanceAgent>;
