//! Registry access.
//!
//! The distribution engine and services depend on the [`MessageStore`] and
//! [`InstanceStore`] traits; [`MessageRepository`] and
//! [`InstanceRepository`] are the JSON-backed implementations.

mod service_message;
mod sofie_instance;

use std::sync::Arc;

use async_trait::async_trait;
use monitor_common::{AppError, AppResult};
use url::Url;

use crate::entities::{ServiceMessage, SofieInstance};

pub use service_message::MessageRepository;
pub use sofie_instance::InstanceRepository;

/// Durable CRUD for service messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Store a new message and assign its id. Fails if it already has one.
    async fn create(&self, message: ServiceMessage) -> AppResult<ServiceMessage>;

    /// All stored messages.
    async fn list(&self) -> AppResult<Vec<ServiceMessage>>;

    /// Find a message by id.
    async fn find(&self, id: &str) -> AppResult<Option<ServiceMessage>>;

    /// Read a message by id, or fail with [`AppError::MessageNotFound`].
    async fn read(&self, id: &str) -> AppResult<ServiceMessage> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::MessageNotFound(id.to_string()))
    }

    /// Replace a stored message. Fails if it is id-less or no longer stored.
    async fn update(&self, message: ServiceMessage) -> AppResult<ServiceMessage>;

    /// Remove a stored message. Fails unless exactly one record matched.
    async fn remove(&self, message: &ServiceMessage) -> AppResult<ServiceMessage>;
}

/// Durable CRUD for Sofie instances.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Store a new instance and assign its id. URLs are unique.
    async fn create(&self, instance: SofieInstance) -> AppResult<SofieInstance>;

    /// All registered instances.
    async fn list(&self) -> AppResult<Vec<SofieInstance>>;

    /// Find an instance by id.
    async fn find(&self, id: &str) -> AppResult<Option<SofieInstance>>;

    /// Read an instance by id, or fail with [`AppError::InstanceNotFound`].
    async fn read(&self, id: &str) -> AppResult<SofieInstance> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::InstanceNotFound(id.to_string()))
    }

    /// Find the instance registered for `url`.
    async fn find_by_url(&self, url: &Url) -> AppResult<Option<SofieInstance>>;

    /// Replace a stored instance.
    async fn update(&self, instance: SofieInstance) -> AppResult<SofieInstance>;

    /// Remove a stored instance.
    async fn remove(&self, instance: &SofieInstance) -> AppResult<SofieInstance>;
}

/// Shared message store handle.
pub type SharedMessageStore = Arc<dyn MessageStore>;

/// Shared instance store handle.
pub type SharedInstanceStore = Arc<dyn InstanceStore>;
