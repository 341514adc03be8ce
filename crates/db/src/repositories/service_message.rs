//! Service message repository.

use std::path::Path;

use async_trait::async_trait;
use monitor_common::{AppError, AppResult, IdGenerator};

use super::MessageStore;
use crate::collection::JsonCollection;
use crate::entities::ServiceMessage;

/// JSON-backed service message registry.
pub struct MessageRepository {
    collection: JsonCollection<ServiceMessage>,
    id_gen: IdGenerator,
}

impl MessageRepository {
    /// Create a repository that only lives in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            collection: JsonCollection::in_memory("serviceMessages"),
            id_gen: IdGenerator::new(),
        }
    }

    /// Open a repository persisted at `path`.
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        Ok(Self {
            collection: JsonCollection::open("serviceMessages", path).await?,
            id_gen: IdGenerator::new(),
        })
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn create(&self, mut message: ServiceMessage) -> AppResult<ServiceMessage> {
        if message.id.is_some() {
            return Err(AppError::BadRequest(
                "Trying to create message which has an id already. Use update?".to_string(),
            ));
        }

        let id = self.id_gen.generate();
        message.id = Some(id.clone());
        self.collection.insert(&id, message.clone()).await?;

        tracing::debug!(message_id = %id, "Service message created");
        Ok(message)
    }

    async fn list(&self) -> AppResult<Vec<ServiceMessage>> {
        Ok(self.collection.all().await)
    }

    async fn find(&self, id: &str) -> AppResult<Option<ServiceMessage>> {
        Ok(self.collection.get(id).await)
    }

    async fn update(&self, message: ServiceMessage) -> AppResult<ServiceMessage> {
        let Some(id) = message.id.clone() else {
            return Err(AppError::BadRequest(
                "Unable to update message with no id. Use create?".to_string(),
            ));
        };

        if self.collection.replace(&id, message.clone()).await? {
            Ok(message)
        } else {
            Err(AppError::MessageNotFound(id))
        }
    }

    async fn remove(&self, message: &ServiceMessage) -> AppResult<ServiceMessage> {
        let Some(id) = message.id.as_deref() else {
            return Err(AppError::BadRequest(
                "Unable to remove message with no id.".to_string(),
            ));
        };

        match self.collection.delete(id).await? {
            Some(removed) => {
                tracing::debug!(message_id = %id, "Service message removed");
                Ok(removed)
            }
            None => Err(AppError::MessageNotFound(id.to_string())),
        }
    }
}
