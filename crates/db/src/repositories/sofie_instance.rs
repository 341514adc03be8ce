//! Sofie instance repository.

use std::path::Path;

use async_trait::async_trait;
use monitor_common::{AppError, AppResult, IdGenerator};
use url::Url;

use super::InstanceStore;
use crate::collection::JsonCollection;
use crate::entities::SofieInstance;

/// JSON-backed Sofie instance registry.
pub struct InstanceRepository {
    collection: JsonCollection<SofieInstance>,
    id_gen: IdGenerator,
}

impl InstanceRepository {
    /// Create a repository that only lives in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            collection: JsonCollection::in_memory("sofieInstances"),
            id_gen: IdGenerator::new(),
        }
    }

    /// Open a repository persisted at `path`.
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        Ok(Self {
            collection: JsonCollection::open("sofieInstances", path).await?,
            id_gen: IdGenerator::new(),
        })
    }
}

#[async_trait]
impl InstanceStore for InstanceRepository {
    async fn create(&self, mut instance: SofieInstance) -> AppResult<SofieInstance> {
        if instance.id.is_some() {
            return Err(AppError::BadRequest(
                "Trying to create instance which has an id already. Use update?".to_string(),
            ));
        }

        if self.find_by_url(&instance.url).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "An instance is already registered for {}",
                instance.url
            )));
        }

        let id = self.id_gen.generate();
        instance.id = Some(id.clone());
        self.collection.insert(&id, instance.clone()).await?;

        tracing::info!(instance_id = %id, url = %instance.url, "Sofie instance registered");
        Ok(instance)
    }

    async fn list(&self) -> AppResult<Vec<SofieInstance>> {
        Ok(self.collection.all().await)
    }

    async fn find(&self, id: &str) -> AppResult<Option<SofieInstance>> {
        Ok(self.collection.get(id).await)
    }

    async fn find_by_url(&self, url: &Url) -> AppResult<Option<SofieInstance>> {
        Ok(self.collection.find_by(|instance| &instance.url == url).await)
    }

    async fn update(&self, instance: SofieInstance) -> AppResult<SofieInstance> {
        let Some(id) = instance.id.clone() else {
            return Err(AppError::BadRequest(
                "Unable to update instance with no id. Use create?".to_string(),
            ));
        };

        if self.collection.replace(&id, instance.clone()).await? {
            Ok(instance)
        } else {
            Err(AppError::InstanceNotFound(id))
        }
    }

    async fn remove(&self, instance: &SofieInstance) -> AppResult<SofieInstance> {
        let Some(id) = instance.id.as_deref() else {
            return Err(AppError::BadRequest(
                "Unable to remove instance with no id.".to_string(),
            ));
        };

        self.collection
            .delete(id)
            .await?
            .ok_or_else(|| AppError::InstanceNotFound(id.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unsaved(url: &str) -> SofieInstance {
        SofieInstance::new("studio".to_string(), Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_create_and_find_by_url() {
        let repo = InstanceRepository::in_memory();
        let created = repo.create(unsaved("http://studio-a.local")).await.unwrap();

        // Url normalizes the trailing slash.
        let lookup = Url::parse("http://studio-a.local/").unwrap();
        assert_eq!(repo.find_by_url(&lookup).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_duplicate_url_conflicts() {
        let repo = InstanceRepository::in_memory();
        repo.create(unsaved("http://studio-a.local")).await.unwrap();

        let result = repo.create(unsaved("http://studio-a.local/")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_read_missing_instance() {
        let repo = InstanceRepository::in_memory();
        assert!(matches!(
            repo.read("nope").await,
            Err(AppError::InstanceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let repo = InstanceRepository::in_memory();
        let mut created = repo.create(unsaved("http://studio-a.local")).await.unwrap();

        created.name = "Studio A".to_string();
        repo.update(created.clone()).await.unwrap();
        assert_eq!(
            repo.read(created.id.as_deref().unwrap()).await.unwrap().name,
            "Studio A"
        );

        repo.remove(&created).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }
}
