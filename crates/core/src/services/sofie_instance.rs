//! Sofie instance service.

use monitor_common::{AppError, AppResult};
use monitor_db::{SharedInstanceStore, SharedMessageStore, SofieInstance};
use serde::Deserialize;
use tracing::info;
use url::Url;
use validator::Validate;

/// Input for registering a Sofie instance.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddInstanceInput {
    /// Full or partial URL. `https` is assumed when the scheme is missing.
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
}

/// Service for the registry of Sofie instances messages can target.
#[derive(Clone)]
pub struct InstanceService {
    instances: SharedInstanceStore,
    messages: SharedMessageStore,
}

impl InstanceService {
    /// Create a new instance service.
    #[must_use]
    pub fn new(instances: SharedInstanceStore, messages: SharedMessageStore) -> Self {
        Self {
            instances,
            messages,
        }
    }

    /// List all registered instances.
    pub async fn list(&self) -> AppResult<Vec<SofieInstance>> {
        self.instances.list().await
    }

    /// Get an instance by ID.
    pub async fn get(&self, id: &str) -> AppResult<SofieInstance> {
        self.instances.read(id).await
    }

    /// Register an instance. The name defaults to the URL's host.
    pub async fn add(&self, input: AddInstanceInput) -> AppResult<SofieInstance> {
        input.validate()?;

        let url = parse_instance_url(&input.url)?;
        let name = match input.name {
            Some(name) => name,
            None => url.host_str().unwrap_or_default().to_string(),
        };

        self.instances.create(SofieInstance::new(name, url)).await
    }

    /// Unregister an instance.
    ///
    /// Refused while a message that has not been fully recalled still
    /// targets it, since its jobs look the instance up by id.
    pub async fn remove(&self, id: &str) -> AppResult<SofieInstance> {
        let instance = self.instances.read(id).await?;

        let in_use = self.messages.list().await?.into_iter().any(|message| {
            !message.is_erasable()
                && message
                    .distributions
                    .iter()
                    .any(|d| d.instance.id.as_deref() == Some(id))
        });
        if in_use {
            return Err(AppError::Conflict(format!(
                "Instance {id} is still targeted by a service message"
            )));
        }

        let removed = self.instances.remove(&instance).await?;
        info!(instance_id = %id, url = %removed.url, "Sofie instance unregistered");
        Ok(removed)
    }
}

fn parse_instance_url(raw: &str) -> AppResult<Url> {
    let raw = raw.trim();
    let candidate = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| AppError::BadRequest(format!("Invalid instance URL {raw}: {e}")))?;
    if url.host_str().is_none() {
        return Err(AppError::BadRequest(format!("Instance URL {raw} has no host")));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use monitor_db::test_utils::message;

    fn input(url: &str) -> AddInstanceInput {
        AddInstanceInput {
            url: url.to_string(),
            name: None,
        }
    }

    #[test]
    fn test_parse_instance_url_defaults_to_https() {
        assert_eq!(
            parse_instance_url("studio-a.local:3000").unwrap().as_str(),
            "https://studio-a.local:3000/"
        );
        assert_eq!(
            parse_instance_url(" http://studio-a.local/ ").unwrap().as_str(),
            "http://studio-a.local/"
        );
        assert!(parse_instance_url("http://").is_err());
    }

    #[tokio::test]
    async fn test_add_names_instance_after_host() {
        let fx = Fixture::new(&[]).await;

        let added = fx.instances.add(input("studio-a.local")).await.unwrap();
        assert!(added.id.is_some());
        assert_eq!(added.name, "studio-a.local");

        let named = fx
            .instances
            .add(AddInstanceInput {
                url: "https://studio-b.local".to_string(),
                name: Some("Studio B".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(named.name, "Studio B");
        assert_eq!(fx.instances.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_rejects_duplicate_url() {
        let fx = Fixture::new(&["a.example.com"]).await;

        let err = fx.instances.add(input("http://a.example.com/")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_get_and_remove() {
        let fx = Fixture::new(&["a.example.com"]).await;
        let id = fx.instance(0).id.unwrap();

        assert_eq!(fx.instances.get(&id).await.unwrap().name, "a.example.com");
        fx.instances.remove(&id).await.unwrap();
        assert!(fx.instances.get(&id).await.unwrap_err().is_not_found());
        assert!(fx.instances.remove(&id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_remove_refuses_targeted_instance() {
        let fx = Fixture::new(&["a.example.com"]).await;
        let target = fx.instance(0);
        let id = target.id.clone().unwrap();

        let stored = fx.store.create(message(None, true, &[target])).await.unwrap();
        let err = fx.instances.remove(&id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let mut finished = stored;
        finished.is_active = false;
        fx.store.update(finished).await.unwrap();

        fx.instances.remove(&id).await.unwrap();
    }
}
