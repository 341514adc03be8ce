//! HTTP client for the Sofie core service message API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use monitor_common::AgentConfig;
use monitor_db::{Criticality, DistributionStatus, ServiceMessage, SofieInstance};
use reqwest::{Client, Response, redirect};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use url::Url;

use crate::{AgentError, InstanceAgent};

const SERVICE_MESSAGE_API_PATH: &str = "serviceMessages";

/// Message as exchanged with Sofie core.
#[derive(Debug, Serialize, Deserialize)]
struct RemoteMessage {
    id: String,
    criticality: Criticality,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sender: Option<String>,
    timestamp: DateTime<Utc>,
}

/// Agent for Sofie core instances over HTTP.
#[derive(Clone)]
pub struct SofieCoreAgent {
    client: Client,
    user_agent: String,
}

impl SofieCoreAgent {
    /// Create a new agent.
    ///
    /// Redirects are never followed: Sofie core answers unknown paths by
    /// redirecting to its frontpage, which must not look like success.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(redirect::Policy::none())
            .build()?;

        debug!(user_agent = %config.user_agent, "Sofie core agent initialized");

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }

    fn endpoint(instance: &SofieInstance, id: Option<&str>) -> Result<Url, AgentError> {
        let mut url = instance.url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| AgentError::InvalidUrl(instance.url.to_string()))?;
            segments.clear().push(SERVICE_MESSAGE_API_PATH);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn send_create(
        &self,
        message: &ServiceMessage,
        instance: &SofieInstance,
    ) -> Result<(), AgentError> {
        let id = message.id.clone().ok_or(AgentError::MissingMessageId)?;
        let payload = RemoteMessage {
            id,
            criticality: message.criticality,
            message: message.text.clone(),
            sender: message.sender.clone(),
            timestamp: message.timestamp,
        };

        let response = self
            .client
            .post(Self::endpoint(instance, None)?)
            .header("User-Agent", &self.user_agent)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await?;

        let response = check_response(response, &[200, 201]).await?;

        // An instance without the API answers with an HTML page; only the
        // real API replies with JSON.
        read_json::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn send_recall(
        &self,
        message: &ServiceMessage,
        instance: &SofieInstance,
    ) -> Result<(), AgentError> {
        let id = message.id.as_deref().ok_or(AgentError::MissingMessageId)?;

        let response = self
            .client
            .delete(Self::endpoint(instance, Some(id))?)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        let response = check_response(response, &[200, 404]).await?;
        if response.status().as_u16() == 404 {
            debug!(message_id = %id, instance = %instance.name, "Message already absent on instance");
            return Ok(());
        }

        read_json::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn send_get(
        &self,
        id: &str,
        instance: &SofieInstance,
    ) -> Result<Option<ServiceMessage>, AgentError> {
        let response = self
            .client
            .get(Self::endpoint(instance, Some(id))?)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .send()
            .await?;

        let response = check_response(response, &[200, 404]).await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }

        let remote: RemoteMessage = read_json(response).await?;
        Ok(Some(ServiceMessage {
            id: Some(remote.id),
            criticality: remote.criticality,
            text: remote.message,
            sender: remote.sender,
            timestamp: remote.timestamp,
            is_active: true,
            distributions: vec![DistributionStatus {
                instance: instance.clone(),
                is_active: true,
            }],
        }))
    }
}

#[async_trait]
impl InstanceAgent for SofieCoreAgent {
    async fn create_message(
        &self,
        message: &ServiceMessage,
        instance: &SofieInstance,
    ) -> Result<(), AgentError> {
        info!(message_id = ?message.id, instance = %instance.name, "Creating message");

        self.send_create(message, instance).await.inspect_err(|e| {
            error!(
                message_id = ?message.id,
                instance = %instance.name,
                url = %instance.url,
                error = %e,
                "Unable to create message"
            );
        })
    }

    async fn recall_message(
        &self,
        message: &ServiceMessage,
        instance: &SofieInstance,
    ) -> Result<(), AgentError> {
        debug!(message_id = ?message.id, instance = %instance.name, "Recalling message");

        self.send_recall(message, instance).await.inspect_err(|e| {
            error!(
                message_id = ?message.id,
                instance = %instance.name,
                url = %instance.url,
                error = %e,
                "Unable to recall message"
            );
        })
    }

    async fn get_message(
        &self,
        id: &str,
        instance: &SofieInstance,
    ) -> Result<Option<ServiceMessage>, AgentError> {
        self.send_get(id, instance).await.inspect_err(|e| {
            error!(
                message_id = %id,
                instance = %instance.name,
                error = %e,
                "Unable to retrieve message"
            );
        })
    }
}

async fn check_response(response: Response, accepted: &[u16]) -> Result<Response, AgentError> {
    let status = response.status().as_u16();
    if accepted.contains(&status) {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AgentError::from_status(status, body, accepted))
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, AgentError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| AgentError::MalformedBody(e.to_string()))
}
