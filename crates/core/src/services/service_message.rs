//! Service message service.

use chrono::Utc;
use futures::future::join_all;
use monitor_agent::SharedAgent;
use monitor_common::{AppError, AppResult, MessagesConfig};
use monitor_db::{
    Criticality, DistributionStatus, KeyedLocks, ServiceMessage, SharedInstanceStore,
    SharedMessageStore, SofieInstance,
};
use monitor_distribution::{Command, DistributionCoordinator};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};
use url::Url;
use validator::Validate;

/// Input for creating a service message.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceMessageInput {
    /// Severity shown on the instances.
    pub criticality: Criticality,
    /// Message text.
    #[validate(length(min = 1, max = 2048))]
    pub message: String,
    /// URLs of the registered instances to publish to. A single string is
    /// accepted as a one-element list.
    #[serde(deserialize_with = "one_or_many")]
    #[validate(length(min = 1))]
    pub message_target: Vec<String>,
}

/// Input for changing the content of a service message.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceMessageInput {
    /// New severity.
    pub criticality: Criticality,
    /// New message text.
    #[validate(length(min = 1, max = 2048))]
    pub message: String,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(target) => vec![target],
        OneOrMany::Many(targets) => targets,
    })
}

/// Service for authoring, publishing and recalling service messages.
///
/// Every read-modify-write of a stored message happens under the message's
/// lock in [`KeyedLocks`], shared with the distribution processors.
#[derive(Clone)]
pub struct ServiceMessageService {
    messages: SharedMessageStore,
    instances: SharedInstanceStore,
    agent: SharedAgent,
    coordinator: DistributionCoordinator,
    locks: KeyedLocks,
    sender: String,
}

impl ServiceMessageService {
    /// Create a new service message service.
    #[must_use]
    pub fn new(
        messages: SharedMessageStore,
        instances: SharedInstanceStore,
        agent: SharedAgent,
        coordinator: DistributionCoordinator,
        locks: KeyedLocks,
        config: &MessagesConfig,
    ) -> Self {
        Self {
            messages,
            instances,
            agent,
            coordinator,
            locks,
            sender: config.sender.clone(),
        }
    }

    /// List all stored messages, regardless of status.
    pub async fn list(&self) -> AppResult<Vec<ServiceMessage>> {
        self.messages.list().await
    }

    /// Get a message by ID.
    pub async fn get(&self, id: &str) -> AppResult<ServiceMessage> {
        self.messages.read(id).await
    }

    /// Store a new message and start distributing it to its targets.
    ///
    /// Targets that are not registered instances are dropped.
    pub async fn create(&self, input: CreateServiceMessageInput) -> AppResult<ServiceMessage> {
        input.validate()?;

        let targets = self.resolve_targets(&input.message_target).await?;
        debug!(
            requested = input.message_target.len(),
            resolved = targets.len(),
            "Resolved message targets"
        );
        if targets.is_empty() {
            warn!("Creating service message without any registered target");
        }

        let message = ServiceMessage {
            id: None,
            criticality: input.criticality,
            text: input.message,
            sender: Some(self.sender.clone()),
            timestamp: Utc::now(),
            is_active: true,
            distributions: targets.into_iter().map(DistributionStatus::pending).collect(),
        };

        let created = self.messages.create(message).await?;
        info!(message_id = ?created.id, targets = created.distributions.len(), "Service message created");

        self.coordinator.distribute(&created, false);
        Ok(created)
    }

    /// Change criticality and text of an active message and publish the new
    /// content to all of its targets.
    ///
    /// Targets cannot be changed. The timestamp is refreshed.
    pub async fn update(
        &self,
        id: &str,
        input: UpdateServiceMessageInput,
    ) -> AppResult<ServiceMessage> {
        input.validate()?;

        let updated = {
            let _guard = self.locks.lock(id).await;
            let mut message = self.messages.read(id).await?;
            if !message.is_active {
                return Err(AppError::BadRequest(format!(
                    "Message {id} is not active and therefore can't be updated"
                )));
            }

            message.criticality = input.criticality;
            message.text = input.message;
            message.timestamp = Utc::now();
            self.messages.update(message).await?
        };
        info!(message_id = %id, "Service message updated");

        // Sofie core stores messages by id, so publishing again replaces the
        // previous content.
        self.coordinator.distribute(&updated, false);
        Ok(updated)
    }

    /// Deactivate a message and start recalling it from its targets.
    ///
    /// The record is erased once every target has confirmed the recall.
    pub async fn deactivate(&self, id: &str) -> AppResult<ServiceMessage> {
        let deactivated = {
            let _guard = self.locks.lock(id).await;
            let mut message = self.messages.read(id).await?;
            if !message.is_active {
                return Err(AppError::BadRequest(format!(
                    "Message {id} is not active and therefore can't be deactivated"
                )));
            }

            message.is_active = false;
            self.messages.update(message).await?
        };
        info!(message_id = %id, "Service message deactivated");

        self.coordinator.recall(&deactivated);
        Ok(deactivated)
    }

    /// Ask every target whether it currently holds the message and record
    /// the answers.
    ///
    /// Targets that cannot be reached keep their last known state. An
    /// inactive message that no target holds any more is erased; the
    /// returned record is then the erased one.
    pub async fn refresh_publish_states(&self, id: &str) -> AppResult<ServiceMessage> {
        let message = self.messages.read(id).await?;

        let queries = message.distributions.iter().map(|distribution| async move {
            let instance = &distribution.instance;
            (instance.url.clone(), self.agent.get_message(id, instance).await)
        });
        let reports = join_all(queries).await;

        let _guard = self.locks.lock(id).await;
        let mut current = self.messages.read(id).await?;
        for (url, report) in reports {
            match report {
                Ok(found) => {
                    current.set_distribution_status(&url, found.is_some());
                }
                Err(err) => warn!(
                    message_id = %id,
                    url = %url,
                    error = %err,
                    "Unable to read publish state, keeping last known state"
                ),
            }
        }

        if current.is_erasable() {
            info!(message_id = %id, "Service message no longer published anywhere, erasing");
            self.messages.remove(&current).await
        } else {
            self.messages.update(current).await
        }
    }

    /// Reschedule the work left unfinished by a previous run.
    ///
    /// Active messages are published again to the targets that have not
    /// confirmed them, inactive ones are recalled from the targets that
    /// still hold them. Returns the number of jobs scheduled.
    pub async fn resume_pending(&self) -> AppResult<usize> {
        let mut scheduled = 0;

        for message in self.messages.list().await? {
            if message.is_active {
                scheduled += self
                    .coordinator
                    .dispatch(Command::Create, &message, |d| !d.is_active);
            } else if message.has_active_distributions() {
                scheduled += self
                    .coordinator
                    .dispatch(Command::Delete, &message, |d| d.is_active);
            } else {
                debug!(message_id = ?message.id, "Erasing fully recalled service message");
                self.messages.remove(&message).await?;
            }
        }

        info!(jobs = scheduled, "Resumed pending distributions");
        Ok(scheduled)
    }

    async fn resolve_targets(&self, targets: &[String]) -> AppResult<Vec<SofieInstance>> {
        let registered = self.instances.list().await?;
        let mut resolved: Vec<SofieInstance> = Vec::new();

        for target in targets {
            let url = Url::parse(target)
                .map_err(|e| AppError::BadRequest(format!("Invalid target URL {target}: {e}")))?;

            match registered.iter().find(|instance| instance.url == url) {
                Some(instance) => {
                    if !resolved.iter().any(|r| r.id == instance.id) {
                        resolved.push(instance.clone());
                    }
                }
                None => debug!(url = %url, "Dropping target that is not a registered instance"),
            }
        }

        Ok(resolved)
    }
}
