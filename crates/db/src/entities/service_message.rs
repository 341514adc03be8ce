//! Service message entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::SofieInstance;

/// Criticality level for service messages.
///
/// Serialized as its numeric level, which is what Sofie core expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Criticality {
    /// Subject matter will affect operations.
    Critical = 1,
    /// Operations will not be affected, but non-critical functions may be.
    Warning = 2,
    /// General information.
    Notification = 3,
}

impl From<Criticality> for u8 {
    fn from(criticality: Criticality) -> Self {
        criticality as Self
    }
}

impl TryFrom<u8> for Criticality {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Critical),
            2 => Ok(Self::Warning),
            3 => Ok(Self::Notification),
            other => Err(format!("invalid criticality level {other}, expected 1, 2 or 3")),
        }
    }
}

/// Delivery status of one message on one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionStatus {
    /// Target instance, embedded by value.
    pub instance: SofieInstance,

    /// Last confirmed presence of the message on the instance.
    pub is_active: bool,
}

impl DistributionStatus {
    /// A not yet delivered distribution to `instance`.
    #[must_use]
    pub const fn pending(instance: SofieInstance) -> Self {
        Self {
            instance,
            is_active: false,
        }
    }
}

/// An operator-authored notice broadcast to Sofie instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMessage {
    /// Registry id, absent until the message has been stored.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Severity shown on the instances.
    pub criticality: Criticality,

    /// Message body.
    #[serde(rename = "message")]
    pub text: String,

    /// Originator of the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,

    /// Creation time, refreshed on every content update.
    pub timestamp: DateTime<Utc>,

    /// Whether the message is still meant to exist anywhere.
    pub is_active: bool,

    /// One entry per target, fixed at creation.
    #[serde(default)]
    pub distributions: Vec<DistributionStatus>,
}

impl ServiceMessage {
    /// Find the distribution targeting the instance at `url`.
    #[must_use]
    pub fn distribution_for(&self, url: &Url) -> Option<&DistributionStatus> {
        self.distributions.iter().find(|d| &d.instance.url == url)
    }

    /// Record the delivery status for the instance at `url`.
    ///
    /// Returns `false` when the message has no distribution for that URL.
    pub fn set_distribution_status(&mut self, url: &Url, is_active: bool) -> bool {
        match self.distributions.iter_mut().find(|d| &d.instance.url == url) {
            Some(distribution) => {
                distribution.is_active = is_active;
                true
            }
            None => false,
        }
    }

    /// Whether any target still holds the message.
    #[must_use]
    pub fn has_active_distributions(&self) -> bool {
        self.distributions.iter().any(|d| d.is_active)
    }

    /// Whether the message may be erased from the registry.
    #[must_use]
    pub fn is_erasable(&self) -> bool {
        !self.is_active && !self.has_active_distributions()
    }
}
