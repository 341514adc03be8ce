//! Sofie instance entity.

use serde::{Deserialize, Serialize};
use url::Url;

/// A remote Sofie automation instance reachable over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SofieInstance {
    /// Registry id, absent until the instance has been stored.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name.
    pub name: String,

    /// Base URL of the instance. Unique within the registry.
    pub url: Url,
}

impl SofieInstance {
    /// Create an instance that has not been stored yet.
    #[must_use]
    pub const fn new(name: String, url: Url) -> Self {
        Self { id: None, name, url }
    }
}
