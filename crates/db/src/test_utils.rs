//! Fixtures for building registry records in tests.

use chrono::Utc;
use url::Url;

use crate::entities::{Criticality, DistributionStatus, ServiceMessage, SofieInstance};

/// A stored instance with the given id and URL.
///
/// # Panics
/// Panics if `url` does not parse.
#[must_use]
#[allow(clippy::expect_used)]
pub fn instance(id: &str, url: &str) -> SofieInstance {
    SofieInstance {
        id: Some(id.to_string()),
        name: format!("instance-{id}"),
        url: Url::parse(url).expect("fixture URL must parse"),
    }
}

/// A CRITICAL "Outage" message with one inactive distribution per instance.
#[must_use]
pub fn message(id: Option<&str>, is_active: bool, targets: &[SofieInstance]) -> ServiceMessage {
    ServiceMessage {
        id: id.map(ToString::to_string),
        criticality: Criticality::Critical,
        text: "Outage".to_string(),
        sender: Some("sofie-monitor".to_string()),
        timestamp: Utc::now(),
        is_active,
        distributions: targets
            .iter()
            .cloned()
            .map(DistributionStatus::pending)
            .collect(),
    }
}
