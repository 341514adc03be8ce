//! Storage layer for sofie-monitor.
//!
//! Holds the service message and Sofie instance registries. Both registries
//! are JSON-backed collections: kept in memory and, when a path is configured,
//! snapshotted to disk after every write.

pub mod collection;
pub mod entities;
pub mod locks;
pub mod repositories;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use entities::{Criticality, DistributionStatus, ServiceMessage, SofieInstance};
pub use locks::KeyedLocks;
pub use repositories::{
    InstanceRepository, InstanceStore, MessageRepository, MessageStore, SharedInstanceStore,
    SharedMessageStore,
};
