//! Stored entities.

pub mod service_message;
pub mod sofie_instance;

pub use service_message::{Criticality, DistributionStatus, ServiceMessage};
pub use sofie_instance::SofieInstance;
