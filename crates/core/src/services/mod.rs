//! Business logic services.

#![allow(missing_docs)]

pub mod service_message;
pub mod sofie_instance;

pub use service_message::{
    CreateServiceMessageInput, ServiceMessageService, UpdateServiceMessageInput,
};
pub use sofie_instance::{AddInstanceInput, InstanceService};
