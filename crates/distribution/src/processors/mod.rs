//! Processors for each distribution command.

mod create;
mod delete;
mod update;

use std::sync::Arc;

use monitor_agent::SharedAgent;
use monitor_db::{KeyedLocks, SharedInstanceStore, SharedMessageStore};

use crate::processor::ProcessorRegistry;

pub use create::CreateProcessor;
pub use delete::DeleteProcessor;
pub use update::UpdateProcessor;

/// Collaborators shared by all processors.
#[derive(Clone)]
pub struct ProcessorContext {
    /// Service message registry.
    pub messages: SharedMessageStore,
    /// Sofie instance registry.
    pub instances: SharedInstanceStore,
    /// Remote instance agent.
    pub agent: SharedAgent,
    /// Serializes read-modify-write of message records by message id.
    pub locks: KeyedLocks,
}

impl ProcessorRegistry {
    /// The production registry: CREATE, UPDATE and DELETE processors over
    /// `context`.
    #[must_use]
    pub fn standard(context: ProcessorContext) -> Self {
        Self::new(
            Arc::new(CreateProcessor::new(context.clone())),
            Arc::new(UpdateProcessor),
            Arc::new(DeleteProcessor::new(context)),
        )
    }
}
