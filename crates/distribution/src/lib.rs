//! Service message distribution engine.
//!
//! Broadcasts service messages to Sofie instances and recalls them again:
//!
//! - **Jobs**: one unit of retryable work per message/instance pair
//! - **Processors**: the remote action and local bookkeeping per command
//! - **Executor**: runs jobs until done, retrying transient failures forever
//! - **Scheduler**: timer-driven task spawning with shutdown
//! - **Coordinator**: turns `distribute`/`recall` requests into jobs
//!
//! Progress is only observable through the message registry: each
//! distribution's `is_active` flips once its job's post-action has run.

pub mod command;
pub mod coordinator;
pub mod executor;
pub mod job;
pub mod processor;
pub mod processors;
pub mod scheduler;

pub use command::Command;
pub use coordinator::DistributionCoordinator;
pub use executor::{JobOutcome, RetryingExecutor};
pub use job::{Job, JobState};
pub use processor::{ProcessingError, Processor, ProcessorRegistry};
pub use processors::{CreateProcessor, DeleteProcessor, ProcessorContext, UpdateProcessor};
pub use scheduler::JobScheduler;
