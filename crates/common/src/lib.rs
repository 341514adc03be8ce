//! Common utilities and shared types for sofie-monitor.
//!
//! This crate provides foundational components used across all monitor crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use monitor_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Listening on port {}, generated ID: {}", config.server.port, id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;

pub use config::{
    AgentConfig, Config, DistributionConfig, MessagesConfig, ServerConfig, StorageConfig,
};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
