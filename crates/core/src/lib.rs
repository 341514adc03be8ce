//! Core business logic for sofie-monitor.
//!
//! Services sit between the HTTP API and the registries: they validate
//! operator input, keep message records consistent and hand distribution
//! work to the [`DistributionCoordinator`](monitor_distribution::DistributionCoordinator).

pub mod services;

#[cfg(test)]
mod testing;

pub use services::*;
