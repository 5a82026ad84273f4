//! Orchestration core of the load contention harness
//!
//! Spawns execution contexts on a controllable cadence, collects their
//! out-of-order completion events, detects when a run is whole and folds
//! completed runs into a running statistic.

pub mod core;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use core::{Collector, ContextRegistry, Observation, SpawnEvent, SpawnSignal, Spawner, StatisticsAccumulator};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{Orchestrator, RunEvent, RunOutcome};
pub use traits::{ContextLauncher, MockContextLauncher};
