//! Core run machinery
//!
//! Spawner, collector, registry and statistics hold no I/O of their own; the
//! orchestrator wires them to channels and the context launcher.

pub mod collector;
pub mod registry;
pub mod spawner;
pub mod statistics;

pub use collector::{Collector, Observation};
pub use registry::{ContextRegistry, LiveContext};
pub use spawner::{SpawnEvent, SpawnSignal, Spawner};
pub use statistics::StatisticsAccumulator;
