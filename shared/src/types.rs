//! Core types used throughout the harness

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Global process role singleton - set once at startup
static PROCESS_ID: OnceLock<ProcessId> = OnceLock::new();

/// Fallback role when nothing was initialized (library use, tests)
static DEFAULT_PROCESS_ID: ProcessId = ProcessId::Harness;

/// Identifier of a log source in the harness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessId {
    /// The orchestrating harness (singleton)
    Harness,
    /// An execution context running its workload
    Context(ContextId),
}

impl ProcessId {
    /// Initialize the global process role for the harness binary
    pub fn init_harness() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Harness)
    }

    /// Get the global process role, defaulting to the harness
    pub fn current() -> &'static ProcessId {
        PROCESS_ID.get().unwrap_or(&DEFAULT_PROCESS_ID)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::Harness => write!(f, "harness"),
            ProcessId::Context(id) => write!(f, "{id}"),
        }
    }
}

/// 0-based identity of an execution context, unique within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(pub u32);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "context_{}", self.0)
    }
}

impl From<u32> for ContextId {
    fn from(value: u32) -> Self {
        ContextId(value)
    }
}

/// Token identifying one run; every timer and inbound event carries one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunGeneration(pub u64);

impl RunGeneration {
    /// The generation following this one
    pub fn next(self) -> Self {
        RunGeneration(self.0 + 1)
    }
}

impl fmt::Display for RunGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// Parameters of one test run, supplied by the configuration source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfiguration {
    pub context_count: u32,
    pub resource_urls: Vec<String>,
    #[serde(default)]
    pub spawn_delay_ms: u64,
}

impl TestConfiguration {
    pub fn new(context_count: u32, resource_urls: Vec<String>) -> Self {
        Self {
            context_count,
            resource_urls,
            spawn_delay_ms: 0,
        }
    }

    /// Set the delay between successive spawns (fluent API)
    pub fn with_spawn_delay_ms(mut self, spawn_delay_ms: u64) -> Self {
        self.spawn_delay_ms = spawn_delay_ms;
        self
    }

    pub fn spawn_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.spawn_delay_ms)
    }
}

/// A freshly spawned execution context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContextHandle {
    pub id: ContextId,
    pub spawned_at: DateTime<Utc>,
}

/// Load timing of a single resource, measured inside a context (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTiming {
    pub url: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
}

impl ResourceTiming {
    pub fn new(url: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            url: url.into(),
            start_time,
            end_time,
            duration: end_time - start_time,
        }
    }
}

impl From<ResourceTiming> for Value {
    fn from(timing: ResourceTiming) -> Self {
        json!({
            "url": timing.url,
            "startTime": timing.start_time,
            "endTime": timing.end_time,
            "duration": timing.duration,
        })
    }
}

/// Everything one context reported for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResult {
    pub context_id: ContextId,
    /// Timing entries exactly as the context reported them
    pub timings: Vec<Value>,
    pub total_duration: f64,
}

/// A finalized run: one result per context, keyed by id
///
/// `total_duration_ms` is measured on the monotonic clock and `ended_at` is
/// `started_at` plus that duration, so the two always agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub generation: RunGeneration,
    pub context_results: BTreeMap<ContextId, ContextResult>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total_duration_ms: f64,
}

impl RunResult {
    /// Arithmetic mean of `total_duration` across all contexts, 0.0 if empty
    pub fn mean_context_duration_ms(&self) -> f64 {
        if self.context_results.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.context_results.values().map(|r| r.total_duration).sum();
        sum / self.context_results.len() as f64
    }

    pub fn context_count(&self) -> usize {
        self.context_results.len()
    }
}

/// Cross-run running average of per-run mean durations
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningStatistics {
    pub completed_run_count: u64,
    pub cumulative_average_ms: f64,
}

/// Lifecycle of the orchestrator with respect to the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunLifecycleState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl fmt::Display for RunLifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunLifecycleState::Idle => write!(f, "idle"),
            RunLifecycleState::Running => write!(f, "running"),
            RunLifecycleState::Completed => write!(f, "completed"),
            RunLifecycleState::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_result(id: u32, total_duration: f64) -> ContextResult {
        ContextResult {
            context_id: ContextId(id),
            timings: vec![],
            total_duration,
        }
    }

    #[test]
    fn test_process_id_display() {
        assert_eq!(ProcessId::Harness.to_string(), "harness");
        assert_eq!(ProcessId::Context(ContextId(3)).to_string(), "context_3");
    }

    #[test]
    fn test_generation_is_monotonic() {
        let first = RunGeneration::default();
        assert!(first.next() > first);
        assert_eq!(first.next().next(), RunGeneration(2));
    }

    #[test]
    fn test_resource_timing_duration() {
        let timing = ResourceTiming::new("https://cdn.example/a.js", 10.0, 35.5);
        assert_eq!(timing.duration, 25.5);

        let value = Value::from(timing);
        assert_eq!(value["startTime"], 10.0);
        assert_eq!(value["duration"], 25.5);
    }

    #[test]
    fn test_run_result_mean() {
        let mut results = BTreeMap::new();
        for (id, duration) in [(2, 120.0), (0, 95.0), (1, 110.0)] {
            results.insert(ContextId(id), context_result(id, duration));
        }
        let now = Utc::now();
        let run = RunResult {
            generation: RunGeneration(1),
            context_results: results,
            started_at: now,
            ended_at: now,
            total_duration_ms: 0.0,
        };

        assert!((run.mean_context_duration_ms() - 108.333).abs() < 0.01);
        assert_eq!(run.context_count(), 3);
    }

    #[test]
    fn test_configuration_wire_names() {
        let config: TestConfiguration =
            serde_json::from_str(r#"{"contextCount":4,"resourceUrls":["a","b"]}"#).unwrap();
        assert_eq!(config.context_count, 4);
        assert_eq!(config.spawn_delay_ms, 0);
        assert_eq!(config.resource_urls.len(), 2);
    }
}
