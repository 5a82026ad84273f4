//! Completion collection
//!
//! The collector is the join barrier of a run: it accepts raw completion
//! payloads in any order, keeps one `ContextResult` per context id, and
//! finalizes the `RunResult` the moment the last distinct id arrives.

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::time::Instant;

use shared::{process_warn, ContextId, ContextMessage, ContextResult, ProcessId, RunGeneration, RunResult};

/// Outcome of offering one inbound event to the collector
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// A new context result was recorded; the run is not whole yet
    Recorded { context_id: ContextId, received: usize, expected: usize },
    /// The id was already recorded; nothing changed
    Duplicate(ContextId),
    /// The payload failed validation and was dropped
    Malformed(String),
    /// The event belongs to another run
    Stale { generation: RunGeneration },
    /// The collector already finalized or was cancelled
    Closed,
    /// This event completed the run
    Finalized(RunResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectorState {
    Collecting,
    Finalized,
    Cancelled,
}

/// Per-run accumulator of context results
#[derive(Debug)]
pub struct Collector {
    generation: RunGeneration,
    expected: u32,
    started_at: DateTime<Utc>,
    started: Instant,
    results: BTreeMap<ContextId, ContextResult>,
    state: CollectorState,
}

impl Collector {
    /// Fresh collector for a run expecting `expected` contexts
    pub fn new(generation: RunGeneration, expected: u32) -> Self {
        Self {
            generation,
            expected,
            started_at: Utc::now(),
            started: Instant::now(),
            results: BTreeMap::new(),
            state: CollectorState::Collecting,
        }
    }

    /// Offer an inbound completion payload
    pub fn observe(&mut self, generation: RunGeneration, payload: &Value) -> Observation {
        if generation != self.generation {
            return Observation::Stale { generation };
        }
        if self.state != CollectorState::Collecting {
            return Observation::Closed;
        }

        let event = match ContextMessage::from_value(payload) {
            Ok(ContextMessage::TestComplete(event)) => event,
            Ok(other) => {
                return Observation::Malformed(format!("unexpected message type {}", other.kind()));
            }
            Err(e) => return Observation::Malformed(e.to_string()),
        };

        let context_id = event.context_id;
        if context_id.0 >= self.expected {
            return Observation::Malformed(format!(
                "{} outside of [0, {})",
                context_id, self.expected
            ));
        }
        if !event.total_duration.is_finite() {
            return Observation::Malformed(format!(
                "{} reported invalid total duration {}",
                context_id, event.total_duration
            ));
        }
        if self.results.contains_key(&context_id) {
            return Observation::Duplicate(context_id);
        }
        if event.total_duration < 0.0 {
            process_warn!(
                ProcessId::current(),
                "⚠️ {} reported negative total duration {}ms, keeping it",
                context_id,
                event.total_duration
            );
        }

        self.results.insert(context_id, event.into());

        if self.results.len() == self.expected as usize {
            self.finalize()
        } else {
            Observation::Recorded {
                context_id,
                received: self.results.len(),
                expected: self.expected as usize,
            }
        }
    }

    /// Drop partial results and refuse further events; safe to call repeatedly
    pub fn cancel(&mut self) {
        if self.state == CollectorState::Collecting {
            self.results.clear();
            self.state = CollectorState::Cancelled;
        }
    }

    pub fn generation(&self) -> RunGeneration {
        self.generation
    }

    pub fn received(&self) -> usize {
        self.results.len()
    }

    pub fn is_finalized(&self) -> bool {
        self.state == CollectorState::Finalized
    }

    pub fn is_open(&self) -> bool {
        self.state == CollectorState::Collecting
    }

    fn finalize(&mut self) -> Observation {
        self.state = CollectorState::Finalized;
        // One measurement feeds both fields so ended_at - started_at == total_duration_ms
        let elapsed_us = i64::try_from(self.started.elapsed().as_micros()).unwrap_or(i64::MAX);

        Observation::Finalized(RunResult {
            generation: self.generation,
            context_results: std::mem::take(&mut self.results),
            started_at: self.started_at,
            ended_at: self.started_at + TimeDelta::microseconds(elapsed_us),
            total_duration_ms: elapsed_us as f64 / 1000.0,
        })
    }
}
