//! Staggered spawn scheduling
//!
//! The spawner emits one `ExecutionContextHandle` at a time on a timer task,
//! waiting the configured delay between emissions. Every signal carries the
//! generation of the sequence that produced it, and each sequence gets its
//! own channel, so a cancelled sequence can never leak into the next one.

use chrono::Utc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use shared::{process_debug, ContextId, ExecutionContextHandle, ProcessId, RunGeneration};

/// What the spawner reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnEvent {
    /// A new context should be brought into existence
    Spawned(ExecutionContextHandle),
    /// The sequence emitted everything it was asked for
    Exhausted { emitted: u32 },
}

/// A spawn event tagged with the sequence it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnSignal {
    pub generation: RunGeneration,
    pub event: SpawnEvent,
}

/// Timer-driven context spawner
#[derive(Debug, Default)]
pub struct Spawner {
    task: Option<JoinHandle<()>>,
    generation: Option<RunGeneration>,
}

impl Spawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start emitting `count` handles, `delay` apart
    ///
    /// Any sequence still running is cancelled first.
    pub fn begin(
        &mut self,
        generation: RunGeneration,
        count: u32,
        delay: Duration,
    ) -> mpsc::UnboundedReceiver<SpawnSignal> {
        self.cancel();

        let (tx, rx) = mpsc::unbounded_channel();
        process_debug!(
            ProcessId::current(),
            "⏱️ Spawning {} contexts {}ms apart for {}",
            count,
            delay.as_millis(),
            generation
        );

        self.task = Some(tokio::spawn(Self::emit(tx, generation, count, delay)));
        self.generation = Some(generation);
        rx
    }

    /// Stop all future emissions; safe to call repeatedly
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            if let Some(generation) = self.generation.take() {
                process_debug!(ProcessId::current(), "⏹️ Spawn sequence for {} cancelled", generation);
            }
        }
    }

    /// Whether a sequence is still emitting
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    async fn emit(tx: mpsc::UnboundedSender<SpawnSignal>, generation: RunGeneration, count: u32, delay: Duration) {
        for index in 0..count {
            if index > 0 {
                tokio::time::sleep(delay).await;
            }

            let handle = ExecutionContextHandle {
                id: ContextId(index),
                spawned_at: Utc::now(),
            };
            let signal = SpawnSignal {
                generation,
                event: SpawnEvent::Spawned(handle),
            };
            if tx.send(signal).is_err() {
                // Receiver dropped: the run is gone
                return;
            }
        }

        let _ = tx.send(SpawnSignal {
            generation,
            event: SpawnEvent::Exhausted { emitted: count },
        });
    }
}

impl Drop for Spawner {
    fn drop(&mut self) {
        self.cancel();
    }
}
