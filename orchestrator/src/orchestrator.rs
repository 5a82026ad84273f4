//! Run lifecycle orchestration
//!
//! The orchestrator owns the lifecycle state machine and composes the spawner,
//! the context launcher, the per-run registry and collector, and the
//! statistics accumulator. All of its state is mutated by the single task that
//! holds `&mut Orchestrator`; contexts only reach it through the per-run
//! inbound channel.
//!
//! ```text
//! Idle ──start──▶ Running ──last completion──▶ Completed ──▶ Idle
//!                    │
//!                    └──cancel──▶ Cancelled ──▶ Idle
//! ```

use serde_json::Value;
use tokio::sync::{broadcast, mpsc};

use shared::{
    logging, process_debug, process_error, process_info, process_warn, ContextEnvelope, ContextId, ContextLink,
    ContextMessage, ContextSignal, ExecutionContextHandle, ProcessId, RunGeneration, RunLifecycleState, RunResult,
    RunningStatistics, TestConfiguration,
};

use crate::{
    core::{Collector, ContextRegistry, Observation, SpawnEvent, SpawnSignal, Spawner, StatisticsAccumulator},
    error::{OrchestratorError, OrchestratorResult},
    traits::ContextLauncher,
};

/// Capacity of the outcome broadcast; consumers that lag lose old outcomes
const OUTCOME_CHANNEL_CAPACITY: usize = 16;

/// Anything the active run can react to
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Spawn(SpawnSignal),
    Context(ContextEnvelope),
}

impl RunEvent {
    pub fn generation(&self) -> RunGeneration {
        match self {
            RunEvent::Spawn(signal) => signal.generation,
            RunEvent::Context(envelope) => envelope.generation,
        }
    }
}

/// How a run ended, as published to consumers
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed {
        result: RunResult,
        statistics: RunningStatistics,
    },
    Cancelled {
        generation: RunGeneration,
    },
}

impl RunOutcome {
    pub fn generation(&self) -> RunGeneration {
        match self {
            RunOutcome::Completed { result, .. } => result.generation,
            RunOutcome::Cancelled { generation } => *generation,
        }
    }
}

/// Everything scoped to one in-flight run
///
/// Dropping it drops the spawn receiver, the inbound channel and every
/// context's command sender, so nothing of the run can reach a later one.
struct ActiveRun {
    generation: RunGeneration,
    config: TestConfiguration,
    collector: Collector,
    registry: ContextRegistry,
    spawn_rx: mpsc::UnboundedReceiver<SpawnSignal>,
    spawn_exhausted: bool,
    inbound_tx: mpsc::UnboundedSender<ContextEnvelope>,
    inbound_rx: mpsc::UnboundedReceiver<ContextEnvelope>,
}

/// Coordinates test runs over a set of execution contexts
pub struct Orchestrator<L>
where
    L: ContextLauncher + 'static,
{
    launcher: L,
    spawner: Spawner,
    statistics: StatisticsAccumulator,
    state: RunLifecycleState,
    /// Last generation handed out; bumped on every start
    generation: RunGeneration,
    active: Option<ActiveRun>,
    last_result: Option<RunResult>,
    outcomes: broadcast::Sender<RunOutcome>,
}

impl<L> Orchestrator<L>
where
    L: ContextLauncher + 'static,
{
    pub fn new(launcher: L) -> Self {
        let (outcomes, _) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);

        Self {
            launcher,
            spawner: Spawner::new(),
            statistics: StatisticsAccumulator::new(),
            state: RunLifecycleState::Idle,
            generation: RunGeneration::default(),
            active: None,
            last_result: None,
            outcomes,
        }
    }

    /// Start a new run
    ///
    /// A run still in flight is cancelled first. Invalid configurations are
    /// rejected before anything changes.
    pub fn start(&mut self, config: TestConfiguration) -> OrchestratorResult<RunGeneration> {
        if config.resource_urls.is_empty() {
            return Err(OrchestratorError::config("resource_urls must not be empty"));
        }
        if config.context_count == 0 {
            return Err(OrchestratorError::config("context_count must be at least 1"));
        }

        if self.state == RunLifecycleState::Running {
            process_debug!(ProcessId::current(), "🔁 Restart requested while running, cancelling current run");
            self.cancel();
        }

        let generation = self.generation.next();
        self.generation = generation;

        let spawn_rx = self
            .spawner
            .begin(generation, config.context_count, config.spawn_delay());
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        process_info!(
            ProcessId::current(),
            "🚀 Starting {}: {} contexts, {} resources, {}ms spawn delay",
            generation,
            config.context_count,
            config.resource_urls.len(),
            config.spawn_delay_ms
        );

        self.active = Some(ActiveRun {
            generation,
            collector: Collector::new(generation, config.context_count),
            config,
            registry: ContextRegistry::new(),
            spawn_rx,
            spawn_exhausted: false,
            inbound_tx,
            inbound_rx,
        });
        self.transition(RunLifecycleState::Running);

        Ok(generation)
    }

    /// Abort the active run
    ///
    /// Returns `false` when there is nothing to cancel. No statistics are
    /// recorded for a cancelled run.
    pub fn cancel(&mut self) -> bool {
        if self.state != RunLifecycleState::Running {
            return false;
        }

        self.spawner.cancel();
        let generation = match self.active.take() {
            Some(mut run) => {
                run.collector.cancel();
                run.registry.clear();
                run.generation
            }
            None => self.generation,
        };

        self.transition(RunLifecycleState::Cancelled);
        process_info!(ProcessId::current(), "🛑 {} cancelled", generation);
        self.publish(RunOutcome::Cancelled { generation });
        self.transition(RunLifecycleState::Idle);

        true
    }

    /// Wait for the next event of the active run
    ///
    /// Returns `None` when no run is active.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        let run = self.active.as_mut()?;
        let ActiveRun {
            spawn_rx,
            spawn_exhausted,
            inbound_rx,
            ..
        } = run;

        tokio::select! {
            biased;

            Some(signal) = spawn_rx.recv(), if !*spawn_exhausted => Some(RunEvent::Spawn(signal)),
            Some(envelope) = inbound_rx.recv() => Some(RunEvent::Context(envelope)),
            else => None,
        }
    }

    /// Apply one event to the active run
    ///
    /// Returns the outcome when this event completed the run. Failures are
    /// logged; none of them stops the orchestrator.
    pub async fn handle_event(&mut self, event: RunEvent) -> Option<RunOutcome> {
        let generation = event.generation();
        if !self.is_current(generation) {
            process_debug!(ProcessId::current(), "🗑️ Discarding stale event from {}", generation);
            return None;
        }

        match event {
            RunEvent::Spawn(signal) => {
                self.handle_spawn(signal.event).await;
                None
            }
            RunEvent::Context(envelope) => match envelope.signal {
                ContextSignal::Ready => {
                    self.handle_context_ready(envelope.context_id);
                    None
                }
                ContextSignal::Message(payload) => self.handle_context_message(envelope.context_id, &payload),
            },
        }
    }

    /// Drive the active run until it completes or is cancelled elsewhere
    pub async fn await_outcome(&mut self) -> Option<RunOutcome> {
        loop {
            let event = self.next_event().await?;
            if let Some(outcome) = self.handle_event(event).await {
                return Some(outcome);
            }
        }
    }

    /// Receive every future run outcome
    pub fn subscribe(&self) -> broadcast::Receiver<RunOutcome> {
        self.outcomes.subscribe()
    }

    pub fn statistics(&self) -> RunningStatistics {
        self.statistics.snapshot()
    }

    /// Means of every completed run since the last reset, oldest first
    pub fn run_history(&self) -> &[f64] {
        self.statistics.history()
    }

    pub fn reset_statistics(&mut self) {
        self.statistics.reset();
        process_info!(ProcessId::current(), "🧹 Running statistics reset");
    }

    pub fn state(&self) -> RunLifecycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunLifecycleState::Running
    }

    /// Generation of the run in flight, if any
    pub fn active_generation(&self) -> Option<RunGeneration> {
        self.active.as_ref().map(|run| run.generation)
    }

    pub fn last_result(&self) -> Option<&RunResult> {
        self.last_result.as_ref()
    }

    fn is_current(&self, generation: RunGeneration) -> bool {
        self.state == RunLifecycleState::Running && self.active.as_ref().is_some_and(|run| run.generation == generation)
    }

    async fn handle_spawn(&mut self, event: SpawnEvent) {
        let Some(run) = self.active.as_mut() else {
            return;
        };

        match event {
            SpawnEvent::Spawned(handle) => {
                let context_id = handle.id;
                let link = ContextLink::new(run.generation, context_id, run.inbound_tx.clone());
                process_debug!(ProcessId::current(), "🌱 Spawning {} for {}", context_id, run.generation);

                match self.launcher.launch(handle.clone(), link).await {
                    Ok(commands) => Self::register_context(run, handle, commands),
                    Err(e) => logging::log_error(ProcessId::current(), &format!("Launching {context_id}"), &e),
                }
            }
            SpawnEvent::Exhausted { emitted } => {
                run.spawn_exhausted = true;
                process_debug!(ProcessId::current(), "✅ All {} contexts spawned for {}", emitted, run.generation);
            }
        }
    }

    fn register_context(run: &mut ActiveRun, handle: ExecutionContextHandle, commands: shared::CommandSender) {
        let context_id = handle.id;
        if run.registry.register(handle, commands).is_some() {
            process_warn!(ProcessId::current(), "⚠️ {} was registered twice, keeping the newest", context_id);
        }

        // A readiness signal that arrived before registration is replayed now
        if run.registry.take_deferred_ready(context_id) {
            process_debug!(ProcessId::current(), "📤 Sending queued start command to {}", context_id);
            Self::send_start(run, context_id);
        }
    }

    fn handle_context_ready(&mut self, context_id: ContextId) {
        let Some(run) = self.active.as_mut() else {
            return;
        };

        if run.registry.get(context_id).is_none() {
            process_debug!(ProcessId::current(), "⏳ {} ready before registration, queueing start", context_id);
            run.registry.defer_ready(context_id);
            return;
        }

        process_debug!(ProcessId::current(), "🚦 {} ready", context_id);
        Self::send_start(run, context_id);
    }

    fn send_start(run: &mut ActiveRun, context_id: ContextId) {
        let command = ContextMessage::start(context_id, run.config.resource_urls.clone());
        if let Err(e) = run.registry.send(context_id, &command) {
            process_error!(ProcessId::current(), "❌ Could not start {}: {}", context_id, e);
        }
    }

    fn handle_context_message(&mut self, sender: ContextId, payload: &Value) -> Option<RunOutcome> {
        let run = self.active.as_mut()?;

        // The link stamps the sender; a payload speaking for another id is not trusted
        if let Some(claimed) = payload.get("contextId").and_then(Value::as_u64) {
            if claimed != u64::from(sender.0) {
                process_warn!(
                    ProcessId::current(),
                    "⚠️ Dropping completion from {} claiming to be context_{}",
                    sender,
                    claimed
                );
                return None;
            }
        }

        match run.collector.observe(run.generation, payload) {
            Observation::Recorded {
                context_id,
                received,
                expected,
            } => {
                logging::log_progress(
                    ProcessId::current(),
                    "Completion",
                    &format!("{context_id} recorded ({received}/{expected})"),
                );
                None
            }
            Observation::Duplicate(context_id) => {
                process_debug!(ProcessId::current(), "🔂 Ignoring duplicate completion from {}", context_id);
                None
            }
            Observation::Malformed(reason) => {
                process_warn!(ProcessId::current(), "⚠️ Dropping malformed completion from {}: {}", sender, reason);
                None
            }
            Observation::Stale { generation } => {
                process_debug!(ProcessId::current(), "🗑️ Discarding stale completion from {}", generation);
                None
            }
            Observation::Closed => {
                process_debug!(ProcessId::current(), "🗑️ Completion from {} after collector closed", sender);
                None
            }
            Observation::Finalized(result) => Some(self.complete_run(result)),
        }
    }

    fn complete_run(&mut self, result: RunResult) -> RunOutcome {
        self.transition(RunLifecycleState::Completed);
        self.spawner.cancel();
        self.active = None;

        let statistics = self.statistics.record(result.mean_context_duration_ms());
        logging::log_success(
            ProcessId::current(),
            &format!(
                "{} completed in {:.2}ms, mean context duration {:.2}ms (running average {:.2}ms over {} runs)",
                result.generation,
                result.total_duration_ms,
                result.mean_context_duration_ms(),
                statistics.cumulative_average_ms,
                statistics.completed_run_count
            ),
        );

        self.last_result = Some(result.clone());
        let outcome = RunOutcome::Completed { result, statistics };
        self.publish(outcome.clone());
        self.transition(RunLifecycleState::Idle);

        outcome
    }

    fn publish(&self, outcome: RunOutcome) {
        // No subscribers is fine; the caller also gets the outcome directly
        let _ = self.outcomes.send(outcome);
    }

    fn transition(&mut self, to: RunLifecycleState) {
        process_debug!(ProcessId::current(), "🔀 Lifecycle {} → {}", self.state, to);
        self.state = to;
    }
}
