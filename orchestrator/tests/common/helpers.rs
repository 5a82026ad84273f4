//! Test helpers and builder patterns for orchestrator tests
//!
//! `ScriptedLauncher` stands in for real execution contexts: each launched
//! context follows a `ContextScript` (when to report, what duration, whether
//! to misbehave) and everything it does is recorded in a shared `ScriptBook`.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use orchestrator::{ContextLauncher, Orchestrator, OrchestratorResult, RunOutcome};
use shared::{
    CommandReceiver, CommandSender, ContextId, ContextLink, ContextMessage, ExecutionContextHandle, ResourceTiming,
    RunGeneration, RunningStatistics,
};

/// Upper bound for driving a run in tests (virtual time when paused)
pub const RUN_TIMEOUT: Duration = Duration::from_secs(30);

/// How one scripted context behaves once it receives START_TEST
#[derive(Debug, Clone)]
pub struct ContextScript {
    pub report_after: Duration,
    pub total_duration: f64,
    pub duplicate: bool,
    pub malformed_first: bool,
    pub silent: bool,
}

impl ContextScript {
    /// Report `total_duration` after `report_after_ms` of (virtual) time
    pub fn completes(total_duration: f64, report_after_ms: u64) -> Self {
        Self {
            report_after: Duration::from_millis(report_after_ms),
            total_duration,
            duplicate: false,
            malformed_first: false,
            silent: false,
        }
    }

    /// Never report
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::completes(0.0, 0)
        }
    }

    /// Report a second, different completion right after the first
    pub fn with_duplicate(mut self) -> Self {
        self.duplicate = true;
        self
    }

    /// Post an invalid completion before the real one
    pub fn with_malformed_first(mut self) -> Self {
        self.malformed_first = true;
        self
    }
}

#[derive(Debug, Default)]
struct Book {
    scripts: BTreeMap<ContextId, ContextScript>,
    launched: Vec<(RunGeneration, ContextId, Instant)>,
    started: Vec<(RunGeneration, ContextId, Vec<String>)>,
    reported: Vec<(RunGeneration, ContextId)>,
}

/// Scripts for upcoming launches plus a record of what contexts did
#[derive(Debug, Clone, Default)]
pub struct ScriptBook {
    inner: Arc<Mutex<Book>>,
}

impl ScriptBook {
    /// Script a whole run; contexts report in the listed order, 10ms apart
    pub fn script_run(&self, run: &[(u32, f64)]) {
        let mut book = self.inner.lock().unwrap();
        book.scripts.clear();
        for (position, (id, duration)) in run.iter().enumerate() {
            let report_after_ms = 10 * (position as u64 + 1);
            book.scripts
                .insert(ContextId(*id), ContextScript::completes(*duration, report_after_ms));
        }
    }

    pub fn script(&self, id: u32, script: ContextScript) {
        self.inner.lock().unwrap().scripts.insert(ContextId(id), script);
    }

    pub fn launched(&self, generation: RunGeneration) -> Vec<ContextId> {
        let book = self.inner.lock().unwrap();
        book.launched
            .iter()
            .filter(|(g, _, _)| *g == generation)
            .map(|(_, id, _)| *id)
            .collect()
    }

    pub fn launch_times(&self, generation: RunGeneration) -> Vec<Instant> {
        let book = self.inner.lock().unwrap();
        book.launched
            .iter()
            .filter(|(g, _, _)| *g == generation)
            .map(|(_, _, at)| *at)
            .collect()
    }

    /// Start commands received, as (context, urls)
    pub fn started(&self, generation: RunGeneration) -> Vec<(ContextId, Vec<String>)> {
        let book = self.inner.lock().unwrap();
        book.started
            .iter()
            .filter(|(g, _, _)| *g == generation)
            .map(|(_, id, urls)| (*id, urls.clone()))
            .collect()
    }

    pub fn reported(&self, generation: RunGeneration) -> Vec<ContextId> {
        let book = self.inner.lock().unwrap();
        book.reported
            .iter()
            .filter(|(g, _)| *g == generation)
            .map(|(_, id)| *id)
            .collect()
    }

    fn script_for(&self, id: ContextId) -> ContextScript {
        self.inner
            .lock()
            .unwrap()
            .scripts
            .get(&id)
            .cloned()
            .unwrap_or_else(|| ContextScript::completes(10.0, 10))
    }

    fn record_launch(&self, generation: RunGeneration, id: ContextId) {
        self.inner.lock().unwrap().launched.push((generation, id, Instant::now()));
    }

    fn record_start(&self, generation: RunGeneration, id: ContextId, urls: Vec<String>) {
        self.inner.lock().unwrap().started.push((generation, id, urls));
    }

    fn record_report(&self, generation: RunGeneration, id: ContextId) {
        self.inner.lock().unwrap().reported.push((generation, id));
    }
}

/// Launcher whose contexts follow the scripts of a `ScriptBook`
pub struct ScriptedLauncher {
    book: ScriptBook,
}

impl ScriptedLauncher {
    pub fn new(book: ScriptBook) -> Self {
        Self { book }
    }
}

#[async_trait]
impl ContextLauncher for ScriptedLauncher {
    async fn launch(&self, handle: ExecutionContextHandle, link: ContextLink) -> OrchestratorResult<CommandSender> {
        let (tx, rx) = mpsc::unbounded_channel();
        let script = self.book.script_for(handle.id);
        self.book.record_launch(link.generation(), handle.id);

        tokio::spawn(run_script(link, rx, script, self.book.clone()));
        Ok(tx)
    }
}

async fn run_script(link: ContextLink, mut commands: CommandReceiver, script: ContextScript, book: ScriptBook) {
    if link.signal_ready().is_err() {
        return;
    }

    let command = tokio::select! {
        Some(value) = commands.recv() => value,
        _ = link.closed() => return,
        else => return,
    };
    let Ok(ContextMessage::StartTest(start)) = ContextMessage::from_value(&command) else {
        return;
    };
    book.record_start(link.generation(), start.context_id, start.urls.clone());

    if script.silent {
        link.closed().await;
        return;
    }

    tokio::select! {
        _ = tokio::time::sleep(script.report_after) => {}
        _ = link.closed() => return,
    }

    if script.malformed_first {
        let _ = link.post_raw(json!({ "type": "TEST_COMPLETE", "contextId": start.context_id }));
    }

    let timings = start
        .urls
        .iter()
        .map(|url| ResourceTiming::new(url.clone(), 0.0, script.total_duration))
        .collect();
    let completion = ContextMessage::complete(start.context_id, timings, script.total_duration);
    if link.post(&completion).is_ok() {
        book.record_report(link.generation(), start.context_id);
    }

    if script.duplicate {
        let again = ContextMessage::complete(start.context_id, vec![], script.total_duration + 1000.0);
        let _ = link.post(&again);
    }
}

/// Builder pattern for creating test orchestrators with sensible defaults
pub struct OrchestratorBuilder {
    book: ScriptBook,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            book: ScriptBook::default(),
        }
    }

    /// Script the first run
    pub fn with_run(self, run: &[(u32, f64)]) -> Self {
        self.book.script_run(run);
        self
    }

    pub fn with_script(self, id: u32, script: ContextScript) -> Self {
        self.book.script(id, script);
        self
    }

    pub fn build(self) -> (Orchestrator<ScriptedLauncher>, ScriptBook) {
        let orchestrator = Orchestrator::new(ScriptedLauncher::new(self.book.clone()));
        (orchestrator, self.book)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper functions for common test operations
pub struct TestHelpers;

impl TestHelpers {
    /// Drive the active run to its outcome
    pub async fn run_to_outcome<L: ContextLauncher>(orchestrator: &mut Orchestrator<L>) -> RunOutcome {
        tokio::time::timeout(RUN_TIMEOUT, orchestrator.await_outcome())
            .await
            .expect("run did not finish in time")
            .expect("no active run")
    }

    /// Drive the active run for `duration` without expecting it to finish
    pub async fn drive_for<L: ContextLauncher>(orchestrator: &mut Orchestrator<L>, duration: Duration) {
        let outcome = tokio::time::timeout(duration, orchestrator.await_outcome()).await;
        assert!(outcome.is_err(), "run finished early: {outcome:?}");
    }

    pub fn assert_statistics(statistics: RunningStatistics, completed_run_count: u64, average_ms: f64) {
        assert_eq!(statistics.completed_run_count, completed_run_count);
        assert!(
            (statistics.cumulative_average_ms - average_ms).abs() < 0.01,
            "expected average {average_ms}, got {}",
            statistics.cumulative_average_ms
        );
    }
}
