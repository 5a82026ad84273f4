//! Execution context runtime
//!
//! One context = one tokio task. The task announces readiness over its
//! `ContextLink`, waits for `START_TEST`, loads every resource concurrently and
//! answers with a single `TEST_COMPLETE`. If the harness tears the run down at
//! any point the task exits without reporting.

use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use shared::{
    process_debug, process_warn, CommandReceiver, CommandSender, ContextLink, ContextMessage, ProcessId,
    ResourceTiming, StartCommand,
};

use crate::error::{WorkloadError, WorkloadResult};
use crate::traits::ResourceFetcher;

/// An isolated unit running the resource-fetch workload
pub struct ExecutionContext<F: ResourceFetcher> {
    fetcher: Arc<F>,
    origin: Instant,
}

impl<F> ExecutionContext<F>
where
    F: ResourceFetcher + 'static,
{
    /// Create a context; its clock starts now
    pub fn new(fetcher: Arc<F>) -> Self {
        Self {
            fetcher,
            origin: Instant::now(),
        }
    }

    /// Spawn the context task
    ///
    /// Returns the command sender the harness uses to reach this context, and
    /// the task handle.
    pub fn spawn(self, link: ContextLink) -> (CommandSender, JoinHandle<WorkloadResult<()>>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(link, command_rx));
        (command_tx, task)
    }

    /// Drive the context to completion on the current task
    pub async fn run(self, link: ContextLink, mut commands: CommandReceiver) -> WorkloadResult<()> {
        let process = ProcessId::Context(link.context_id());

        link.signal_ready()?;
        process_debug!(process, "📡 Ready for {}", link.generation());

        let command = tokio::select! {
            command = Self::wait_for_start(&mut commands, process) => command?,
            _ = link.closed() => {
                process_debug!(process, "🛑 Run closed before start command");
                return Ok(());
            }
        };

        if command.context_id != link.context_id() {
            process_warn!(
                process,
                "⚠️ Start command addressed to {} but received by {}",
                command.context_id,
                link.context_id()
            );
        }

        process_debug!(process, "🚀 Loading {} resources", command.urls.len());
        let started = self.elapsed_ms();

        let timings = tokio::select! {
            timings = self.fetch_all(&command.urls, process) => timings,
            _ = link.closed() => {
                process_debug!(process, "🛑 Run closed while loading resources");
                return Ok(());
            }
        };

        let total_duration = self.elapsed_ms() - started;
        process_debug!(process, "✅ Loaded {} resources in {:.2}ms", timings.len(), total_duration);

        link.post(&ContextMessage::complete(command.context_id, timings, total_duration))?;
        Ok(())
    }

    /// Wait for the first well-formed START_TEST, skipping anything else
    async fn wait_for_start(commands: &mut CommandReceiver, process: ProcessId) -> WorkloadResult<StartCommand> {
        while let Some(value) = commands.recv().await {
            match ContextMessage::from_value(&value) {
                Ok(ContextMessage::StartTest(command)) => return Ok(command),
                Ok(other) => {
                    process_warn!(process, "⚠️ Ignoring unexpected {} message", other.kind());
                }
                Err(e) => {
                    process_warn!(process, "⚠️ Ignoring malformed command: {}", e);
                }
            }
        }

        Err(WorkloadError::protocol("command channel closed before START_TEST"))
    }

    /// Load all resources concurrently, timing each one
    ///
    /// A failed load is still timed; the failure is only logged.
    async fn fetch_all(&self, urls: &[String], process: ProcessId) -> Vec<ResourceTiming> {
        let loads = urls.iter().map(|url| async move {
            let start_time = self.elapsed_ms();
            if let Err(e) = self.fetcher.fetch(url).await {
                process_warn!(process, "⚠️ {}", e);
            }
            ResourceTiming::new(url.clone(), start_time, self.elapsed_ms())
        });

        join_all(loads).await
    }

    /// Milliseconds since this context came into existence
    fn elapsed_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}
