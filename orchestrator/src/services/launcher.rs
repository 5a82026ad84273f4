//! In-process context launcher
//!
//! Every context runs as its own tokio task. A small watcher task logs how
//! the context ended so a failed workload never goes unnoticed.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;

use context::{ExecutionContext, ResourceFetcher, WorkloadResult};
use shared::{process_debug, process_error, process_warn, CommandSender, ContextId, ContextLink, ExecutionContextHandle, ProcessId};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::ContextLauncher;

/// Launches `ExecutionContext` tasks that share one resource fetcher
pub struct TaskLauncher<F: ResourceFetcher + 'static> {
    fetcher: Arc<F>,
}

impl<F: ResourceFetcher + 'static> TaskLauncher<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
        }
    }

    async fn watch(context_id: ContextId, task: JoinHandle<WorkloadResult<()>>) {
        let process = ProcessId::Context(context_id);
        match task.await {
            Ok(Ok(())) => process_debug!(process, "👋 Context task finished"),
            Ok(Err(e)) => process_warn!(process, "⚠️ Context task ended with error: {}", e),
            Err(e) if e.is_cancelled() => process_debug!(process, "🛑 Context task aborted"),
            Err(e) => process_error!(process, "💥 Context task panicked: {}", e),
        }
    }
}

#[async_trait]
impl<F: ResourceFetcher + 'static> ContextLauncher for TaskLauncher<F> {
    async fn launch(&self, handle: ExecutionContextHandle, link: ContextLink) -> OrchestratorResult<CommandSender> {
        if link.context_id() != handle.id {
            return Err(OrchestratorError::ContextLaunchFailed {
                context_id: handle.id,
                reason: format!("link belongs to {}", link.context_id()),
            });
        }

        let (commands, task) = ExecutionContext::new(self.fetcher.clone()).spawn(link);
        tokio::spawn(Self::watch(handle.id, task));

        process_debug!(ProcessId::current(), "🧵 Launched {} task", handle.id);
        Ok(commands)
    }
}
