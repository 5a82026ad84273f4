//! Trait definitions with mockall annotations for testing
//!
//! The launcher is the seam between the orchestration core and whatever
//! actually hosts an execution context. The core never knows how a context
//! runs; it only hands over a `ContextLink` and keeps the returned command
//! sender in its registry.

use shared::{CommandSender, ContextLink, ExecutionContextHandle};

use crate::error::OrchestratorResult;

/// Brings execution contexts into existence
#[mockall::automock]
#[async_trait::async_trait]
pub trait ContextLauncher: Send + Sync {
    /// Launch a context for a freshly spawned handle
    ///
    /// # Parameters
    /// - `handle`: identity and spawn time of the new context
    /// - `link`: the context's channel back to the orchestrator; the context
    ///   must send `Ready` through it once it can accept a start command
    ///
    /// # Returns
    /// The sender the orchestrator uses to deliver commands to the context
    async fn launch(&self, handle: ExecutionContextHandle, link: ContextLink) -> OrchestratorResult<CommandSender>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that mock traits can be instantiated
    #[tokio::test]
    async fn test_mock_trait_instantiation() {
        let mut launcher = MockContextLauncher::new();
        launcher.expect_launch().never();
        launcher.checkpoint();
    }
}
