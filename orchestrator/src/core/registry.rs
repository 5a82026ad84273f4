//! Live contexts of the active run, keyed by id

use std::collections::{BTreeMap, BTreeSet};

use shared::{CommandSender, ContextId, ContextMessage, ExecutionContextHandle};

use crate::error::{OrchestratorError, OrchestratorResult};

/// A launched context and the channel that reaches it
#[derive(Debug)]
pub struct LiveContext {
    pub handle: ExecutionContextHandle,
    pub commands: CommandSender,
    pub started: bool,
}

/// Registry of the contexts launched for one run
#[derive(Debug, Default)]
pub struct ContextRegistry {
    contexts: BTreeMap<ContextId, LiveContext>,
    /// Ready signals that beat their context's registration
    deferred_ready: BTreeSet<ContextId>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a launched context, replacing any stale entry for the same id
    pub fn register(&mut self, handle: ExecutionContextHandle, commands: CommandSender) -> Option<LiveContext> {
        self.contexts.insert(
            handle.id,
            LiveContext {
                handle,
                commands,
                started: false,
            },
        )
    }

    /// Remember a readiness signal for a context that is not registered yet
    pub fn defer_ready(&mut self, context_id: ContextId) {
        self.deferred_ready.insert(context_id);
    }

    /// Take a deferred readiness signal, if one was queued for this id
    pub fn take_deferred_ready(&mut self, context_id: ContextId) -> bool {
        self.deferred_ready.remove(&context_id)
    }

    pub fn get(&self, context_id: ContextId) -> Option<&LiveContext> {
        self.contexts.get(&context_id)
    }

    /// Send a message to the context registered under `context_id`
    pub fn send(&mut self, context_id: ContextId, message: &ContextMessage) -> OrchestratorResult<()> {
        let live = self
            .contexts
            .get_mut(&context_id)
            .ok_or_else(|| OrchestratorError::CommandDeliveryFailed {
                context_id,
                reason: "context is not registered".to_string(),
            })?;

        let payload = message.to_value()?;
        live.commands
            .send(payload)
            .map_err(|_| OrchestratorError::CommandDeliveryFailed {
                context_id,
                reason: "command channel closed".to_string(),
            })?;

        if matches!(message, ContextMessage::StartTest(_)) {
            live.started = true;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ContextId> + '_ {
        self.contexts.keys().copied()
    }

    /// Drop every command sender; contexts see their channel close
    pub fn clear(&mut self) {
        self.contexts.clear();
        self.deferred_ready.clear();
    }
}
