//! Per-run transport between the harness and its execution contexts

use serde_json::Value;
use tokio::sync::mpsc;

use crate::errors::{SharedError, SharedResult};
use crate::messages::context::ContextMessage;
use crate::types::{ContextId, RunGeneration};

/// Harness → context command channel (raw JSON messages)
pub type CommandSender = mpsc::UnboundedSender<Value>;
pub type CommandReceiver = mpsc::UnboundedReceiver<Value>;

/// What a context can tell the harness
#[derive(Debug, Clone, PartialEq)]
pub enum ContextSignal {
    /// The context finished loading and can accept a start command
    Ready,
    /// A protocol message, left unparsed until the collector validates it
    Message(Value),
}

/// A context signal stamped with the run it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEnvelope {
    pub generation: RunGeneration,
    pub context_id: ContextId,
    pub signal: ContextSignal,
}

/// Sending half handed to a context at launch
///
/// The link stamps every envelope with the generation and id it was created
/// with, so a context can only ever speak for itself in its own run. Once the
/// run is finalized or cancelled the receiving side is dropped and `post`
/// starts failing with `ChannelClosed`.
#[derive(Debug, Clone)]
pub struct ContextLink {
    generation: RunGeneration,
    context_id: ContextId,
    tx: mpsc::UnboundedSender<ContextEnvelope>,
}

impl ContextLink {
    pub fn new(
        generation: RunGeneration,
        context_id: ContextId,
        tx: mpsc::UnboundedSender<ContextEnvelope>,
    ) -> Self {
        Self {
            generation,
            context_id,
            tx,
        }
    }

    pub fn generation(&self) -> RunGeneration {
        self.generation
    }

    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    /// Announce readiness to receive the start command
    pub fn signal_ready(&self) -> SharedResult<()> {
        self.send(ContextSignal::Ready)
    }

    /// Post a protocol message to the harness
    pub fn post(&self, message: &ContextMessage) -> SharedResult<()> {
        let value = message.to_value()?;
        self.send(ContextSignal::Message(value))
    }

    /// Post an arbitrary JSON payload, valid or not
    pub fn post_raw(&self, value: Value) -> SharedResult<()> {
        self.send(ContextSignal::Message(value))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the harness stopped listening to this run
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    fn send(&self, signal: ContextSignal) -> SharedResult<()> {
        self.tx
            .send(ContextEnvelope {
                generation: self.generation,
                context_id: self.context_id,
                signal,
            })
            .map_err(|_| SharedError::ChannelClosed {
                channel: format!("{} of {}", self.context_id, self.generation),
            })
    }
}
