//! Harness ↔ context protocol messages
//!
//! Wire shape is JSON with a `type` discriminator:
//! `START_TEST` flows harness → context, `TEST_COMPLETE` flows back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{SharedError, SharedResult};
use crate::types::{ContextId, ContextResult, ResourceTiming};

/// Command telling a ready context to fetch the listed resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCommand {
    pub context_id: ContextId,
    pub urls: Vec<String>,
}

/// A context's single report once its workload finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEvent {
    pub context_id: ContextId,
    /// Passed through untouched; only the array shape is checked
    pub timings: Vec<Value>,
    pub total_duration: f64,
}

impl From<CompletionEvent> for ContextResult {
    fn from(event: CompletionEvent) -> Self {
        ContextResult {
            context_id: event.context_id,
            timings: event.timings,
            total_duration: event.total_duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContextMessage {
    #[serde(rename = "START_TEST")]
    StartTest(StartCommand),

    #[serde(rename = "TEST_COMPLETE")]
    TestComplete(CompletionEvent),
}

impl ContextMessage {
    pub fn start(context_id: ContextId, urls: Vec<String>) -> Self {
        ContextMessage::StartTest(StartCommand { context_id, urls })
    }

    pub fn complete(context_id: ContextId, timings: Vec<ResourceTiming>, total_duration: f64) -> Self {
        ContextMessage::TestComplete(CompletionEvent {
            context_id,
            timings: timings.into_iter().map(Value::from).collect(),
            total_duration,
        })
    }

    pub fn to_value(&self) -> SharedResult<Value> {
        serde_json::to_value(self).map_err(|e| SharedError::SerializationError {
            message: e.to_string(),
        })
    }

    pub fn from_value(value: &Value) -> SharedResult<Self> {
        ContextMessage::deserialize(value).map_err(|e| SharedError::DeserializationError {
            message: e.to_string(),
        })
    }

    /// Wire name of the message type
    pub fn kind(&self) -> &'static str {
        match self {
            ContextMessage::StartTest(_) => "START_TEST",
            ContextMessage::TestComplete(_) => "TEST_COMPLETE",
        }
    }
}
