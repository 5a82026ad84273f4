//! Message types for harness ↔ execution context communication
//!
//! - `context`: the JSON protocol spoken with every execution context
//! - `link`: per-run transport envelopes stamped with the run generation

pub mod context;
pub mod link;

pub use context::{CompletionEvent, ContextMessage, StartCommand};
pub use link::{CommandReceiver, CommandSender, ContextEnvelope, ContextLink, ContextSignal};
