//! Shared types for the load contention harness
//!
//! Contains the run data model, the harness ↔ context message protocol,
//! and the logging setup used by every crate in the workspace.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

pub use messages::{
    // Protocol messages
    CompletionEvent, ContextMessage, StartCommand,

    // Per-run transport
    CommandReceiver, CommandSender, ContextEnvelope, ContextLink, ContextSignal,
};
