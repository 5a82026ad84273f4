//! Core context logic
//!
//! The execution context state machine: ready → started → complete.

pub mod runtime;

pub use runtime::ExecutionContext;
