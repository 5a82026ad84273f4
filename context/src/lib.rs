//! Execution context library for the load contention harness
//!
//! An execution context is an isolated unit that waits for a `START_TEST`
//! command, fetches every listed resource, times each load, and reports
//! exactly one `TEST_COMPLETE` back to the harness.

pub mod core;
pub mod error;
pub mod services;
pub mod traits;

// Re-export main types
pub use core::ExecutionContext;
pub use error::{WorkloadError, WorkloadResult};
pub use services::HttpFetcher;
pub use traits::{MockResourceFetcher, ResourceFetcher};
