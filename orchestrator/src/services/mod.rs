//! Service implementations
//!
//! Real collaborators of the orchestrator: the in-process context launcher
//! and the configuration catalog.

pub mod catalog;
pub mod launcher;

#[cfg(test)]
mod tests;

pub use catalog::{parse_context_count, parse_url_list, TestSet, UrlCatalog};
pub use launcher::TaskLauncher;
