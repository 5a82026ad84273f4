//! Context trait definitions for dependency injection

use async_trait::async_trait;

use crate::error::WorkloadResult;

/// Loads one network resource to completion
///
/// The timing wrapper lives in the execution context; implementations only
/// need to return once the resource is fully loaded (or failed).
#[mockall::automock]
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch the resource and return the number of body bytes read
    async fn fetch(&self, url: &str) -> WorkloadResult<u64>;
}
