//! Service implementations
//!
//! Production implementations of the context traits.

pub mod http_fetcher;

pub use http_fetcher::HttpFetcher;
