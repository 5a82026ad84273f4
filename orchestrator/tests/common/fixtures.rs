//! Test fixtures and data for orchestrator tests
//!
//! This module provides consistent test data and fixtures used across all test suites.

#![allow(dead_code)]

use shared::TestConfiguration;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Resources every scripted context pretends to load
    pub const URL_REACT: &'static str = "https://cdn.example/react.production.min.js";
    pub const URL_LODASH: &'static str = "https://cdn.example/lodash.min.js";
    pub const URL_CHART: &'static str = "https://cdn.example/chart.umd.js";

    pub const DEFAULT_CONTEXT_COUNT: u32 = 3;

    pub fn urls() -> Vec<String> {
        vec![
            Self::URL_REACT.to_string(),
            Self::URL_LODASH.to_string(),
            Self::URL_CHART.to_string(),
        ]
    }

    pub fn configuration(context_count: u32) -> TestConfiguration {
        TestConfiguration::new(context_count, Self::urls())
    }

    /// First documented run: completions arrive 2, 0, 1; mean 108.33ms
    pub fn first_run() -> Vec<(u32, f64)> {
        vec![(2, 120.0), (0, 95.0), (1, 110.0)]
    }

    /// Second documented run: mean 90.0ms
    pub fn second_run() -> Vec<(u32, f64)> {
        vec![(1, 90.0), (2, 95.0), (0, 85.0)]
    }

    pub const FIRST_RUN_MEAN: f64 = 108.333_333;
    pub const AVERAGE_AFTER_SECOND_RUN: f64 = 99.166_666;
}
