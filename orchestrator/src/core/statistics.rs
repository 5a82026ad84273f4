//! Cross-run statistics
//!
//! Each completed run contributes its mean context duration to an
//! incremental running average.

use shared::RunningStatistics;

/// Folds completed runs into `RunningStatistics`
#[derive(Debug, Clone, Default)]
pub struct StatisticsAccumulator {
    current: RunningStatistics,
    history: Vec<f64>,
}

impl StatisticsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one completed run's mean into the running average
    pub fn record(&mut self, run_mean_ms: f64) -> RunningStatistics {
        let old_count = self.current.completed_run_count;
        let old_avg = self.current.cumulative_average_ms;

        self.current = RunningStatistics {
            completed_run_count: old_count + 1,
            cumulative_average_ms: (old_avg * old_count as f64 + run_mean_ms) / (old_count + 1) as f64,
        };
        self.history.push(run_mean_ms);
        self.current
    }

    /// Back to `{0, 0}` with an empty history
    pub fn reset(&mut self) {
        self.current = RunningStatistics::default();
        self.history.clear();
    }

    pub fn snapshot(&self) -> RunningStatistics {
        self.current
    }

    /// Means of every recorded run, oldest first
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Plain mean over the history, for checking the incremental figure
    pub fn recomputed_average(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_run_scenario() {
        let mut stats = StatisticsAccumulator::new();

        let first = stats.record((120.0 + 95.0 + 110.0) / 3.0);
        assert_eq!(first.completed_run_count, 1);
        assert!((first.cumulative_average_ms - 108.33).abs() < 0.01);

        let second = stats.record(90.0);
        assert_eq!(second.completed_run_count, 2);
        assert!((second.cumulative_average_ms - 99.17).abs() < 0.01);
        assert_eq!(stats.snapshot(), second);
    }

    #[test]
    fn test_incremental_matches_recomputed() {
        let mut stats = StatisticsAccumulator::new();
        let means = [12.5, 300.0, 0.0, 47.25, 1999.9, 3.0, 88.8];

        for mean in means {
            stats.record(mean);
            assert!((stats.snapshot().cumulative_average_ms - stats.recomputed_average()).abs() < 1e-9);
        }
        assert_eq!(stats.history(), &means);
        assert_eq!(stats.snapshot().completed_run_count, means.len() as u64);
    }

    #[test]
    fn test_reset_restores_zero() {
        let mut stats = StatisticsAccumulator::new();
        stats.record(42.0);
        stats.reset();

        assert_eq!(stats.snapshot(), RunningStatistics::default());
        assert!(stats.history().is_empty());
        assert_eq!(stats.recomputed_average(), 0.0);

        let after = stats.record(10.0);
        assert_eq!(after.completed_run_count, 1);
        assert_eq!(after.cumulative_average_ms, 10.0);
    }
}
