//! Read-only rendering of finished runs

use serde::Serialize;

use shared::{ContextResult, RunResult, RunningStatistics};

use crate::error::OrchestratorResult;

/// Plain-text summary of one run
pub fn render_run(result: &RunResult) -> String {
    let mut lines = vec![
        format!(
            "Run {}: {} contexts in {:.2}ms (mean context duration {:.2}ms)",
            result.generation.0,
            result.context_count(),
            result.total_duration_ms,
            result.mean_context_duration_ms()
        ),
        format!("{:<12} {:>14} {:>10}", "Context", "Duration (ms)", "Resources"),
    ];

    lines.extend(result.context_results.values().map(render_context));
    lines.join("\n")
}

fn render_context(context: &ContextResult) -> String {
    format!(
        "{:<12} {:>14.2} {:>10}",
        context.context_id.to_string(),
        context.total_duration,
        context.timings.len()
    )
}

/// One-line summary of the running statistics
pub fn render_statistics(statistics: &RunningStatistics) -> String {
    if statistics.completed_run_count == 0 {
        return "No completed runs yet".to_string();
    }

    format!(
        "Running average over {} run{}: {:.2}ms",
        statistics.completed_run_count,
        if statistics.completed_run_count == 1 { "" } else { "s" },
        statistics.cumulative_average_ms
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport<'a> {
    run: &'a RunResult,
    mean_context_duration_ms: f64,
    statistics: &'a RunningStatistics,
}

/// Pretty JSON of a run together with the statistics it produced
pub fn to_json(result: &RunResult, statistics: &RunningStatistics) -> OrchestratorResult<String> {
    let report = RunReport {
        run: result,
        mean_context_duration_ms: result.mean_context_duration_ms(),
        statistics,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::{ContextId, ResourceTiming, RunGeneration};
    use std::collections::BTreeMap;

    fn run() -> RunResult {
        let mut context_results = BTreeMap::new();
        for (id, duration, loaded) in [(2u32, 120.0, 3usize), (0, 95.0, 3), (1, 110.0, 2)] {
            context_results.insert(
                ContextId(id),
                ContextResult {
                    context_id: ContextId(id),
                    timings: (0..loaded)
                        .map(|i| ResourceTiming::new(format!("https://cdn.test/{i}.js"), 0.0, duration).into())
                        .collect(),
                    total_duration: duration,
                },
            );
        }
        let now = Utc::now();
        RunResult {
            generation: RunGeneration(1),
            context_results,
            started_at: now,
            ended_at: now,
            total_duration_ms: 131.5,
        }
    }

    #[test]
    fn test_render_run_lists_contexts_in_id_order() {
        let text = render_run(&run());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("3 contexts in 131.50ms"));
        assert!(lines[0].contains("108.33ms"));
        assert!(lines[2].starts_with("context_0"));
        assert!(lines[3].starts_with("context_1"));
        assert!(lines[4].starts_with("context_2"));
        assert!(lines[3].trim_end().ends_with('2'));
    }

    #[test]
    fn test_render_statistics() {
        assert_eq!(render_statistics(&RunningStatistics::default()), "No completed runs yet");

        let stats = RunningStatistics {
            completed_run_count: 2,
            cumulative_average_ms: 99.1666,
        };
        assert_eq!(render_statistics(&stats), "Running average over 2 runs: 99.17ms");
    }

    #[test]
    fn test_json_report_shape() {
        let stats = RunningStatistics {
            completed_run_count: 1,
            cumulative_average_ms: 108.33,
        };
        let json: serde_json::Value = serde_json::from_str(&to_json(&run(), &stats).unwrap()).unwrap();

        assert_eq!(json["statistics"]["completedRunCount"], 1);
        assert_eq!(json["run"]["generation"], 1);
        assert_eq!(json["run"]["contextResults"]["2"]["totalDuration"], 120.0);
        assert!(json["meanContextDurationMs"].as_f64().unwrap() > 108.0);
    }
}
