//! Main entry point for the harness binary
//!
//! Resolves a run configuration from the command line and the URL catalog,
//! then drives one or more runs with real HTTP-fetching contexts.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;

use context::HttpFetcher;
use orchestrator::{
    report,
    services::{parse_context_count, parse_url_list, TaskLauncher, UrlCatalog},
    Orchestrator, OrchestratorError, OrchestratorResult, RunOutcome,
};
use shared::{logging, process_debug, process_info, process_warn, ProcessId, TestConfiguration};

/// Environment variable naming the default catalog file
const CATALOG_ENV: &str = "HARNESS_CATALOG";

/// Measures resource-load contention across concurrent execution contexts
#[derive(Parser, Debug)]
#[command(name = "orchestrator")]
#[command(about = "Runs N concurrent contexts fetching the same resources and reports load timings")]
pub struct Args {
    /// Number of execution contexts (non-numeric or zero falls back to 1)
    #[arg(long)]
    pub contexts: Option<String>,

    /// Resource URL to load (repeatable; overrides file, preset and catalog URLs)
    #[arg(long = "url")]
    pub urls: Vec<String>,

    /// File with one resource URL per line
    #[arg(long)]
    pub urls_file: Option<PathBuf>,

    /// Named preset from the catalog
    #[arg(long)]
    pub preset: Option<String>,

    /// URL catalog JSON file (defaults to $HARNESS_CATALOG)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Delay between successive context spawns in milliseconds
    #[arg(long, default_value = "0")]
    pub delay_ms: u64,

    /// Number of runs to execute back to back
    #[arg(long, default_value = "1")]
    pub runs: u32,

    /// Cancel a run that has not completed after this many milliseconds
    #[arg(long)]
    pub run_timeout_ms: Option<u64>,

    /// Timeout of each individual resource request in milliseconds
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,

    /// Print each finished run as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// List the catalog presets and exit
    #[arg(long)]
    pub list_presets: bool,
}

#[tokio::main]
async fn main() -> OrchestratorResult<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    ProcessId::init_harness();
    logging::init_tracing_with_level(Some(&args.log_level));

    let catalog = load_catalog(&args).await?;

    if args.list_presets {
        for key in catalog.preset_keys() {
            let preset = catalog.preset(key)?;
            println!("{key:<16} {} ({} urls)", preset.name, preset.urls.len());
        }
        return Ok(());
    }

    let config = resolve_configuration(&args, &catalog).await?;
    logging::log_startup(
        ProcessId::current(),
        &format!(
            "harness: {} runs of {} contexts over {} resources",
            args.runs,
            config.context_count,
            config.resource_urls.len()
        ),
    );

    let fetcher = HttpFetcher::new().with_request_timeout(args.request_timeout_ms.map(Duration::from_millis));
    let mut orchestrator = Orchestrator::new(TaskLauncher::new(fetcher));

    for run_index in 1..=args.runs {
        let generation = orchestrator.start(config.clone())?;
        process_debug!(ProcessId::current(), "▶️ Run {}/{} started as {}", run_index, args.runs, generation);

        let outcome = tokio::select! {
            outcome = orchestrator.await_outcome() => outcome,
            _ = run_deadline(args.run_timeout_ms) => {
                process_warn!(ProcessId::current(), "⏰ {} did not complete in time, cancelling", generation);
                orchestrator.cancel();
                continue;
            }
            _ = signal::ctrl_c() => {
                logging::log_shutdown(ProcessId::current(), "Received Ctrl+C signal");
                orchestrator.cancel();
                break;
            }
        };

        if let Some(RunOutcome::Completed { result, statistics }) = outcome {
            if args.json {
                println!("{}", report::to_json(&result, &statistics)?);
            } else {
                println!("{}\n{}\n", report::render_run(&result), report::render_statistics(&statistics));
            }
        }
    }

    process_info!(ProcessId::current(), "📊 {}", report::render_statistics(&orchestrator.statistics()));
    logging::log_success(ProcessId::current(), "Harness stopped gracefully");
    Ok(())
}

/// Catalog from `--catalog`, then `$HARNESS_CATALOG`, else an empty one
async fn load_catalog(args: &Args) -> OrchestratorResult<UrlCatalog> {
    let path = args
        .catalog
        .clone()
        .or_else(|| std::env::var(CATALOG_ENV).ok().map(PathBuf::from));

    match path {
        Some(path) => UrlCatalog::load(path).await,
        None => Ok(UrlCatalog::default()),
    }
}

/// Build the run configuration; explicit URLs beat a URL file, which beats a preset
async fn resolve_configuration(args: &Args, catalog: &UrlCatalog) -> OrchestratorResult<TestConfiguration> {
    let urls = if !args.urls.is_empty() {
        args.urls.clone()
    } else if let Some(path) = &args.urls_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| OrchestratorError::CatalogError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        parse_url_list(&text)
    } else {
        catalog.urls_for(args.preset.as_deref())?
    };

    let context_count = args
        .contexts
        .as_deref()
        .map(parse_context_count)
        .unwrap_or(catalog.default_context_count);

    Ok(TestConfiguration::new(context_count, urls).with_spawn_delay_ms(args.delay_ms))
}

/// Resolves after the run timeout, or never when none is set
async fn run_deadline(timeout_ms: Option<u64>) {
    match timeout_ms {
        Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        None => std::future::pending().await,
    }
}
