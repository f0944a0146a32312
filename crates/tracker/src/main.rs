// crates/tracker/src/main.rs
//! inbox-ingest binary.
//!
//! Watches a story-inbox ingestion run from the terminal: reconciles with
//! the backend first (so an in-flight run started elsewhere is adopted),
//! optionally launches a new run, then follows the job to its terminal
//! state with a spinner and a live elapsed clock.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use story_inbox_api::{ApiConfig, HttpIngestApi, IngestApi};
use story_inbox_types::{IngestConfig, Job, JobStatus};
use story_inbox_tracker::{
    completion_notice, format_elapsed, running_advisory, IngestTracker, Phase, TrackerConfig,
    TrackerEvent,
};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "inbox-ingest",
    about = "Start and watch story-inbox ingestion runs",
    version
)]
struct Args {
    /// Backend base URL. Defaults to STORY_INBOX_API_BASE or
    /// http://localhost:8000.
    #[arg(long)]
    api_base: Option<String>,

    /// Launch a new run when none is in flight (otherwise only adopt).
    #[arg(long)]
    start: bool,

    /// Similarity threshold in (0, 1]. Seeded from the backend's saved
    /// settings when omitted.
    #[arg(long)]
    threshold: Option<f64>,

    /// Clustering time window in days (>= 1). Seeded from the backend's
    /// saved settings when omitted.
    #[arg(long)]
    window_days: Option<u32>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

/// Turn CLI flags into a launch config. `None` defers seeding to the
/// backend's saved settings. The launch contract expects validated input,
/// so out-of-range flags are rejected here.
fn resolve_config(args: &Args) -> Result<Option<IngestConfig>> {
    if args.threshold.is_none() && args.window_days.is_none() {
        return Ok(None);
    }
    let defaults = IngestConfig::default();
    let config = IngestConfig {
        cluster_similarity_threshold: args
            .threshold
            .unwrap_or(defaults.cluster_similarity_threshold),
        cluster_time_window_days: args
            .window_days
            .unwrap_or(defaults.cluster_time_window_days),
    };
    if !(config.cluster_similarity_threshold > 0.0 && config.cluster_similarity_threshold <= 1.0)
    {
        bail!("--threshold must be in (0, 1]");
    }
    if config.cluster_time_window_days < 1 {
        bail!("--window-days must be >= 1");
    }
    Ok(Some(config))
}

/// Print a terminal record adopted from a previous session. Returns the
/// process exit code.
fn report_terminal(job: &Job) -> i32 {
    match job.status {
        JobStatus::Completed => {
            println!(
                "{}",
                completion_notice(job.inserted.unwrap_or(0), job.skipped.unwrap_or(0))
            );
            0
        }
        JobStatus::Failed => {
            eprintln!(
                "Ingestion failed: {}",
                job.error.as_deref().unwrap_or("Ingestion failed unexpectedly.")
            );
            1
        }
        JobStatus::Running => 0,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .compact()
        .init();

    let args = Args::parse();
    let launch_config = resolve_config(&args)?;

    let mut api_config = ApiConfig::default();
    if let Some(base) = args.api_base.clone() {
        api_config.base_url = base;
    }
    api_config.timeout = Duration::from_secs(args.timeout_secs);

    let api: Arc<dyn IngestApi> = Arc::new(HttpIngestApi::new(api_config)?);
    let tracker = IngestTracker::new(api, TrackerConfig::default());
    let mut events = tracker.subscribe_events();

    tracker.reconcile().await;

    match tracker.phase() {
        Phase::Running => {
            eprintln!("Adopted in-flight ingestion run.");
        }
        _ if args.start => {
            tracker.start(launch_config).await;
        }
        Phase::Completed | Phase::Failed => {
            let job = tracker.snapshot().expect("terminal phase implies a record");
            let code = report_terminal(&job);
            tracker.shutdown();
            std::process::exit(code);
        }
        Phase::Idle | Phase::Starting => {
            eprintln!("No ingestion run in progress (pass --start to launch one).");
            tracker.shutdown();
            return Ok(());
        }
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").expect("static template"));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let mut elapsed = tracker.elapsed();
    let code = loop {
        tokio::select! {
            changed = elapsed.changed() => {
                if changed.is_ok() {
                    let e = *elapsed.borrow();
                    spinner.set_message(format!(
                        "Ingestion running ({}) - {}",
                        format_elapsed(e.seconds),
                        running_advisory(e.stalled)
                    ));
                }
            }
            event = events.recv() => match event {
                Ok(TrackerEvent::Started { job_id }) => {
                    spinner.println(format!("Ingestion started (job {job_id})."));
                }
                Ok(TrackerEvent::AlreadyRunning { job_id }) => {
                    spinner.println(format!("Ingestion already running, following job {job_id}."));
                }
                Ok(TrackerEvent::Completed { inserted, skipped, .. }) => {
                    spinner.finish_and_clear();
                    println!("{}", completion_notice(inserted, skipped));
                    break 0;
                }
                Ok(TrackerEvent::Failed { error, .. }) => {
                    spinner.finish_and_clear();
                    eprintln!("Ingestion failed: {error}");
                    break 1;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break 1,
            }
        }
    };

    tracker.shutdown();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
