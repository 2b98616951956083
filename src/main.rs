//! photoclean - Photo cleaning from the command line
//!
//! Main entry point for the batch cleaner.
//!
//! # Overview
//!
//! This binary drives the library the same way an app shell would. It initializes:
//! - Configuration loading ([`ConfigManager`])
//! - Logging infrastructure (file rotation + console output)
//! - Tokio async runtime (image work runs on the blocking pool)
//! - State management ([`StateManager`]) and the [`CleaningWorkflow`]
//!
//! # Execution Flow
//!
//! 1. Load `PhotoClean Data/PhotoClean.yaml` (+ `PHOTOCLEAN_*` overrides)
//! 2. Initialize logging → logs/photoclean.<date>
//! 3. Create tokio runtime
//! 4. Load `User Settings.yaml` into state, read persistent statistics
//! 5. Analyze and clean every file given on the command line as one batch
//! 6. Write `<stem>.clean.jpg` files into the output directory (`<stem>-2.clean.jpg`
//!    and so on when two inputs share a stem)
//! 7. Log the metrics summary and shut the runtime down with a 5s timeout
//!
//! Ctrl-C cancels the batch before the next photo starts.

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use photoclean::config::DEFAULT_CONFIG_DIR;
use photoclean::metrics::Metrics;
use photoclean::models::Presentation;
use photoclean::services::{YamlStatisticsStore, cancel_pair};
use photoclean::workflow::{CleaningWorkflow, NamedPhoto};
use photoclean::{APP_NAME, ConfigManager, StateManager, VERSION};
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

fn main() -> Result<()> {
    let inputs: Vec<Utf8PathBuf> = std::env::args().skip(1).map(Utf8PathBuf::from).collect();
    if inputs.is_empty() {
        bail!("Usage: {} <photo>...", APP_NAME);
    }

    // Configuration comes first so logging can honour its settings
    let config_manager = ConfigManager::new(DEFAULT_CONFIG_DIR)?;
    let cleaner_config = config_manager.load_cleaner_config()?;

    let _log_guard = photoclean::logging::setup_logging(&cleaner_config.logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("photoclean-worker")
        .build()?;

    let state_manager = Arc::new(StateManager::new());
    let mut user_config = config_manager.load_user_config()?;
    state_manager.load_from_user_config(&user_config);

    if state_manager.read(|s| s.router.cover()) == Some(Presentation::Onboarding) {
        tracing::info!("First run, marking onboarding as completed");
        state_manager.complete_onboarding();
        user_config.user_settings.onboarding_completed = true;
        config_manager.save_user_config(&user_config)?;
    }

    let statistics = Arc::new(YamlStatisticsStore::new(config_manager.statistics_path()));
    let metrics = Arc::new(Metrics::new());
    let workflow = CleaningWorkflow::from_config(
        &cleaner_config,
        state_manager.clone(),
        statistics,
        metrics.clone(),
    );
    workflow.load_totals();

    let items = load_photos(&inputs, &workflow, &metrics);

    let (cancel_handle, cancel_token) = cancel_pair();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted - cancelling after the current photo");
            cancel_handle.cancel();
        }
    });

    let cleaned = runtime.block_on(workflow.clean_batch(&items, Some(&cancel_token)));

    let output_dir = Utf8PathBuf::from(&user_config.user_settings.output_dir);
    write_outputs(&output_dir, &cleaned)?;

    let (summary, totals) = state_manager.read(|s| (s.current_operation.clone(), s.totals));
    tracing::info!("{}", summary);
    tracing::info!(
        "All time: {} photos cleaned, {} saved",
        totals.total_cleaned,
        totals.space_saved_display()
    );
    metrics.log_summary();

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Read every input file, skipping the ones that are not decodable images.
fn load_photos(
    inputs: &[Utf8PathBuf],
    workflow: &CleaningWorkflow,
    metrics: &Metrics,
) -> Vec<NamedPhoto> {
    let mut items = Vec::with_capacity(inputs.len());

    for path in inputs {
        let name = path.file_name().unwrap_or(path.as_str()).to_string();

        let item = match fs::read(path)
            .with_context(|| format!("Failed to read {}", path))
            .and_then(|bytes| NamedPhoto::from_bytes(name.clone(), bytes).map_err(Into::into))
        {
            Ok(item) => item,
            Err(e) => {
                tracing::error!("Skipping {}: {:#}", name, e);
                metrics.record_photo_failed();
                continue;
            }
        };

        for suggestion in workflow.analyze(&item.photo) {
            tracing::info!("{}: {}", name, suggestion);
        }

        items.push(item);
    }

    items
}

fn write_outputs(output_dir: &Utf8Path, cleaned: &[NamedPhoto]) -> Result<()> {
    if !output_dir.exists() {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory: {}", output_dir))?;
    }

    let mut taken = HashSet::new();
    for item in cleaned {
        let target = output_dir.join(output_file_name(&item.name, &mut taken));

        fs::write(&target, item.photo.bytes())
            .with_context(|| format!("Failed to write {}", target))?;

        tracing::info!("Wrote {} ({} bytes)", target, item.photo.encoded_len());
    }

    Ok(())
}

/// `<stem>.clean.jpg`, or `<stem>-<n>.clean.jpg` when an earlier input of
/// the same batch already took that name.
fn output_file_name(name: &str, taken: &mut HashSet<String>) -> String {
    let stem = Utf8Path::new(name).file_stem().unwrap_or(name);

    let mut candidate = format!("{}.clean.jpg", stem);
    let mut suffix = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{}-{}.clean.jpg", stem, suffix);
        suffix += 1;
    }
    candidate
}
