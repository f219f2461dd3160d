//! Batch orchestration.
//!
//! `Validating → (Rejected | Planning) → (NoWork | Running) → Aggregating → Completed`
//!
//! Every planned task is queued on a fixed-size rayon pool up front. Workers
//! send their outcome over a channel; this thread blocks on that channel and
//! is the only place the aggregate counters are touched, in completion order.

use crate::config::BatchConfiguration;
use crate::error::BatchError;
use crate::formats::ensure_decoders_registered;
use crate::planner::{plan_tasks, ConversionTask, Plan};
use crate::progress::{CancellationToken, NoProgress, ProgressObserver, ProgressUpdate};
use crate::result::{BatchResult, BatchTally, ConversionOutcome};
use crate::worker::{convert_single_file, EncodeSettings};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Runs one batch without progress reporting or cancellation.
pub fn run_batch(config: &BatchConfiguration) -> BatchResult {
    run_batch_with(config, &NoProgress, &CancellationToken::new())
}

/// Runs one batch. Only precondition failures yield an `error` result; every
/// per-file problem is counted as a failure of that file.
pub fn run_batch_with(
    config: &BatchConfiguration,
    observer: &dyn ProgressObserver,
    cancel: &CancellationToken,
) -> BatchResult {
    let start = Instant::now();
    info!(
        source = %config.source_directory.display(),
        format = %config.source_format,
        workers = config.worker_count,
        quality = config.quality,
        recursive = config.recursive,
        "Batch started"
    );

    let plan = match prepare(config) {
        Ok(plan) => plan,
        Err(e) => {
            error!(error = %e, "Batch rejected");
            return BatchResult::rejected(e.to_string(), start.elapsed());
        }
    };

    if plan.tasks.is_empty() {
        info!(skipped = plan.skipped.len(), "No new files to convert");
        return BatchResult::nothing_to_do(plan.skipped.len(), start.elapsed());
    }

    let mut tally = BatchTally::new(&plan.skipped);
    let settings = EncodeSettings {
        quality: config.quality,
        resize: config.resize,
        source_format: config.source_format,
    };

    if let Err(e) = execute(
        plan.tasks,
        config.worker_count,
        settings,
        config.delete_originals,
        cancel,
        observer,
        &mut tally,
    ) {
        error!(error = %e, "Batch rejected");
        return BatchResult::rejected(e.to_string(), start.elapsed());
    }

    let result = tally.into_result(cancel.is_cancelled(), start.elapsed());
    info!(
        status = result.status.as_str(),
        converted = result.files_converted,
        failed = result.files_failed,
        skipped = result.files_skipped,
        cancelled = result.files_cancelled,
        total_secs = result.total_elapsed_time.as_secs_f64(),
        "Batch finished"
    );
    result
}

fn prepare(config: &BatchConfiguration) -> Result<Plan, BatchError> {
    config.validate()?;

    if !config.source_directory.is_dir() {
        return Err(BatchError::DirectoryNotFound(config.source_directory.clone()));
    }

    let source_root = absolute(&config.source_directory)?;
    let output_root = absolute(&config.resolved_output_directory())?;

    std::fs::create_dir_all(&output_root).map_err(|source| BatchError::OutputDirectory {
        path: output_root.clone(),
        source,
    })?;

    ensure_decoders_registered();

    // Only an output root nested below the source root can hold earlier
    // outputs that discovery would pick up again.
    let nested_output = output_root != source_root && output_root.starts_with(&source_root);
    let sources: Vec<PathBuf> = shared_utils::collect_files(
        &source_root,
        config.source_format.extensions(),
        config.recursive,
    )?
    .into_iter()
    .filter(|p| !(nested_output && p.starts_with(&output_root)))
    .collect();

    debug!(discovered = sources.len(), output = %output_root.display(), "Planning tasks");
    plan_tasks(sources, &source_root, &output_root, config.recursive)
}

fn absolute(path: &Path) -> Result<PathBuf, BatchError> {
    std::path::absolute(path).map_err(|source| BatchError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}

fn execute(
    tasks: Vec<ConversionTask>,
    worker_count: usize,
    settings: EncodeSettings,
    delete_originals: bool,
    cancel: &CancellationToken,
    observer: &dyn ProgressObserver,
    tally: &mut BatchTally,
) -> Result<(), BatchError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count)
        .thread_name(|i| format!("heic-jpeg-worker-{}", i))
        .build()
        .map_err(|e| BatchError::WorkerPool(e.to_string()))?;

    let total = tasks.len();
    let (tx, rx) = mpsc::channel::<ConversionOutcome>();
    // pending outcome handles, keyed by the dispatched source path
    let mut pending: HashSet<PathBuf> = HashSet::with_capacity(total);

    for task in tasks {
        pending.insert(task.source.clone());
        let tx = tx.clone();
        let cancel = cancel.clone();
        pool.spawn(move || {
            let outcome = if cancel.is_cancelled() {
                ConversionOutcome::cancelled(task.source.clone())
            } else {
                convert_single_file(&task, settings)
            };
            let _ = tx.send(outcome);
        });
    }
    drop(tx);

    let mut done = 0;
    while done < total {
        let outcome = match rx.recv() {
            Ok(outcome) => outcome,
            Err(_) => break,
        };
        pending.remove(&outcome.source);
        done += 1;
        collect(&outcome, delete_originals, tally);
        observer.on_progress(&ProgressUpdate::new(
            done,
            total,
            outcome.file_name(),
            outcome.succeeded(),
        ));
    }

    // A worker that vanished without reporting still counts as a failure.
    for source in pending {
        done += 1;
        error!(source = %source.display(), "Lost task outcome");
        let outcome = ConversionOutcome::failed(
            source,
            "worker exited without reporting an outcome",
            Duration::ZERO,
        );
        collect(&outcome, false, tally);
        observer.on_progress(&ProgressUpdate::new(done, total, outcome.file_name(), false));
    }

    Ok(())
}

fn collect(outcome: &ConversionOutcome, delete_originals: bool, tally: &mut BatchTally) {
    tally.record(outcome);
    if delete_originals && outcome.succeeded() {
        match std::fs::remove_file(&outcome.source) {
            Ok(()) => debug!(source = %outcome.source.display(), "Deleted original"),
            Err(e) => warn!(
                source = %outcome.source.display(),
                error = %e,
                "Failed to delete original"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::BatchStatus;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_source_directory_is_rejected() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let out = temp.path().join("out");
        let config = BatchConfiguration::new(&missing).with_output_directory(&out);

        let result = run_batch(&config);

        assert_eq!(result.status, BatchStatus::Error);
        assert!(result.message.unwrap().contains("does not exist"));
        assert!(!out.exists());
        assert!(!missing.join("ConvertedFiles").exists());
    }

    #[test]
    fn test_invalid_config_is_rejected_before_touching_disk() {
        let temp = TempDir::new().unwrap();
        let config = BatchConfiguration::new(temp.path()).with_quality(0);

        let result = run_batch(&config);

        assert_eq!(result.status, BatchStatus::Error);
        assert!(!temp.path().join("ConvertedFiles").exists());
    }

    #[test]
    fn test_empty_directory_short_circuits() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("notes.txt"), b"hi").unwrap();

        let calls = std::cell::Cell::new(0);
        let observer = |_: &ProgressUpdate| calls.set(calls.get() + 1);
        let result = run_batch_with(
            &BatchConfiguration::new(temp.path()),
            &observer,
            &CancellationToken::new(),
        );

        assert_eq!(result.status, BatchStatus::Completed);
        assert_eq!(result.files_converted, 0);
        assert_eq!(result.message.as_deref(), Some("No new files to convert."));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_outputs_inside_source_are_not_rediscovered() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("ConvertedFiles");
        fs::create_dir_all(&out).unwrap();
        image::RgbImage::new(2, 2).save(out.join("stray.png")).unwrap();

        let config = BatchConfiguration::new(temp.path())
            .with_source_format(crate::formats::SourceFormat::Png)
            .with_recursive(true);
        let result = run_batch(&config);

        assert_eq!(result.files_processed(), 0);
        assert!(!out.join("ConvertedFiles").exists());
    }
}
