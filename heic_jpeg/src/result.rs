//! Per-task outcomes and the aggregate batch result.

use crate::planner::SkippedSource;
use serde::Serialize;
use shared_utils::common_utils::file_base_name;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Converted,
    Failed(String),
    /// Never started because the batch was cancelled.
    Cancelled,
}

/// Produced exactly once per task.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub source: PathBuf,
    pub status: OutcomeStatus,
    pub elapsed: Duration,
}

impl ConversionOutcome {
    pub fn converted(source: PathBuf, elapsed: Duration) -> Self {
        Self {
            source,
            status: OutcomeStatus::Converted,
            elapsed,
        }
    }

    pub fn failed(source: PathBuf, reason: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            source,
            status: OutcomeStatus::Failed(reason.into()),
            elapsed,
        }
    }

    pub fn cancelled(source: PathBuf) -> Self {
        Self {
            source,
            status: OutcomeStatus::Cancelled,
            elapsed: Duration::ZERO,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == OutcomeStatus::Converted
    }

    pub fn file_name(&self) -> String {
        file_base_name(&self.source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Completed,
    Cancelled,
    Error,
}

impl BatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchStatus::Completed => "completed",
            BatchStatus::Cancelled => "cancelled",
            BatchStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub file_name: String,
    pub reason: String,
}

/// Terminal summary of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub status: BatchStatus,
    pub message: Option<String>,
    pub files_converted: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
    pub files_cancelled: usize,
    pub failed_file_names: Vec<String>,
    pub failures: Vec<FailedFile>,
    #[serde(rename = "total_time_secs", serialize_with = "as_secs_f64")]
    pub total_elapsed_time: Duration,
    #[serde(rename = "avg_time_per_file_secs", serialize_with = "as_secs_f64")]
    pub average_per_file_time: Duration,
}

fn as_secs_f64<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl BatchResult {
    /// A batch rejected before any task was planned.
    pub fn rejected(message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            status: BatchStatus::Error,
            message: Some(message.into()),
            ..Self::empty(elapsed)
        }
    }

    /// Planning produced no work; no worker pool was started.
    pub fn nothing_to_do(skipped: usize, elapsed: Duration) -> Self {
        Self {
            message: Some("No new files to convert.".to_string()),
            files_skipped: skipped,
            ..Self::empty(elapsed)
        }
    }

    fn empty(elapsed: Duration) -> Self {
        Self {
            status: BatchStatus::Completed,
            message: None,
            files_converted: 0,
            files_failed: 0,
            files_skipped: 0,
            files_cancelled: 0,
            failed_file_names: Vec::new(),
            failures: Vec::new(),
            total_elapsed_time: elapsed,
            average_per_file_time: Duration::ZERO,
        }
    }

    pub fn files_processed(&self) -> usize {
        self.files_converted + self.files_failed + self.files_cancelled
    }

    pub fn summary_report(&self) -> shared_utils::SummaryReport<'static> {
        shared_utils::SummaryReport {
            operation: "Image → JPEG",
            status: self.status.as_str(),
            converted: self.files_converted,
            failed: self.files_failed,
            skipped: self.files_skipped,
            cancelled: self.files_cancelled,
            total_time: self.total_elapsed_time,
            average_time: self.average_per_file_time,
            failures: self
                .failures
                .iter()
                .map(|f| (f.file_name.clone(), f.reason.clone()))
                .collect(),
        }
    }
}

/// Running counters owned by the collecting loop. Workers never touch it.
#[derive(Debug, Default)]
pub struct BatchTally {
    converted: usize,
    cancelled: usize,
    failures: Vec<FailedFile>,
    processing_time: Duration,
    skipped: usize,
}

impl BatchTally {
    pub fn new(skipped: &[SkippedSource]) -> Self {
        Self {
            skipped: skipped.len(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &ConversionOutcome) {
        self.processing_time += outcome.elapsed;
        match &outcome.status {
            OutcomeStatus::Converted => self.converted += 1,
            OutcomeStatus::Failed(reason) => self.failures.push(FailedFile {
                file_name: outcome.file_name(),
                reason: reason.clone(),
            }),
            OutcomeStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.converted + self.failures.len()
    }

    /// Shapes the counters into the externally consumed result.
    pub fn into_result(self, cancelled: bool, total_elapsed: Duration) -> BatchResult {
        let attempted = self.attempted();
        let average = if attempted > 0 {
            self.processing_time / attempted as u32
        } else {
            Duration::ZERO
        };
        let status = if cancelled && self.cancelled > 0 {
            BatchStatus::Cancelled
        } else {
            BatchStatus::Completed
        };
        BatchResult {
            status,
            message: (status == BatchStatus::Cancelled)
                .then(|| format!("Cancelled with {} file(s) not started.", self.cancelled)),
            files_converted: self.converted,
            files_failed: self.failures.len(),
            files_skipped: self.skipped,
            files_cancelled: self.cancelled,
            failed_file_names: self.failures.iter().map(|f| f.file_name.clone()).collect(),
            failures: self.failures,
            total_elapsed_time: total_elapsed,
            average_per_file_time: average,
        }
    }
}
