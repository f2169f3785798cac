//! Sync bookkeeping enums shared by the workers and the storage layer.

use serde::{Deserialize, Serialize};

/// One per-entity data source tracked in `sync_status`.
///
/// Each variant maps to a `last_<source>_sync` timestamp column and is the
/// value passed to the `get_apps_for_sync` scheduling predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncSource {
    Steamspy,
    Storefront,
    Reviews,
    Histogram,
    PageCreation,
    Price,
}

impl SyncSource {
    pub const ALL: [SyncSource; 6] = [
        SyncSource::Steamspy,
        SyncSource::Storefront,
        SyncSource::Reviews,
        SyncSource::Histogram,
        SyncSource::PageCreation,
        SyncSource::Price,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncSource::Steamspy => "steamspy",
            SyncSource::Storefront => "storefront",
            SyncSource::Reviews => "reviews",
            SyncSource::Histogram => "histogram",
            SyncSource::PageCreation => "page_creation",
            SyncSource::Price => "price",
        }
    }
}

impl std::fmt::Display for SyncSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of worker execution recorded in `sync_jobs.job_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Applist,
    Steamspy,
    Storefront,
    Price,
    Reviews,
    Histogram,
    PageCreation,
    RefreshViews,
}

impl JobType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::Applist => "applist",
            JobType::Steamspy => "steamspy",
            JobType::Storefront => "storefront",
            JobType::Price => "price",
            JobType::Reviews => "reviews",
            JobType::Histogram => "histogram",
            JobType::PageCreation => "page_creation",
            JobType::RefreshViews => "refresh_views",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a `sync_jobs` row: created `Running`, finalized exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::CompletedWithErrors => "completed_with_errors",
            JobStatus::Failed => "failed",
        }
    }

    /// Parses the textual column value. Returns `None` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "completed_with_errors" => Some(JobStatus::CompletedWithErrors),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run item counters written to `sync_jobs` when a job is finalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounters {
    pub processed: i32,
    pub succeeded: i32,
    pub failed: i32,
    pub created: i32,
    pub updated: i32,
}

impl SyncCounters {
    pub fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.failed += 1;
    }

    /// Counts a whole group (e.g. one upstream page) at once.
    pub fn record_many(&mut self, succeeded: usize, failed: usize) {
        let succeeded = i32::try_from(succeeded).unwrap_or(i32::MAX);
        let failed = i32::try_from(failed).unwrap_or(i32::MAX);
        self.processed = self.processed.saturating_add(succeeded).saturating_add(failed);
        self.succeeded = self.succeeded.saturating_add(succeeded);
        self.failed = self.failed.saturating_add(failed);
    }
}

/// Terminal state handed to storage when a job finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCompletion {
    pub status: JobStatus,
    pub counters: SyncCounters,
    pub error_message: Option<String>,
}

impl JobCompletion {
    /// A run that finished its batch. Per-entity failures live in the
    /// counters and do not change the status.
    #[must_use]
    pub fn completed(counters: SyncCounters) -> Self {
        Self {
            status: JobStatus::Completed,
            counters,
            error_message: None,
        }
    }

    /// A run that finished but hit a failure worth surfacing at job level.
    #[must_use]
    pub fn with_errors(counters: SyncCounters, message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::CompletedWithErrors,
            counters,
            error_message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_source_names_match_storage_columns() {
        let names: Vec<&str> = SyncSource::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            ["steamspy", "storefront", "reviews", "histogram", "page_creation", "price"]
        );
    }

    #[test]
    fn job_status_parse_accepts_every_variant() {
        for status in [
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::CompletedWithErrors,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("queued"), None);
    }

    #[test]
    fn only_running_is_non_terminal() {
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::CompletedWithErrors.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn counters_track_success_and_failure() {
        let mut counters = SyncCounters::default();
        counters.record_success();
        counters.record_failure();
        counters.record_failure();
        counters.record_many(10, 2);
        assert_eq!(counters.processed, 15);
        assert_eq!(counters.succeeded, 11);
        assert_eq!(counters.failed, 4);
        assert_eq!(counters.created, 0);
    }

    #[test]
    fn completion_constructors_set_status() {
        let done = JobCompletion::completed(SyncCounters::default());
        assert_eq!(done.status, JobStatus::Completed);
        assert!(done.error_message.is_none());

        let partial = JobCompletion::with_errors(SyncCounters::default(), "1 view failed");
        assert_eq!(partial.status, JobStatus::CompletedWithErrors);
        assert_eq!(partial.error_message.as_deref(), Some("1 view failed"));
    }

    #[test]
    fn job_type_serializes_snake_case() {
        let json = serde_json::to_string(&JobType::RefreshViews).unwrap();
        assert_eq!(json, "\"refresh_views\"");
        assert_eq!(JobType::PageCreation.to_string(), "page_creation");
    }
}
