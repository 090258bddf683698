//! Run report.
//!
//! Counts what a preparation run consumed and produced. Counters are atomic
//! so worker threads can record into a shared report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Statistics of one preparation run.
#[derive(Debug)]
pub struct RunReport {
    run_id: Uuid,
    /// Recordings turned into rows
    recordings_processed: AtomicU64,
    /// Recordings rejected as malformed
    recordings_failed: AtomicU64,
    /// Windows produced by the segmenter
    windows_emitted: AtomicU64,
    /// Rows produced by the expansion step
    rows_emitted: AtomicU64,
    /// Rows appended by the rebalancer
    rows_duplicated: AtomicU64,
    started_at: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            recordings_processed: AtomicU64::new(0),
            recordings_failed: AtomicU64::new(0),
            windows_emitted: AtomicU64::new(0),
            rows_emitted: AtomicU64::new(0),
            rows_duplicated: AtomicU64::new(0),
            started_at: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a report that is written to `path` on [`RunReport::save`].
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut report = Self::new();
        report.persist_path = Some(path);
        report
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Record one processed recording and what it produced.
    pub fn record_recording(&self, windows: u64, rows: u64) {
        self.recordings_processed.fetch_add(1, Ordering::Relaxed);
        self.windows_emitted.fetch_add(windows, Ordering::Relaxed);
        self.rows_emitted.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.recordings_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicates(&self, count: u64) {
        self.rows_duplicated.fetch_add(count, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> RunStats {
        RunStats {
            run_id: self.run_id,
            recordings_processed: self.recordings_processed.load(Ordering::Relaxed),
            recordings_failed: self.recordings_failed.load(Ordering::Relaxed),
            windows_emitted: self.windows_emitted.load(Ordering::Relaxed),
            rows_emitted: self.rows_emitted.load(Ordering::Relaxed),
            rows_duplicated: self.rows_duplicated.load(Ordering::Relaxed),
            started_at: self.started_at,
            duration_ms: (Utc::now() - self.started_at).num_milliseconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Run {}:\n\
             - Recordings processed: {}\n\
             - Recordings rejected: {}\n\
             - Windows emitted: {}\n\
             - Rows emitted: {}\n\
             - Rows duplicated: {}\n\
             - Duration: {} ms",
            stats.run_id,
            stats.recordings_processed,
            stats.recordings_failed,
            stats.windows_emitted,
            stats.rows_emitted,
            stats.rows_duplicated,
            stats.duration_ms
        )
    }

    /// Save stats to disk, if the report has a persistence path.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let json = serde_json::to_string_pretty(&self.stats()).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load a previously saved report.
    pub fn load(path: &Path) -> Result<RunStats, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(std::io::Error::other)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of run statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub run_id: Uuid,
    pub recordings_processed: u64,
    pub recordings_failed: u64,
    pub windows_emitted: u64,
    pub rows_emitted: u64,
    pub rows_duplicated: u64,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Report shared between worker threads.
pub type SharedRunReport = Arc<RunReport>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counting() {
        let report = RunReport::new();
        report.record_recording(3, 1);
        report.record_recording(5, 4);
        report.record_failure();
        report.record_duplicates(2);

        let stats = report.stats();
        assert_eq!(stats.recordings_processed, 2);
        assert_eq!(stats.recordings_failed, 1);
        assert_eq!(stats.windows_emitted, 8);
        assert_eq!(stats.rows_emitted, 5);
        assert_eq!(stats.rows_duplicated, 2);
        assert_eq!(stats.run_id, report.run_id());
    }

    #[test]
    fn test_counting_across_threads() {
        let report: SharedRunReport = Arc::new(RunReport::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let report = Arc::clone(&report);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        report.record_recording(2, 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = report.stats();
        assert_eq!(stats.recordings_processed, 100);
        assert_eq!(stats.windows_emitted, 200);
    }

    #[test]
    fn test_summary_format() {
        let report = RunReport::new();
        let summary = report.summary();
        assert!(summary.contains("Recordings processed: 0"));
        assert!(summary.contains("Rows duplicated"));
        assert!(summary.contains(&report.run_id().to_string()));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("report.json");

        let report = RunReport::with_persistence(path.clone());
        report.record_recording(4, 2);
        report.save().unwrap();

        let stats = RunReport::load(&path).unwrap();
        assert_eq!(stats.run_id, report.run_id());
        assert_eq!(stats.rows_emitted, 2);
    }

    #[test]
    fn test_save_without_path_is_noop() {
        assert!(RunReport::new().save().is_ok());
    }
}
