//! Recording-to-row pipeline.
//!
//! Each recording is segmented into windows, the windows are expanded into
//! rows, and the rows of all recordings are concatenated in input order.
//! Recordings are independent, so they can be spread over worker threads;
//! the merged table is identical to the sequential one.

use crate::config::Config;
use crate::core::{OutputRow, PrepError, Rebalancer, Recording, RowExpander, Segmenter, Window};
use crate::dataset::DatasetError;
use crate::report::{RunReport, SharedRunReport};
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Turns recordings into dataset rows.
#[derive(Debug, Clone)]
pub struct Pipeline {
    segmenter: Segmenter,
    expander: RowExpander,
    workers: usize,
    skip_malformed: bool,
    report: SharedRunReport,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Segmenter::default(), RowExpander::default())
    }
}

impl Pipeline {
    pub fn new(segmenter: Segmenter, expander: RowExpander) -> Self {
        Self {
            segmenter,
            expander,
            workers: 1,
            skip_malformed: false,
            report: Arc::new(RunReport::new()),
        }
    }

    /// Build a pipeline from the run configuration.
    ///
    /// The report is persisted under the configured data path.
    pub fn from_config(config: &Config) -> Self {
        Self {
            segmenter: Segmenter::new(config.gap_tolerance_secs, config.frame_rate),
            expander: RowExpander::new(config.min_window_secs, config.frame_rate),
            workers: config.workers.max(1),
            skip_malformed: false,
            report: Arc::new(RunReport::with_persistence(config.report_path())),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Log and skip malformed recordings instead of failing on the first one.
    pub fn with_skip_malformed(mut self, skip: bool) -> Self {
        self.skip_malformed = skip;
        self
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    pub fn report(&self) -> &SharedRunReport {
        &self.report
    }

    /// Windows of one recording, in order.
    pub fn windows(&self, recording: &Recording) -> Vec<Window> {
        self.segmenter.segment(recording.frames()).collect()
    }

    /// Rows contributed by one recording.
    pub fn process_recording(&self, recording: &Recording) -> Result<Vec<OutputRow>, PrepError> {
        if recording.valid_frame_count() == 0 {
            return Err(PrepError::NoValidFrames {
                video_key: recording.info.video_key.clone(),
            });
        }

        let windows = self.windows(recording);
        let rows = self.expander.expand(&recording.info, &windows);

        tracing::debug!(
            video_key = %recording.info.video_key,
            label = %recording.info.label,
            frames = recording.len(),
            windows = windows.len(),
            rows = rows.len(),
            "Processed recording"
        );
        self.report.record_recording(windows.len() as u64, rows.len() as u64);

        Ok(rows)
    }

    /// Process all recordings, using worker threads when configured.
    pub fn process(&self, recordings: &[Recording]) -> Result<Vec<OutputRow>, PrepError> {
        let rows = if self.workers > 1 && recordings.len() > 1 {
            self.process_parallel(recordings)?
        } else {
            self.process_sequential(recordings)?
        };

        tracing::info!(
            recordings = recordings.len(),
            rows = rows.len(),
            workers = self.workers,
            "Processed recordings"
        );
        Ok(rows)
    }

    /// Process recordings one after another on the calling thread.
    pub fn process_sequential(
        &self,
        recordings: &[Recording],
    ) -> Result<Vec<OutputRow>, PrepError> {
        let mut rows = Vec::new();
        for recording in recordings {
            if let Some(produced) = self.settle(self.process_recording(recording))? {
                rows.extend(produced);
            }
        }
        Ok(rows)
    }

    /// Process recordings on `workers` threads and merge in input order.
    ///
    /// Unless malformed recordings are skipped, no new recordings are handed
    /// out once one has failed. Recordings already queued are still finished
    /// and counted in the report, so after a failed run the report may count
    /// a few more recordings than a sequential run would. The returned error
    /// is always the first failure in input order.
    pub fn process_parallel(&self, recordings: &[Recording]) -> Result<Vec<OutputRow>, PrepError> {
        let workers = self.workers.min(recordings.len()).max(1);
        let failed = AtomicBool::new(false);
        let failed = &failed;
        let (job_tx, job_rx) = bounded::<(usize, &Recording)>(workers * 2);
        let (result_tx, result_rx) =
            bounded::<(usize, Result<Vec<OutputRow>, PrepError>)>(workers * 2);

        let mut results: Vec<Option<Result<Vec<OutputRow>, PrepError>>> =
            (0..recordings.len()).map(|_| None).collect();

        std::thread::scope(|scope| {
            scope.spawn(move || {
                for job in recordings.iter().enumerate() {
                    if failed.load(Ordering::Acquire) || job_tx.send(job).is_err() {
                        break;
                    }
                }
            });

            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for (index, recording) in job_rx.iter() {
                        let result = self.process_recording(recording);
                        if result.is_err() && !self.skip_malformed {
                            failed.store(true, Ordering::Release);
                        }
                        if result_tx.send((index, result)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            for (index, result) in result_rx.iter() {
                results[index] = Some(result);
            }
        });

        let mut rows = Vec::new();
        for result in results.into_iter().flatten() {
            if let Some(produced) = self.settle(result)? {
                rows.extend(produced);
            }
        }
        Ok(rows)
    }

    /// Upsample minority-class subjects of a finished table.
    pub fn rebalance(&self, rows: Vec<OutputRow>, seed: u64) -> Vec<OutputRow> {
        let before = rows.len();
        let rows = Rebalancer::with_seed(seed).upsample(rows);
        let added = rows.len() - before;
        self.report.record_duplicates(added as u64);
        tracing::info!(rows = before, duplicated = added, seed, "Rebalanced rows");
        rows
    }

    /// Apply the malformed-input policy to loaded recordings.
    ///
    /// Records that failed to load are logged, counted as rejected and
    /// dropped when malformed input is skipped; otherwise the first failure
    /// is returned.
    pub fn admit(
        &self,
        loaded: Vec<Result<Recording, DatasetError>>,
    ) -> Result<Vec<Recording>, DatasetError> {
        let mut recordings = Vec::with_capacity(loaded.len());
        for result in loaded {
            if let Some(recording) = self.settle(result)? {
                recordings.push(recording);
            }
        }
        Ok(recordings)
    }

    /// Apply the malformed-input policy to one result.
    fn settle<T, E: std::fmt::Display>(&self, result: Result<T, E>) -> Result<Option<T>, E> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if !self.skip_malformed => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping recording");
                self.report.record_failure();
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Frame, Label, RecordingInfo};

    fn recording(index: usize, label: Label, runs: &[usize]) -> Recording {
        let mut frames = Vec::new();
        for &run in runs {
            frames.extend((0..run).map(|i| Frame::present(i as f64, -(i as f64), 0.9)));
            frames.extend(std::iter::repeat(Frame::missing()).take(8));
        }
        Recording::new(
            RecordingInfo {
                video_key: format!("child-{}/video-{index}", index / 2),
                child_id: format!("child-{}", index / 2),
                label,
                age: Some(4.0),
                gender: "male".to_string(),
            },
            frames,
        )
    }

    fn corpus() -> Vec<Recording> {
        (0..12)
            .map(|i| {
                let label = if i % 3 == 0 {
                    Label::Neurotypical
                } else {
                    Label::Asd
                };
                recording(i, label, &[40 + i, 120 + 3 * i, 15, 101 + i])
            })
            .collect()
    }

    #[test]
    fn test_rows_per_class() {
        let pipeline = Pipeline::default();

        let asd = pipeline
            .process_recording(&recording(1, Label::Asd, &[30, 150, 60]))
            .unwrap();
        assert_eq!(asd.len(), 1);
        assert_eq!(asd[0].number_of_frames_with_face, 150);

        let nt = pipeline
            .process_recording(&recording(0, Label::Neurotypical, &[30, 150, 60, 120]))
            .unwrap();
        let counts: Vec<usize> = nt.iter().map(|r| r.number_of_frames_with_face).collect();
        assert_eq!(counts, vec![150, 120]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let recordings = corpus();
        let sequential = Pipeline::default().process_sequential(&recordings).unwrap();
        let parallel = Pipeline::default()
            .with_workers(4)
            .process_parallel(&recordings)
            .unwrap();

        assert!(!sequential.is_empty());
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_recording_without_face_is_rejected() {
        let pipeline = Pipeline::default();
        let empty = recording(0, Label::Asd, &[]);
        assert!(matches!(
            pipeline.process_recording(&empty),
            Err(PrepError::NoValidFrames { .. })
        ));
    }

    #[test]
    fn test_malformed_recording_fails_unless_skipped() {
        let mut recordings = corpus();
        recordings.insert(3, recording(99, Label::Asd, &[]));

        assert!(Pipeline::default().process(&recordings).is_err());
        assert!(Pipeline::default().with_workers(3).process(&recordings).is_err());

        let lenient = Pipeline::default().with_workers(3).with_skip_malformed(true);
        let rows = lenient.process(&recordings).unwrap();
        assert_eq!(rows, Pipeline::default().process(&corpus()).unwrap());
        assert_eq!(lenient.report().stats().recordings_failed, 1);
        assert_eq!(lenient.report().stats().recordings_processed, 12);
    }

    #[test]
    fn test_parallel_stops_handing_out_work_after_failure() {
        let mut recordings = vec![recording(99, Label::Asd, &[])];
        recordings.extend(corpus());
        recordings.extend(corpus());

        let pipeline = Pipeline::default().with_workers(1);
        let err = pipeline.process_parallel(&recordings).unwrap_err();
        assert!(
            matches!(err, PrepError::NoValidFrames { video_key } if video_key.ends_with("video-99"))
        );

        // One worker with a queue of two: at most the queued jobs and the
        // one the producer was blocked on still run.
        let processed = pipeline.report().stats().recordings_processed;
        assert!(processed <= 3, "processed {processed}");
    }

    #[test]
    fn test_parallel_returns_first_failure_in_input_order() {
        let mut recordings = corpus();
        recordings.insert(2, recording(97, Label::Asd, &[]));
        recordings.insert(9, recording(98, Label::Asd, &[]));

        let sequential = Pipeline::default().process_sequential(&recordings).unwrap_err();
        let parallel = Pipeline::default()
            .with_workers(4)
            .process_parallel(&recordings)
            .unwrap_err();
        assert_eq!(sequential.to_string(), parallel.to_string());
    }

    #[test]
    fn test_admit_skips_records_that_failed_to_load() {
        let loaded = || -> Vec<Result<Recording, DatasetError>> {
            vec![
                Ok(recording(0, Label::Asd, &[10])),
                Err(PrepError::MisalignedColumns {
                    video_key: "bad".to_string(),
                    directions: 1,
                    confidences: 2,
                }
                .into()),
                Ok(recording(1, Label::Asd, &[10])),
            ]
        };

        let strict = Pipeline::default();
        assert!(strict.admit(loaded()).is_err());
        assert_eq!(strict.report().stats().recordings_failed, 0);

        let lenient = Pipeline::default().with_skip_malformed(true);
        let recordings = lenient.admit(loaded()).unwrap();
        assert_eq!(recordings.len(), 2);
        assert_eq!(lenient.report().stats().recordings_failed, 1);
    }

    #[test]
    fn test_report_counts_windows_and_rows() {
        let pipeline = Pipeline::default();
        let rows = pipeline
            .process(&[recording(1, Label::Asd, &[10, 20, 30])])
            .unwrap();
        let stats = pipeline.report().stats();
        assert_eq!(stats.windows_emitted, 3);
        assert_eq!(stats.rows_emitted, rows.len() as u64);
    }

    #[test]
    fn test_rebalance_records_duplicates() {
        let pipeline = Pipeline::default();
        let rows = pipeline.process(&corpus()).unwrap();
        let before = rows.len();
        let rebalanced = pipeline.rebalance(rows, 42);
        let added = (rebalanced.len() - before) as u64;
        assert!(added > 0);
        assert_eq!(pipeline.report().stats().rows_duplicated, added);
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.gap_tolerance_secs = 2.0;
        config.workers = 3;
        let pipeline = Pipeline::from_config(&config);
        assert_eq!(pipeline.segmenter().gap_threshold_frames(), 10.0);
        assert_eq!(pipeline.workers, 3);
    }
}
