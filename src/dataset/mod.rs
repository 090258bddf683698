//! Dataset files and dataset-level operations.
//!
//! This module contains:
//! - Reading recordings and writing/reading output rows (CSV and JSONL)
//! - Encoding of list-valued columns as sequence literals
//! - Subject-grouped train/validation/test and k-fold splits
//! - Per-class dataset statistics

pub mod literal;
pub mod split;
pub mod statistics;
pub mod table;

use crate::core::PrepError;
use thiserror::Error;

// Re-export commonly used types
pub use split::{k_folds, split_train_test, split_train_val_test, Fold, Split};
pub use statistics::{ClassCounts, ClassStatistics};
pub use table::{
    read_recording_results, read_recordings, read_rows, write_rows, write_rows_jsonl,
    ExportFormat, OUTPUT_COLUMNS,
};

/// Errors raised while reading, writing or splitting datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {column} literal: {message}")]
    Literal {
        column: &'static str,
        message: String,
    },

    #[error(transparent)]
    Prep(#[from] PrepError),

    #[error("Record {record} ({video_key}): {source}")]
    Record {
        record: usize,
        video_key: String,
        #[source]
        source: Box<DatasetError>,
    },

    #[error("Cannot split dataset: {0}")]
    Split(String),
}

impl DatasetError {
    /// Attach the position and video key of the record that caused the error.
    pub fn in_record(self, record: usize, video_key: String) -> Self {
        DatasetError::Record {
            record,
            video_key,
            source: Box::new(self),
        }
    }
}
