//! Errors raised while turning recordings into dataset rows.

use thiserror::Error;

/// Malformed-input errors of the windowing core.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("Recording {video_key}: {directions} eye directions but {confidences} confidences")]
    MisalignedColumns {
        video_key: String,
        directions: usize,
        confidences: usize,
    },

    #[error("Recording {video_key} has no frame with a detected face")]
    NoValidFrames { video_key: String },

    #[error("Invalid ASD label: {0} (expected 0 or 1)")]
    InvalidLabel(String),
}
