//! Expansion of recordings into dataset rows.
//!
//! Majority-class (ASD) recordings contribute exactly one row, built from
//! their best window. Minority-class (NT) recordings contribute one row per
//! window that is long enough, which already narrows the class imbalance
//! before any upsampling happens.

use crate::core::frame::{Direction, Label, Reading, RecordingInfo, DEFAULT_FRAME_RATE};
use crate::core::selection::best_window;
use crate::core::windowing::Window;

/// Default minimum length of a minority-class window, in seconds of valid frames.
pub const DEFAULT_MIN_WINDOW_SECS: f64 = 20.0;

/// One (recording, window) pair promoted to the modelling dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub video_key: String,
    pub label: Label,
    pub child_id: String,
    pub age: Option<f64>,
    pub gender: String,
    /// Trimmed direction column of the window
    pub eye_directions: Vec<Reading<Direction>>,
    /// Trimmed confidence column of the window
    pub confidences: Vec<Reading<f64>>,
    /// Mean confidence over the window's valid frames
    pub total_confidence: f64,
    /// Valid frame count of the window
    pub number_of_frames_with_face: usize,
}

impl OutputRow {
    /// Row holding the recording's metadata and the window's trimmed columns.
    pub fn from_window(info: &RecordingInfo, window: &Window) -> Self {
        Self {
            video_key: info.video_key.clone(),
            label: info.label,
            child_id: info.child_id.clone(),
            age: info.age,
            gender: info.gender.clone(),
            eye_directions: window.directions(),
            confidences: window.confidences(),
            total_confidence: window.mean_confidence,
            number_of_frames_with_face: window.valid_frame_count,
        }
    }
}

/// Turns the windows of a recording into output rows.
#[derive(Debug, Clone, Copy)]
pub struct RowExpander {
    min_window_secs: f64,
    frame_rate: f64,
}

impl Default for RowExpander {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_WINDOW_SECS, DEFAULT_FRAME_RATE)
    }
}

impl RowExpander {
    /// `min_window_secs` must be non-negative and `frame_rate` positive.
    /// Callers taking these from user input check them first, as
    /// [`Config::validate`](crate::Config::validate) does.
    pub fn new(min_window_secs: f64, frame_rate: f64) -> Self {
        debug_assert!(min_window_secs >= 0.0, "minimum window must be non-negative");
        debug_assert!(frame_rate > 0.0, "frame rate must be positive");
        Self {
            min_window_secs,
            frame_rate,
        }
    }

    /// Valid frame count a minority-class window must exceed.
    pub fn min_valid_frames(&self) -> f64 {
        self.min_window_secs * self.frame_rate
    }

    /// Whether a minority-class window is long enough to become a row.
    pub fn qualifies(&self, window: &Window) -> bool {
        window.valid_frame_count as f64 > self.min_valid_frames()
    }

    /// Emit the rows for one recording, given all of its windows in order.
    pub fn expand(&self, info: &RecordingInfo, windows: &[Window]) -> Vec<OutputRow> {
        if info.label.is_minority() {
            windows
                .iter()
                .filter(|w| self.qualifies(w))
                .map(|w| OutputRow::from_window(info, w))
                .collect()
        } else {
            best_window(windows)
                .map(|w| OutputRow::from_window(info, w))
                .into_iter()
                .collect()
        }
    }
}
