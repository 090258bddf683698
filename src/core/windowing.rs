//! Segmentation of a recording into gap-separated windows.
//!
//! Frames are scanned left to right into a running buffer. Every missing
//! frame extends a run of consecutive missing frames; a valid frame resets
//! it. Once the run exceeds `gap_tolerance_secs * frame_rate` frames, the
//! buffer is closed: if it holds at least one valid frame it is trimmed of
//! leading and trailing missing frames and emitted as a [`Window`]. The last
//! buffer is flushed the same way at the end of the recording.

use crate::core::frame::{Direction, Frame, Reading, DEFAULT_FRAME_RATE};
use crate::core::truncate::truncate_frames;
use std::ops::Range;

/// A contiguous, trimmed run of frames with its summary statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Source frame indices of the trimmed window
    pub span: Range<usize>,
    /// Source frame indices of the buffer before trimming
    pub raw_span: Range<usize>,
    /// Mean confidence over valid frames only
    pub mean_confidence: f64,
    /// Number of frames with a detected face
    pub valid_frame_count: usize,
    frames: Vec<Frame>,
}

impl Window {
    /// Build a window from one closed buffer of a recording.
    ///
    /// Returns `None` when the buffer has no valid frame.
    fn from_buffer(frames: &[Frame], raw_span: Range<usize>) -> Option<Self> {
        let buffer = &frames[raw_span.clone()];

        let confidences: Vec<f64> = buffer.iter().filter_map(Frame::valid_confidence).collect();
        if confidences.is_empty() {
            return None;
        }

        let (trimmed, kept) = truncate_frames(buffer)?;
        let span = raw_span.start + trimmed.start..raw_span.start + trimmed.end;

        Some(Self {
            span,
            raw_span,
            mean_confidence: confidences.iter().sum::<f64>() / confidences.len() as f64,
            valid_frame_count: confidences.len(),
            frames: kept.to_vec(),
        })
    }

    /// Frames of the window after trimming.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames after trimming, missing ones included.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Direction column of the trimmed window.
    pub fn directions(&self) -> Vec<Reading<Direction>> {
        self.frames.iter().map(|f| f.direction).collect()
    }

    /// Confidence column of the trimmed window.
    pub fn confidences(&self) -> Vec<Reading<f64>> {
        self.frames.iter().map(|f| f.confidence).collect()
    }

    /// Seconds of face-present footage in this window.
    pub fn valid_duration_secs(&self, frame_rate: f64) -> f64 {
        self.valid_frame_count as f64 / frame_rate
    }
}

/// Splits frame sequences into windows.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    /// Tolerated gap of missing data, in seconds
    gap_tolerance_secs: f64,
    /// Frames per second of the input
    frame_rate: f64,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(1.0, DEFAULT_FRAME_RATE)
    }
}

impl Segmenter {
    /// Segmenter closing a window once a gap is longer than
    /// `gap_tolerance_secs * frame_rate` missing frames.
    ///
    /// `gap_tolerance_secs` must be non-negative and `frame_rate` positive.
    /// Callers taking these from user input check them first, as
    /// [`Config::validate`](crate::Config::validate) does.
    pub fn new(gap_tolerance_secs: f64, frame_rate: f64) -> Self {
        debug_assert!(gap_tolerance_secs >= 0.0, "gap tolerance must be non-negative");
        debug_assert!(frame_rate > 0.0, "frame rate must be positive");
        Self {
            gap_tolerance_secs,
            frame_rate,
        }
    }

    pub fn gap_tolerance_secs(&self) -> f64 {
        self.gap_tolerance_secs
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Number of consecutive missing frames that may still be bridged.
    pub fn gap_threshold_frames(&self) -> f64 {
        self.gap_tolerance_secs * self.frame_rate
    }

    /// Lazily segment `frames`. Calling this again restarts from the beginning.
    pub fn segment<'a>(&self, frames: &'a [Frame]) -> Windows<'a> {
        Windows {
            frames,
            gap_threshold: self.gap_threshold_frames(),
            cursor: 0,
        }
    }
}

/// Segment `frames` with the given gap tolerance.
pub fn segment(frames: &[Frame], gap_tolerance_secs: f64, frame_rate: f64) -> Windows<'_> {
    Segmenter::new(gap_tolerance_secs, frame_rate).segment(frames)
}

/// Iterator over the windows of one frame sequence, in temporal order.
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    frames: &'a [Frame],
    gap_threshold: f64,
    cursor: usize,
}

impl<'a> Windows<'a> {
    /// Close the next buffer, returning its source range.
    fn next_buffer(&mut self) -> Option<Range<usize>> {
        if self.cursor >= self.frames.len() {
            return None;
        }

        let start = self.cursor;
        let mut end = self.frames.len();
        let mut missing_run = 0usize;

        for (i, frame) in self.frames.iter().enumerate().skip(start) {
            if frame.is_valid() {
                missing_run = 0;
            } else {
                missing_run += 1;
            }

            // The frame that trips the threshold belongs to the closed buffer
            if missing_run as f64 > self.gap_threshold {
                end = i + 1;
                break;
            }
        }

        self.cursor = end;
        Some(start..end)
    }
}

impl<'a> Iterator for Windows<'a> {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        while let Some(buffer) = self.next_buffer() {
            if let Some(window) = Window::from_buffer(self.frames, buffer) {
                return Some(window);
            }
        }
        None
    }
}

impl std::iter::FusedIterator for Windows<'_> {}
