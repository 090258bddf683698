//! Core functionality of the gaze preparation pipeline.
//!
//! This module contains:
//! - Frame and recording types with explicit missing values
//! - Trimming and gap-based windowing of frame sequences
//! - Best-window selection and expansion into dataset rows
//! - Subject-level upsampling of the minority class
//! - Gaze summary features

pub mod error;
pub mod expansion;
pub mod features;
pub mod frame;
pub mod rebalance;
pub mod selection;
pub mod truncate;
pub mod windowing;

// Re-export commonly used types
pub use error::PrepError;
pub use expansion::{OutputRow, RowExpander, DEFAULT_MIN_WINDOW_SECS};
pub use features::{compute_features, AngleStatistics, GazeFeatures};
pub use frame::{Direction, Frame, Label, Reading, Recording, RecordingInfo, DEFAULT_FRAME_RATE};
pub use rebalance::{subject_index, Rebalancer};
pub use selection::{best_window, best_window_index};
pub use truncate::{truncate, truncate_frames};
pub use windowing::{segment, Segmenter, Window, Windows};
