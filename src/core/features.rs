//! Gaze summary features.
//!
//! Summaries are computed over valid frames only; missing frames are never
//! replaced by placeholder angles.

use crate::core::frame::Frame;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Summary statistics of one gaze angle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleStatistics {
    /// Mean angle in degrees
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Gaze features of a frame sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GazeFeatures {
    pub yaw: AngleStatistics,
    pub pitch: AngleStatistics,
    /// Frames with a detected face
    pub valid_frame_count: usize,
    /// Share of frames with a detected face (0-1)
    pub face_ratio: f64,
    /// Mean confidence over valid frames
    pub mean_confidence: f64,
}

/// Compute gaze features from a frame sequence.
///
/// Returns `None` when no frame is valid.
pub fn compute_features(frames: &[Frame]) -> Option<GazeFeatures> {
    let mut yaw = Vec::new();
    let mut pitch = Vec::new();
    let mut confidences = Vec::new();

    for frame in frames.iter().filter(|f| f.is_valid()) {
        if let (Some(direction), Some(confidence)) =
            (frame.direction.value(), frame.confidence.value())
        {
            yaw.push(direction.yaw);
            pitch.push(direction.pitch);
            confidences.push(*confidence);
        }
    }

    if confidences.is_empty() {
        return None;
    }

    Some(GazeFeatures {
        yaw: angle_statistics(&yaw),
        pitch: angle_statistics(&pitch),
        valid_frame_count: confidences.len(),
        face_ratio: confidences.len() as f64 / frames.len() as f64,
        mean_confidence: Statistics::mean(&confidences),
    })
}

fn angle_statistics(values: &[f64]) -> AngleStatistics {
    AngleStatistics {
        mean: Statistics::mean(values),
        std_dev: Statistics::population_std_dev(values),
        min: Statistics::min(values),
        max: Statistics::max(values),
    }
}
