//! Per-frame gaze types and recordings.
//!
//! Missing frames are represented explicitly with [`Reading::Missing`] rather
//! than with sentinel values, so a frame without a detected face can never be
//! mistaken for a real angle or confidence.

use crate::core::PrepError;
use serde::{Deserialize, Serialize};

/// Default sampling rate of the frame extractor, in frames per second.
pub const DEFAULT_FRAME_RATE: f64 = 5.0;

/// A per-frame value that may be absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading<T> {
    /// No face (or no estimate) in this frame
    Missing,
    /// Estimated value
    Present(T),
}

impl<T> Reading<T> {
    /// True when no value was observed for this frame.
    pub fn is_missing(&self) -> bool {
        matches!(self, Reading::Missing)
    }

    pub fn is_present(&self) -> bool {
        !self.is_missing()
    }

    /// Borrow the value if present.
    pub fn value(&self) -> Option<&T> {
        match self {
            Reading::Present(v) => Some(v),
            Reading::Missing => None,
        }
    }
}

impl<T> From<Option<T>> for Reading<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Reading::Present(v),
            None => Reading::Missing,
        }
    }
}

impl<T> From<Reading<T>> for Option<T> {
    fn from(reading: Reading<T>) -> Self {
        match reading {
            Reading::Present(v) => Some(v),
            Reading::Missing => None,
        }
    }
}

/// Eye direction estimate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction {
    pub yaw: f64,
    pub pitch: f64,
}

impl Direction {
    pub fn new(yaw: f64, pitch: f64) -> Self {
        Self { yaw, pitch }
    }
}

/// One sampled video frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub direction: Reading<Direction>,
    pub confidence: Reading<f64>,
}

impl Frame {
    /// A frame with a detected face.
    pub fn present(yaw: f64, pitch: f64, confidence: f64) -> Self {
        Self {
            direction: Reading::Present(Direction::new(yaw, pitch)),
            confidence: Reading::Present(confidence),
        }
    }

    /// A frame without a detected face.
    pub fn missing() -> Self {
        Self {
            direction: Reading::Missing,
            confidence: Reading::Missing,
        }
    }

    /// A frame counts as valid only when both direction and confidence exist.
    ///
    /// Half-filled frames are treated as missing so that the direction and
    /// confidence columns of a window are always cut at the same indices.
    pub fn is_valid(&self) -> bool {
        self.direction.is_present() && self.confidence.is_present()
    }

    /// Confidence of a valid frame.
    pub fn valid_confidence(&self) -> Option<f64> {
        if self.is_valid() {
            self.confidence.value().copied()
        } else {
            None
        }
    }
}

/// Binary diagnosis label, encoded as the `ASD` column (0 or 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Label {
    /// Neurotypical (`ASD = 0`), the minority class
    Neurotypical,
    /// Autism spectrum disorder (`ASD = 1`), the majority class
    Asd,
}

impl Label {
    /// Class that gets the multi-window expansion and the upsampling.
    pub const MINORITY: Label = Label::Neurotypical;

    pub fn is_minority(self) -> bool {
        self == Self::MINORITY
    }

    /// Numeric class as stored in the `ASD` column.
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Neurotypical => 0,
            Label::Asd => 1,
        }
    }
}

impl TryFrom<u8> for Label {
    type Error = PrepError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Label::Neurotypical),
            1 => Ok(Label::Asd),
            other => Err(PrepError::InvalidLabel(other.to_string())),
        }
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label.as_u8()
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Neurotypical => f.pad("NT"),
            Label::Asd => f.pad("ASD"),
        }
    }
}

/// Per-video metadata carried unchanged into every output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingInfo {
    pub video_key: String,
    pub child_id: String,
    pub label: Label,
    /// Age in years, if known
    pub age: Option<f64>,
    pub gender: String,
}

/// The full frame sequence of one video.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub info: RecordingInfo,
    frames: Vec<Frame>,
}

impl Recording {
    /// Build a recording from already-paired frames.
    pub fn new(info: RecordingInfo, frames: Vec<Frame>) -> Self {
        Self { info, frames }
    }

    /// Build a recording from the two per-frame columns of the dataset.
    ///
    /// Fails if the columns have different lengths.
    pub fn from_columns(
        info: RecordingInfo,
        directions: Vec<Reading<Direction>>,
        confidences: Vec<Reading<f64>>,
    ) -> Result<Self, PrepError> {
        if directions.len() != confidences.len() {
            return Err(PrepError::MisalignedColumns {
                video_key: info.video_key,
                directions: directions.len(),
                confidences: confidences.len(),
            });
        }

        let frames = directions
            .into_iter()
            .zip(confidences)
            .map(|(direction, confidence)| Frame {
                direction,
                confidence,
            })
            .collect();

        Ok(Self { info, frames })
    }

    /// All frames in capture order, missing ones included.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames, missing ones included.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn valid_frame_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_valid()).count()
    }

    /// Length of the recording in seconds at the given frame rate.
    pub fn duration_secs(&self, frame_rate: f64) -> f64 {
        self.frames.len() as f64 / frame_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> RecordingInfo {
        RecordingInfo {
            video_key: "child-1/video-1.mp4".to_string(),
            child_id: "child-1".to_string(),
            label: Label::Asd,
            age: Some(4.0),
            gender: "male".to_string(),
        }
    }

    #[test]
    fn test_reading_option_conversion() {
        let r: Reading<f64> = Some(0.5).into();
        assert_eq!(r, Reading::Present(0.5));
        let o: Option<f64> = Reading::<f64>::Missing.into();
        assert!(o.is_none());
    }

    #[test]
    fn test_half_filled_frame_is_not_valid() {
        let frame = Frame {
            direction: Reading::Missing,
            confidence: Reading::Present(0.9),
        };
        assert!(!frame.is_valid());
        assert_eq!(frame.valid_confidence(), None);
        assert_eq!(Frame::present(1.0, 2.0, 0.8).valid_confidence(), Some(0.8));
    }

    #[test]
    fn test_label_codes() {
        assert_eq!(Label::try_from(0).unwrap(), Label::Neurotypical);
        assert_eq!(Label::try_from(1).unwrap(), Label::Asd);
        assert!(Label::try_from(2).is_err());
        assert!(Label::Neurotypical.is_minority());
        assert!(!Label::Asd.is_minority());
    }

    #[test]
    fn test_from_columns_rejects_misaligned() {
        let result = Recording::from_columns(
            info(),
            vec![Reading::Present(Direction::new(1.0, 2.0))],
            vec![Reading::Present(0.5), Reading::Missing],
        );
        assert!(matches!(
            result,
            Err(PrepError::MisalignedColumns {
                directions: 1,
                confidences: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_from_columns_pairs_frames() {
        let recording = Recording::from_columns(
            info(),
            vec![Reading::Present(Direction::new(1.0, 2.0)), Reading::Missing],
            vec![Reading::Present(0.5), Reading::Missing],
        )
        .unwrap();

        assert_eq!(recording.len(), 2);
        assert_eq!(recording.valid_frame_count(), 1);
        assert_eq!(recording.frames()[1], Frame::missing());
        assert!((recording.duration_secs(5.0) - 0.4).abs() < 1e-9);
    }
}
