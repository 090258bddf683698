//! Trimming of leading and trailing missing frames.

use crate::core::frame::{Frame, Reading};
use std::ops::Range;

/// Index range from the first to the last element matching `is_present`.
///
/// Returns `None` if no element matches.
pub fn present_bounds<T>(seq: &[T], is_present: impl Fn(&T) -> bool) -> Option<Range<usize>> {
    let first = seq.iter().position(&is_present)?;
    let last = seq.iter().rposition(&is_present)?;
    Some(first..last + 1)
}

/// Strip leading and trailing [`Reading::Missing`] entries.
///
/// Works for confidence columns (`Reading<f64>`) as well as direction columns
/// (`Reading<Direction>`). Returns `None` for an empty or entirely missing
/// sequence.
pub fn truncate<T>(seq: &[Reading<T>]) -> Option<&[Reading<T>]> {
    present_bounds(seq, Reading::is_present).map(|range| &seq[range])
}

/// Strip leading and trailing invalid frames, returning the kept range too.
///
/// Direction and confidence of the returned frames share the same cut, which
/// is what keeps the two exported columns aligned.
pub fn truncate_frames(frames: &[Frame]) -> Option<(Range<usize>, &[Frame])> {
    let range = present_bounds(frames, Frame::is_valid)?;
    Some((range.clone(), &frames[range]))
}
