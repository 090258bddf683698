//! Best-window selection.

use crate::core::windowing::Window;

/// Index of the window with the most valid frames.
///
/// Ties resolve to the earliest window. Returns `None` for an empty slice.
pub fn best_window_index(windows: &[Window]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, window) in windows.iter().enumerate() {
        match best {
            Some((_, count)) if window.valid_frame_count <= count => {}
            _ => best = Some((i, window.valid_frame_count)),
        }
    }
    best.map(|(i, _)| i)
}

/// The window with the most valid frames, earliest first on ties.
pub fn best_window(windows: &[Window]) -> Option<&Window> {
    best_window_index(windows).map(|i| &windows[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::Frame;
    use crate::core::windowing::segment;

    fn windows_with_counts(counts: &[usize]) -> Vec<Window> {
        // Each run of valid frames is separated by a gap longer than 1 second
        let mut frames = Vec::new();
        for &count in counts {
            frames.extend(std::iter::repeat(Frame::present(0.0, 0.0, 0.9)).take(count));
            frames.extend(std::iter::repeat(Frame::missing()).take(6));
        }
        segment(&frames, 1.0, 5.0).collect()
    }

    #[test]
    fn test_picks_largest_window() {
        let windows = windows_with_counts(&[3, 7, 2]);
        assert_eq!(best_window_index(&windows), Some(1));
        assert_eq!(best_window(&windows).unwrap().valid_frame_count, 7);
    }

    #[test]
    fn test_tie_goes_to_first_window() {
        let windows = windows_with_counts(&[2, 5, 5, 1]);
        assert_eq!(windows.len(), 4);
        assert_eq!(best_window_index(&windows), Some(1));
        assert_eq!(best_window(&windows).unwrap().span, windows[1].span);
    }

    #[test]
    fn test_empty_has_no_best() {
        assert!(best_window(&[]).is_none());
    }

    #[test]
    fn test_best_dominates_all() {
        let windows = windows_with_counts(&[4, 9, 1, 9, 3, 8]);
        let best = best_window(&windows).unwrap();
        assert!(windows
            .iter()
            .all(|w| best.valid_frame_count >= w.valid_frame_count));
    }
}
