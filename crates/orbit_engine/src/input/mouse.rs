//! Cursor delta tracking

/// Converts absolute cursor positions into look offsets
///
/// The first sample only records the position; otherwise the jump from the
/// cursor's startup position would spin the camera.
#[derive(Debug, Clone, Default)]
pub struct MouseTracker {
    last: Option<(f64, f64)>,
}

impl MouseTracker {
    /// Tracker that has not seen the cursor yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cursor position and return `(dx, dy)` since the last one
    ///
    /// `dy` is positive when the cursor moves up the screen.
    pub fn update(&mut self, x: f64, y: f64) -> (f32, f32) {
        let offset = self
            .last
            .map_or((0.0, 0.0), |(last_x, last_y)| ((x - last_x) as f32, (last_y - y) as f32));
        self.last = Some((x, y));
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_has_no_offset() {
        let mut tracker = MouseTracker::new();
        assert_eq!(tracker.update(400.0, 300.0), (0.0, 0.0));
    }

    #[test]
    fn test_offsets_follow_cursor() {
        let mut tracker = MouseTracker::new();
        tracker.update(400.0, 300.0);
        // Right and up
        assert_eq!(tracker.update(410.0, 295.0), (10.0, 5.0));
        // Left and down
        assert_eq!(tracker.update(400.0, 305.0), (-10.0, -10.0));
        assert_eq!(tracker.update(400.0, 305.0), (0.0, 0.0));
    }
}
