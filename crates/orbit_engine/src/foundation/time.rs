//! Time management utilities
//!
//! Wall-clock helpers for the main loop: a frame timer for statistics and a
//! pacer that gates frames to a target rate. Times are seconds reported by the
//! window backend.

use std::time::Duration;

/// Frame statistics accumulated over rendered frames
#[derive(Debug, Clone, Default)]
pub struct Timer {
    last_frame: Option<f64>,
    total_time: f64,
    frame_count: u64,
}

impl Timer {
    /// Create an empty timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame rendered at `now` seconds
    pub fn record_frame(&mut self, now: f64) {
        if let Some(last) = self.last_frame {
            self.total_time += now - last;
        }
        self.last_frame = Some(now);
        self.frame_count += 1;
    }

    /// Number of recorded frames
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average frames per second since the first recorded frame
    pub fn average_fps(&self) -> f64 {
        if self.total_time > 0.0 {
            (self.frame_count.saturating_sub(1)) as f64 / self.total_time
        } else {
            0.0
        }
    }
}

/// Fixed-rate frame gate
///
/// A frame is due once strictly more than `1 / target_fps` seconds have
/// passed since the last marked frame. The pacer never sleeps; the caller
/// polls it every loop iteration.
#[derive(Debug, Clone)]
pub struct FramePacer {
    frame_interval: f64,
    last_frame: f64,
}

impl FramePacer {
    /// Create a pacer for `target_fps` frames per second
    ///
    /// The first frame is due as soon as more than one interval has passed
    /// since time zero.
    pub fn new(target_fps: f64) -> Self {
        Self {
            frame_interval: 1.0 / target_fps,
            last_frame: 0.0,
        }
    }

    /// Seconds between frames
    pub fn frame_interval(&self) -> f64 {
        self.frame_interval
    }

    /// Whether a frame is due at `now` seconds
    pub fn ready(&self, now: f64) -> bool {
        now - self.last_frame > self.frame_interval
    }

    /// Record that a frame was produced at `now` seconds
    pub fn mark(&mut self, now: f64) {
        self.last_frame = now;
    }

    /// Time remaining until the next frame is due (zero when already due)
    pub fn time_until_ready(&self, now: f64) -> Duration {
        let remaining = self.frame_interval - (now - self.last_frame);
        Duration::from_secs_f64(remaining.max(0.0))
    }
}
