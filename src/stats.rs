//! Rolling frame statistics for a stats overlay

use std::collections::VecDeque;
use std::time::Duration;

/// Frames per second over a trailing window of frame time
#[derive(Debug, Clone)]
pub struct FrameStats {
    window: Duration,
    history: VecDeque<Duration>,
    in_window: Duration,
    total_frames: u64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl FrameStats {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            history: VecDeque::with_capacity(120),
            in_window: Duration::ZERO,
            total_frames: 0,
        }
    }

    /// Record one frame that took `elapsed`
    pub fn record(&mut self, elapsed: Duration) {
        self.total_frames += 1;
        self.history.push_back(elapsed);
        self.in_window += elapsed;
        // Keep at least the newest frame so a single long frame still reports
        while self.history.len() > 1 && self.in_window > self.window {
            if let Some(oldest) = self.history.pop_front() {
                self.in_window -= oldest;
            }
        }
    }

    /// Frames per second across the window, 0 until time has passed
    pub fn fps(&self) -> f32 {
        let secs = self.in_window.as_secs_f32();
        if secs > 0.0 {
            self.history.len() as f32 / secs
        } else {
            0.0
        }
    }

    /// Mean frame time across the window
    pub fn mean_frame_time(&self) -> Duration {
        match self.history.len() {
            0 => Duration::ZERO,
            n => self.in_window / n as u32,
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_sixty() {
        let mut stats = FrameStats::default();
        for _ in 0..180 {
            stats.record(Duration::from_micros(16_667));
        }
        assert!((stats.fps() - 60.0).abs() < 0.5, "fps {}", stats.fps());
        assert_eq!(stats.total_frames(), 180);
    }

    #[test]
    fn test_window_forgets_old_frames() {
        let mut stats = FrameStats::default();
        for _ in 0..10 {
            stats.record(Duration::from_millis(100));
        }
        for _ in 0..2 {
            stats.record(Duration::from_millis(500));
        }
        assert!((stats.fps() - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_stats() {
        let stats = FrameStats::default();
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.mean_frame_time(), Duration::ZERO);
    }
}
