use std::time::{Duration, Instant};

/// Measures the time between successive frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self { last: now }
    }

    /// Time since the previous tick (or since construction).
    pub fn tick(&mut self, now: Instant) -> Duration {
        let delta = now.saturating_duration_since(self.last);
        self.last = now;
        delta
    }
}

/// Counts frames over one-second windows.
#[derive(Debug, Clone, Copy)]
pub struct FpsCounter {
    window_start: Instant,
    frames_in_window: u32,
    fps: u32,
    frames_since_report: u32,
}

impl FpsCounter {
    /// Frames between two frame-rate log lines.
    pub const REPORT_INTERVAL: u32 = 60;

    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames_in_window: 0,
            fps: 0,
            frames_since_report: 0,
        }
    }

    /// Record one frame. Returns the frame rate every
    /// [`REPORT_INTERVAL`](Self::REPORT_INTERVAL) frames.
    pub fn frame(&mut self, now: Instant) -> Option<u32> {
        let second = Duration::from_secs(1);
        if now.saturating_duration_since(self.window_start) > second {
            self.fps = self.frames_in_window;
            self.frames_in_window = 0;
            self.window_start += second;
        }
        self.frames_in_window += 1;

        self.frames_since_report += 1;
        if self.frames_since_report == Self::REPORT_INTERVAL {
            self.frames_since_report = 0;
            Some(self.fps)
        } else {
            None
        }
    }

    /// Frames counted in the last complete one-second window.
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_reports_elapsed_time() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        let first = clock.tick(start + Duration::from_millis(16));
        assert_eq!(first, Duration::from_millis(16));
        let second = clock.tick(start + Duration::from_millis(40));
        assert_eq!(second, Duration::from_millis(24));
    }

    #[test]
    fn clock_never_goes_backwards() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start + Duration::from_millis(5));
        assert_eq!(clock.tick(start), Duration::ZERO);
    }

    #[test]
    fn fps_counts_frames_in_the_previous_second() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(start);
        for i in 0..30 {
            counter.frame(start + Duration::from_millis(i * 30));
        }
        assert_eq!(counter.fps(), 0);
        counter.frame(start + Duration::from_millis(1001));
        // frames at 0, 30, ..., 870 ms fell in the first window
        assert_eq!(counter.fps(), 30);
    }

    #[test]
    fn fps_is_reported_every_sixty_frames() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(start);
        let reports: Vec<_> = (0..180)
            .filter_map(|i| counter.frame(start + Duration::from_millis(i)))
            .collect();
        assert_eq!(reports.len(), 3);
    }
}
