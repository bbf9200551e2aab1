use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Longest frame delta handed to animation code. A stall (suspended
/// terminal, debugger) would otherwise teleport every fish at once.
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

/// Produces the per-frame delta, in seconds, for the view drivers.
pub struct FrameClock {
    last: Option<Instant>,
    max_delta: Duration,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(MAX_FRAME_DELTA)
    }
}

impl FrameClock {
    pub fn new(max_delta: Duration) -> Self {
        Self {
            last: None,
            max_delta,
        }
    }

    /// Seconds since the previous tick, clamped to the maximum delta.
    /// The first tick returns `0.0`.
    pub fn tick(&mut self, now: Instant) -> f64 {
        let delta = match self.last {
            Some(last) => now.saturating_duration_since(last).min(self.max_delta),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        delta.as_secs_f64()
    }
}

/// Frames-per-second over a sliding time window.
///
/// Call [`record`](FpsCounter::record) once per frame and read
/// [`fps`](FpsCounter::fps) for display. Timestamps that fall out of the
/// window are pruned as new frames arrive.
pub struct FpsCounter {
    frames: VecDeque<Instant>,
    window: Duration,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl FpsCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            frames: VecDeque::new(),
            window,
        }
    }

    pub fn record(&mut self, now: Instant) {
        self.frames.push_back(now);
        let Some(cutoff) = now.checked_sub(self.window) else {
            return;
        };
        while self.frames.front().is_some_and(|&t| t < cutoff) {
            self.frames.pop_front();
        }
    }

    /// `0.0` until at least two frames are recorded.
    pub fn fps(&self) -> f64 {
        if self.frames.len() < 2 {
            return 0.0;
        }
        let Some(&latest) = self.frames.back() else {
            return 0.0;
        };
        let in_window = match latest.checked_sub(self.window) {
            Some(start) => self.frames.iter().filter(|&&t| t >= start).count(),
            None => self.frames.len(),
        };
        in_window as f64 / self.window.as_secs_f64()
    }
}
