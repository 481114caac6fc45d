use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots and pacing the loop.
///
/// The delta is the raw wall-clock interval between two ticks. There is no
/// smoothing and no catch-up: a long stall yields one long delta.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    min_frame: Option<Duration>,
}

impl FrameClock {
    /// Creates a clock without frame-rate cap.
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            frame_index: 0,
            min_frame: None,
        }
    }

    /// Creates a clock that paces the loop to at most `fps` frames per second.
    ///
    /// `fps == 0` disables the cap.
    pub fn with_target_fps(fps: u32) -> Self {
        let min_frame = (fps > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(fps)));
        Self {
            min_frame,
            ..Self::new()
        }
    }

    /// Minimum frame interval enforced by `delay()`, if any.
    pub fn min_frame_interval(&self) -> Option<Duration> {
        self.min_frame
    }

    /// Resets the clock baseline.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }

    /// Time left in the current frame before `delay()` may return.
    pub fn remaining(&self) -> Duration {
        match self.min_frame {
            Some(min) => min.saturating_sub(self.last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Sleeps until the minimum frame interval has elapsed since the last tick.
    ///
    /// `thread::sleep` may wake early on some platforms, so the remaining time
    /// is re-checked until it reaches zero.
    pub fn delay(&self) {
        loop {
            let remaining = self.remaining();
            if remaining.is_zero() {
                return;
            }
            std::thread::sleep(remaining);
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
