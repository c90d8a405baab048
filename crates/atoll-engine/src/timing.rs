//! Frame timing.
//!
//! The simulation runs at a fixed tick rate independent of the frame rate:
//! elapsed wall time accumulates and is spent in whole ticks.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Maximum ticks run in one frame; the rest of a long stall is dropped.
const MAX_TICKS_PER_FRAME: u32 = 10;

/// Fixed-timestep accumulator.
#[derive(Debug)]
pub struct FixedTimestep {
    tick: Duration,
    last: Instant,
    accumulator: Duration,
}

impl FixedTimestep {
    /// Creates a timestep running `rate` ticks per second.
    #[must_use]
    pub fn new(rate: u32) -> Self {
        Self {
            tick: Duration::from_secs_f64(1.0 / f64::from(rate.max(1))),
            last: Instant::now(),
            accumulator: Duration::ZERO,
        }
    }

    /// Duration of one tick.
    #[must_use]
    pub const fn tick(&self) -> Duration {
        self.tick
    }

    /// Accounts the time up to `now` and returns how many ticks to run.
    pub fn advance(&mut self, now: Instant) -> u32 {
        self.accumulator += now.saturating_duration_since(self.last);
        self.last = now;

        let mut ticks = 0;
        while self.accumulator >= self.tick && ticks < MAX_TICKS_PER_FRAME {
            self.accumulator -= self.tick;
            ticks += 1;
        }
        // Still behind after the cap: skip ahead instead of spiralling.
        if self.accumulator >= self.tick {
            self.accumulator = Duration::ZERO;
        }
        ticks
    }

    /// Restarts timing from `now`, dropping accumulated time.
    pub fn reset(&mut self, now: Instant) {
        self.last = now;
        self.accumulator = Duration::ZERO;
    }
}

/// Averages frame times over a sliding window.
#[derive(Debug)]
pub struct FpsCounter {
    frame_times: VecDeque<Duration>,
    max_samples: usize,
    last: Instant,
}

impl FpsCounter {
    /// Creates a counter averaging over `max_samples` frames.
    #[must_use]
    pub fn new(max_samples: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            last: Instant::now(),
        }
    }

    /// Records a frame ending at `now`.
    pub fn frame(&mut self, now: Instant) {
        self.frame_times.push_back(now.saturating_duration_since(self.last));
        self.last = now;
        if self.frame_times.len() > self.max_samples {
            self.frame_times.pop_front();
        }
    }

    /// Average frames per second.
    #[must_use]
    pub fn fps(&self) -> f32 {
        let total: Duration = self.frame_times.iter().sum();
        if total.is_zero() {
            return 0.0;
        }
        self.frame_times.len() as f32 / total.as_secs_f32()
    }
}
